//! types.rs
//! Models shared by the reporter: detector output, per-class counts,
//! the report payload and configuration.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One object returned by the detector for a frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: u32,
    /// x1, y1, x2, y2
    #[serde(default)]
    pub bbox: [i32; 4],
    /// Persistent id assigned by the tracker, when it has one.
    #[serde(default)]
    pub track_id: Option<u32>,
    #[serde(default = "full_confidence")]
    pub conf: f32,
}

fn full_confidence() -> f32 { 1.0 }

/// One line of a replay file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub detections: Vec<Detection>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VehicleClass { Car, Truck, Bus, Motorbike }

impl VehicleClass {
    pub fn name(self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Truck => "truck",
            Self::Bus => "bus",
            Self::Motorbike => "motorbike",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleTypes {
    pub car: u32,
    pub truck: u32,
    pub bus: u32,
    pub motorbike: u32,
}

impl VehicleTypes {
    pub fn bump(&mut self, class: VehicleClass) {
        match class {
            VehicleClass::Car => self.car += 1,
            VehicleClass::Truck => self.truck += 1,
            VehicleClass::Bus => self.bus += 1,
            VehicleClass::Motorbike => self.motorbike += 1,
        }
    }
}

/// Detector class ids (COCO) for each vehicle class we count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassMap(pub Vec<(VehicleClass, u32)>);

impl Default for ClassMap {
    fn default() -> Self {
        Self(vec![
            (VehicleClass::Car, 2),
            (VehicleClass::Truck, 7),
            (VehicleClass::Bus, 5),
            (VehicleClass::Motorbike, 3),
        ])
    }
}

impl ClassMap {
    pub fn class_of(&self, id: u32) -> Option<VehicleClass> {
        self.0.iter().find(|(_, cid)| *cid == id).map(|(c, _)| *c)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.class_of(id).is_some()
    }
}

/// Body posted to `/traffic-data/{road_id}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrafficPayload {
    pub road_id: String,
    pub vehicle_count: u32,
    pub timestamp: String,
    pub vehicle_types: VehicleTypes,
    pub other_roads: BTreeMap<String, u32>,
}

/// Service answer, `{"status", "message"}`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Ack {
    pub status: String,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct ReporterCfg {
    /// Base URL of the alert service
    pub api_url: String,

    /// Road this camera watches
    pub road_id: String,

    /// JSON-lines file of recorded detections, one frame per line
    pub replay_path: String,

    /// Run the detector on one frame out of N
    pub skip_frames: u64,

    /// Fixed counts the current road is compared against
    pub other_roads: BTreeMap<String, u32>,

    /// Detections below this confidence are dropped
    pub min_conf: f32,

    /// Stop after this many frames (runs forever when unset)
    pub max_frames: Option<u64>,

    /// Pause between frames, roughly the camera frame rate
    pub frame_ms: u64,

    pub classes: ClassMap,
}

impl Default for ReporterCfg {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".into(),
            road_id: "Ubungo".into(),
            replay_path: "data/detections.jsonl".into(),
            skip_frames: 10,
            other_roads: BTreeMap::from([
                ("north".to_string(), 5),
                ("south".to_string(), 10),
                ("west".to_string(), 7),
            ]),
            min_conf: 0.5,
            max_frames: None,
            frame_ms: 33,
            classes: ClassMap::default(),
        }
    }
}

impl ReporterCfg {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub(crate) fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut c = Self::default();
        if let Some(v) = get("API_URL") { c.api_url = v.trim_end_matches('/').to_string(); }
        if let Some(v) = get("ROAD_ID") { c.road_id = v; }
        if let Some(v) = get("REPLAY_PATH") { c.replay_path = v; }
        if let Some(v) = get("SKIP_FRAMES") {
            c.skip_frames = v.parse().with_context(|| format!("SKIP_FRAMES={v}"))?;
            if c.skip_frames == 0 { bail!("SKIP_FRAMES must be at least 1"); }
        }
        if let Some(v) = get("OTHER_ROADS") { c.other_roads = parse_other_roads(&v)?; }
        if let Some(v) = get("MIN_CONF") { c.min_conf = v.parse().with_context(|| format!("MIN_CONF={v}"))?; }
        if let Some(v) = get("MAX_FRAMES") { c.max_frames = Some(v.parse().with_context(|| format!("MAX_FRAMES={v}"))?); }
        if let Some(v) = get("FRAME_MS") { c.frame_ms = v.parse().with_context(|| format!("FRAME_MS={v}"))?; }
        Ok(c)
    }
}

/// `north=5,south=10,west=7`
fn parse_other_roads(raw: &str) -> Result<BTreeMap<String, u32>> {
    let mut out = BTreeMap::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((name, count)) = part.split_once('=') else {
            bail!("OTHER_ROADS entry '{part}' is not name=count");
        };
        let count = count.trim().parse().with_context(|| format!("OTHER_ROADS count in '{part}'"))?;
        out.insert(name.trim().to_string(), count);
    }
    Ok(out)
}
