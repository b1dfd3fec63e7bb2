//! counting.rs
//! Per-frame vehicle counting over detector output.

use crate::types::{ClassMap, Detection, VehicleTypes};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameCount {
    pub total: u32,
    pub types: VehicleTypes,
    /// `"{class} #{track_id}"`, one per counted detection
    pub labels: Vec<String>,
}

/// Detections whose class id is not one of ours are ignored.
pub fn count_vehicles(detections: &[Detection], classes: &ClassMap) -> FrameCount {
    let mut out = FrameCount::default();
    for d in detections {
        let Some(class) = classes.class_of(d.class_id) else { continue };
        out.total += 1;
        out.types.bump(class);
        let track = d.track_id.map(|t| t.to_string()).unwrap_or_else(|| "None".into());
        out.labels.push(format!("{} #{}", class.name(), track));
    }
    out
}
