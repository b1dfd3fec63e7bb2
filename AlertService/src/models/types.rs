//! types.rs
//! Shared models for the service: inbound reports, the persisted road
//! document and the process configuration.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Per-class breakdown sent by the reporter. All four classes are required.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleTypes {
    pub car: u32,
    pub truck: u32,
    pub bus: u32,
    pub motorbike: u32,
}

/// Body of `POST /traffic-data/{road_id}`.
///
/// The reporter also sends `road_id` and `other_roads`; they are accepted
/// and ignored, the path parameter is authoritative.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrafficReport {
    pub vehicle_count: u32,
    pub timestamp: String,
    pub vehicle_types: VehicleTypes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_roads: Option<HashMap<String, u32>>,
}

/// One stored reading for a road.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadRecord {
    pub congestion: String,
    pub number_of_cars: u32,
    pub number_of_trucks: u32,
    pub time: String,
}

impl RoadRecord {
    pub const UNKNOWN_CONGESTION: &'static str = "Unknown";

    pub fn from_report(report: &TrafficReport) -> Self {
        Self {
            congestion: Self::UNKNOWN_CONGESTION.to_string(),
            number_of_cars: report.vehicle_types.car,
            number_of_trucks: report.vehicle_types.truck,
            time: report.timestamp.clone(),
        }
    }
}

/// timestamp -> reading
pub type RoadHistory = BTreeMap<String, RoadRecord>;

/// road id -> history. This is the whole persisted document.
pub type RoadInfo = BTreeMap<String, RoadHistory>;

/// Form body of `POST /sms/callback`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SmsCallback {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub from: String,
}

/// Uniform response body for both endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub status: String,
    pub message: String,
}

impl Ack {
    pub fn success(message: impl Into<String>) -> Self {
        Self { status: "success".into(), message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { status: "error".into(), message: message.into() }
    }
}

pub const DEFAULT_HELP_ROADS: [&str; 10] = [
    "MOROGORO ROAD",
    "NYERERE ROAD",
    "UBUNGO INTERCHANGE",
    "BAGAMOYO ROAD",
    "MSASANI HIGHWAY",
    "MBEZI ROAD",
    "PWANI ROAD",
    "MASAKI ROAD",
    "MIKOCHENI ROAD",
    "PALM VILLAGE ROAD",
];

#[derive(Clone, Debug)]
pub struct AppCfg {
    /// HTTP bind address (Axum)
    pub bind: String,

    /// JSON document holding every road's history
    pub data_file: String,

    /// Africa's Talking account. `sandbox` routes to the sandbox API.
    pub at_username: String,

    /// Africa's Talking API key. Without it SMS are only logged.
    pub at_api_key: Option<String>,

    /// Optional sender id / short code
    pub at_sender_id: Option<String>,

    /// Overrides the Africa's Talking API host (proxies, local fakes)
    pub at_base_url: Option<String>,

    /// Numbers alerted on every report
    pub personnel_numbers: Vec<String>,

    /// Roads advertised in the help reply
    pub help_roads: Vec<String>,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".into(),
            data_file: "traffic_data.json".into(),
            at_username: "sandbox".into(),
            at_api_key: None,
            at_sender_id: None,
            at_base_url: None,
            personnel_numbers: vec!["+255741827924".into()],
            help_roads: DEFAULT_HELP_ROADS.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl AppCfg {
    /// Overrides the defaults with whatever is set in the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub(crate) fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut c = Self::default();
        if let Some(v) = get("BIND") { c.bind = v; }
        if let Some(v) = get("TRAFFIC_DATA_FILE") { c.data_file = v; }
        if let Some(v) = get("AT_USERNAME") { c.at_username = v; }
        if let Some(v) = get("AT_API_KEY").filter(|v| !v.trim().is_empty()) { c.at_api_key = Some(v); }
        if let Some(v) = get("AT_SENDER_ID").filter(|v| !v.trim().is_empty()) { c.at_sender_id = Some(v); }
        if let Some(v) = get("AT_BASE_URL").filter(|v| !v.trim().is_empty()) { c.at_base_url = Some(v); }
        if let Some(v) = get("TRAFFIC_PERSONNEL_NUMBERS") { c.personnel_numbers = split_list(&v); }
        if let Some(v) = get("HELP_ROADS") { c.help_roads = split_list(&v); }
        c
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
