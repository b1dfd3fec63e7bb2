//! report.rs — posts vehicle counts to the alert service.

use chrono::Local;
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

use crate::types::{Ack, TrafficPayload, VehicleTypes};

pub struct ReportClient {
    http: Client,
    api_url: String,
    road_id: String,
    other_roads: BTreeMap<String, u32>,
}

impl ReportClient {
    pub fn new(api_url: &str, road_id: &str, other_roads: BTreeMap<String, u32>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            road_id: road_id.to_string(),
            other_roads,
        })
    }

    pub fn payload(&self, vehicle_count: u32, vehicle_types: &VehicleTypes) -> TrafficPayload {
        TrafficPayload {
            road_id: self.road_id.clone(),
            vehicle_count,
            timestamp: Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            vehicle_types: vehicle_types.clone(),
            other_roads: self.other_roads.clone(),
        }
    }

    /// Awaited inline by the monitor loop. Failures are logged and dropped.
    pub async fn submit(&self, vehicle_count: u32, vehicle_types: &VehicleTypes) -> Option<Ack> {
        let payload = self.payload(vehicle_count, vehicle_types);
        let url = format!("{}/traffic-data/{}", self.api_url, self.road_id);

        let resp = match self.http.post(&url).json(&payload).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Error sending data to API: {e}");
                return None;
            }
        };
        info!("Data sent: {} vehicles on {} at {}", payload.vehicle_count, payload.road_id, payload.timestamp);

        match resp.json::<Ack>().await {
            Ok(ack) => {
                if ack.status != "success" {
                    warn!("API answered {}: {}", ack.status, ack.message);
                }
                Some(ack)
            }
            Err(e) => {
                warn!("Unreadable API answer: {e}");
                None
            }
        }
    }
}
