//! alerts.rs
//! Text rendered for outbound SMS: the personnel alert, the road lookup
//! reply and the help message.

use crate::models::types::{RoadHistory, TrafficReport};

pub fn alert_message(road_id: &str, r: &TrafficReport) -> String {
    let t = &r.vehicle_types;
    format!(
        "Traffic Alert - {} Road\n\
         Total Vehicles: {}\n\
         Vehicle Breakdown:\n\
         Cars: {}\n\
         Trucks: {}\n\
         Buses: {}\n\
         Motorbikes: {}\n\
         Timestamp: {}",
        road_id.to_uppercase(),
        r.vehicle_count,
        t.car,
        t.truck,
        t.bus,
        t.motorbike,
        r.timestamp
    )
}

/// Inbound SMS text -> road key candidate.
pub fn normalize_query(text: &str) -> String {
    text.trim().to_uppercase()
}

pub fn road_reply(name: &str, history: &RoadHistory) -> String {
    let mut out = format!("Road Info for {name}:\n");
    for (ts, info) in history {
        out.push_str(&format!(
            "\n{ts}:\nCongestion: {}\nNumber of Cars: {}\nNumber of Trucks: {}\nTime: {}\n",
            info.congestion, info.number_of_cars, info.number_of_trucks, info.time
        ));
    }
    out
}

pub fn help_message<S: AsRef<str>>(roads: &[S]) -> String {
    let example = roads.first().map(AsRef::as_ref).unwrap_or("MOROGORO ROAD");
    let mut out = format!(
        "Welcome to the Traffic Alert System! To get information about traffic on a specific road, \
         send the name of the road. For example, send '{example}' to receive traffic updates. \
         Here are some available roads you can inquire about:\n\n"
    );
    for r in roads {
        out.push_str(&format!("- {}\n", r.as_ref()));
    }
    out.push_str("\nFor any questions or support, send 'HI' for instructions.");
    out
}
