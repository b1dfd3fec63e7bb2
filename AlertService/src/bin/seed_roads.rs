//! Writes a sample history file keyed by the road names the SMS help text
//! advertises, so inbound queries have something to answer with.
//!
//! Usage: seed_roads [path]   (default: traffic_data.json)

use chrono::{Duration, Local, SecondsFormat};
use serde_json::{json, Map, Value};
use std::fs;

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "traffic_data.json".into());

    // (road, cars, trucks) per sample, three samples 10 min apart
    let roads = [
        ("MOROGORO ROAD", [42, 55, 61], [6, 8, 5]),
        ("NYERERE ROAD", [30, 28, 35], [9, 7, 11]),
        ("UBUNGO INTERCHANGE", [75, 90, 82], [14, 12, 16]),
        ("BAGAMOYO ROAD", [22, 25, 19], [3, 2, 4]),
        ("MSASANI HIGHWAY", [12, 15, 10], [1, 0, 2]),
    ];

    let start = Local::now() - Duration::minutes(30);
    let mut doc = Map::new();
    for (road, cars, trucks) in roads {
        let mut hist = Map::new();
        for i in 0..3 {
            let ts = (start + Duration::minutes(10 * i as i64))
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string();
            hist.insert(ts.clone(), json!({
                "congestion": "Unknown",
                "number_of_cars": cars[i],
                "number_of_trucks": trucks[i],
                "time": ts,
            }));
        }
        doc.insert(road.to_string(), Value::Object(hist));
    }

    fs::write(&path, serde_json::to_vec_pretty(&Value::Object(doc))?)?;
    println!(
        "OK -> {path} ({} roads, generated {})",
        roads.len(),
        Local::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    Ok(())
}
