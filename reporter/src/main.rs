//! main.rs — vision reporter: counts vehicles for one road and reports to
//! the alert service when the road is busier than the others.

mod counting;
mod decision;
mod monitor;
mod report;
mod source;
mod types;

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use decision::ThresholdPolicy;
use monitor::Monitor;
use report::ReportClient;
use source::{ReplayDetector, ReplaySource};
use types::ReporterCfg;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ReporterCfg::from_env().context("reporter configuration")?;
    info!("Replaying {} every {} frame(s) -> {}", cfg.replay_path, cfg.skip_frames, cfg.api_url);

    let client = ReportClient::new(&cfg.api_url, &cfg.road_id, cfg.other_roads.clone())
        .context("building HTTP client")?;
    let mut monitor = Monitor::new(
        &cfg.road_id,
        cfg.skip_frames,
        cfg.classes.clone(),
        ThresholdPolicy::new(cfg.other_roads.clone()),
        ReplaySource::open(&cfg.replay_path),
        ReplayDetector::new(cfg.classes.clone(), cfg.min_conf),
        client,
    )
    .with_frame_interval(Duration::from_millis(cfg.frame_ms));

    tokio::select! {
        _ = monitor.run(cfg.max_frames) => {},
        _ = signal::ctrl_c() => { info!("Shutdown signal received"); }
    }

    Ok(())
}
