//! main.rs — traffic alert service: vision reports in, SMS alerts out,
//! road history on disk, SMS queries answered from it.

mod alerts;
mod models;
mod server;
mod sms;
mod store;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use models::types::AppCfg;
use store::RoadStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Fixed defaults, overridable from the environment
    let cfg = AppCfg::from_env();

    let store = RoadStore::open(&cfg.data_file)
        .await
        .with_context(|| format!("loading {}", cfg.data_file))?;
    let sms = sms::from_cfg(&cfg).context("building SMS gateway")?;

    info!(
        "Alerting {} number(s); history in {}",
        cfg.personnel_numbers.len(),
        store.path().display()
    );

    let app = server::api::router(server::api::ApiState {
        store: Arc::new(store),
        sms: Arc::from(sms),
        personnel: Arc::new(cfg.personnel_numbers.clone()),
        help_roads: Arc::new(cfg.help_roads.clone()),
    });

    info!("Listening on http://{}", cfg.bind);
    let listener = tokio::net::TcpListener::bind(&cfg.bind)
        .await
        .with_context(|| format!("binding {}", cfg.bind))?;
    let serve = axum::serve(listener, app);
    tokio::select! {
        r = serve => { r?; },
        _ = signal::ctrl_c() => { info!("Shutdown signal received"); }
    }

    Ok(())
}
