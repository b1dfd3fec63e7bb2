//! store.rs
//! Road history persisted as a single JSON document.
//!
//! The document is loaded once at startup and rewritten in full after
//! every accepted report. Writes go through one lock and replace the file
//! via `<file>.tmp` + rename, so a reader of the file never sees a
//! half-written document and two reports never drop each other's entries.

use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::types::{RoadHistory, RoadInfo, RoadRecord, TrafficReport};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub struct RoadStore {
    path: PathBuf,
    roads: RwLock<RoadInfo>,
}

impl RoadStore {
    /// Loads `path` if it exists, otherwise starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let roads = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<RoadInfo>(&bytes)
                .map_err(|source| StoreError::Json { path: path.clone(), source })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RoadInfo::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        info!("Loaded {} road(s) from {}", roads.len(), path.display());
        Ok(Self { path, roads: RwLock::new(roads) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inserts (or overwrites) the reading for `road_id` at the report's
    /// timestamp and persists the whole document.
    ///
    /// In-memory state only changes once the file has been replaced.
    pub async fn record(&self, road_id: &str, report: &TrafficReport) -> Result<RoadRecord, StoreError> {
        let rec = RoadRecord::from_report(report);

        let mut roads = self.roads.write().await;
        let mut next = (*roads).clone();
        next.entry(road_id.to_string())
            .or_default()
            .insert(report.timestamp.clone(), rec.clone());

        write_atomic(&self.path, &next).await?;
        *roads = next;
        debug!("Stored {road_id}@{}", report.timestamp);
        Ok(rec)
    }

    /// Exact, case-sensitive lookup.
    pub async fn road(&self, road_id: &str) -> Option<RoadHistory> {
        self.roads.read().await.get(road_id).cloned()
    }

    pub async fn snapshot(&self) -> RoadInfo {
        self.roads.read().await.clone()
    }
}

async fn write_atomic(path: &Path, roads: &RoadInfo) -> Result<(), StoreError> {
    let body = serde_json::to_vec_pretty(roads)
        .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &body)
        .await
        .map_err(|source| StoreError::Io { path: tmp.clone(), source })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| StoreError::Io { path: path.to_path_buf(), source })
}
