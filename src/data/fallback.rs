//! Local snapshots served when history endpoints stay unavailable
//!
//! Snapshot files hold the same JSON the endpoint returns. They are only
//! consulted after the fetcher has exhausted its retries, and only when a
//! fallback directory has been configured.

use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tracing::debug;

use crate::fetch::FetchResult;

/// Endpoints that have a snapshot file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snapshot {
    Ohlc,
    MarketChart,
}

impl Snapshot {
    pub fn file_name(&self) -> &'static str {
        match self {
            Snapshot::Ohlc => "backup_ohlc.json",
            Snapshot::MarketChart => "backup_market_chart.json",
        }
    }
}

/// Directory of snapshot files
#[derive(Debug, Clone)]
pub struct FallbackStore {
    dir: PathBuf,
}

impl FallbackStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Reads the snapshot for `snapshot`.
    ///
    /// A missing or malformed file yields `None`.
    pub fn load(&self, snapshot: Snapshot) -> FetchResult {
        let path = self.dir.join(snapshot.file_name());
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "no fallback snapshot");
                return None;
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(payload) => Some(payload),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "malformed fallback snapshot");
                None
            }
        }
    }
}
