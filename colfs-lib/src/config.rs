use crate::{ColfsError, ColfsResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    9160
}

fn default_consistency() -> String {
    "QUORUM".to_string()
}

fn default_replication() -> u32 {
    1
}

fn default_scan_row_cap() -> u32 {
    100_000
}

fn default_bootstrap_stagger_ms() -> u64 {
    5000
}

fn default_framed_transport() -> bool {
    true
}

/// Connection and tuning parameters for the filesystem store.
///
/// The consistency names are resolved against the store's replication
/// strategy at bootstrap time, see [`crate::ConsistencyPolicy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColfsConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whether the store connection uses framed transport. Consumed by the
    /// store client, carried here with the rest of the connection params.
    #[serde(default = "default_framed_transport")]
    pub framed_transport: bool,
    #[serde(default = "default_consistency")]
    pub read_consistency: String,
    #[serde(default = "default_consistency")]
    pub write_consistency: String,
    /// Replication factor hint used only when this process creates the keyspace.
    #[serde(default = "default_replication")]
    pub replication: u32,
    /// Row cap for a single directory index scan.
    #[serde(default = "default_scan_row_cap")]
    pub scan_row_cap: u32,
    /// Upper bound of the randomized sleep that desynchronizes concurrent
    /// keyspace creators.
    #[serde(default = "default_bootstrap_stagger_ms")]
    pub bootstrap_stagger_ms: u64,
}

impl Default for ColfsConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            framed_transport: default_framed_transport(),
            read_consistency: default_consistency(),
            write_consistency: default_consistency(),
            replication: default_replication(),
            scan_row_cap: default_scan_row_cap(),
            bootstrap_stagger_ms: default_bootstrap_stagger_ms(),
        }
    }
}

impl ColfsConfig {
    pub async fn load_from_file(config_path: &Path) -> ColfsResult<Self> {
        let config_str = fs::read_to_string(config_path).await.map_err(|e| {
            warn!("ColfsConfig: read config failed! {}", e);
            ColfsError::NotFound(format!("config not found: {}", config_path.display()))
        })?;
        serde_json::from_str::<ColfsConfig>(&config_str).map_err(|e| {
            warn!("ColfsConfig: parse config failed! {}", e);
            ColfsError::InvalidData(format!("config invalid: {}", e))
        })
    }
}
