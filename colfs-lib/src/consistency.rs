use crate::{ColfsConfig, ColfsError, ColfsResult, KeyspaceDef};

/// Consistency levels understood by the underlying store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyLevel {
    Any,
    One,
    Quorum,
    LocalQuorum,
    EachQuorum,
    All,
}

impl ConsistencyLevel {
    pub fn from_name(name: &str) -> ColfsResult<Self> {
        match name {
            "ANY" => Ok(ConsistencyLevel::Any),
            "ONE" => Ok(ConsistencyLevel::One),
            "QUORUM" => Ok(ConsistencyLevel::Quorum),
            "LOCAL_QUORUM" => Ok(ConsistencyLevel::LocalQuorum),
            "EACH_QUORUM" => Ok(ConsistencyLevel::EachQuorum),
            "ALL" => Ok(ConsistencyLevel::All),
            _ => Err(ColfsError::InvalidParam(format!(
                "unknown consistency level: {}",
                name
            ))),
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            ConsistencyLevel::Any => "ANY",
            ConsistencyLevel::One => "ONE",
            ConsistencyLevel::Quorum => "QUORUM",
            ConsistencyLevel::LocalQuorum => "LOCAL_QUORUM",
            ConsistencyLevel::EachQuorum => "EACH_QUORUM",
            ConsistencyLevel::All => "ALL",
        }
    }
}

/// Read/write consistency levels resolved once at bootstrap and shared
/// read-only by every store operation afterwards.
#[derive(Debug, Clone, Copy)]
pub struct ConsistencyPolicy {
    pub read: ConsistencyLevel,
    pub write: ConsistencyLevel,
}

impl ConsistencyPolicy {
    /// Resolve the configured level names against the keyspace's replication
    /// strategy. QUORUM is promoted to LOCAL_QUORUM when the keyspace is
    /// replicated with a network-topology-aware strategy, so reads and writes
    /// stay within the local datacenter.
    pub fn from_keyspace(config: &ColfsConfig, ks: &KeyspaceDef) -> ColfsResult<Self> {
        let mut read = ConsistencyLevel::from_name(&config.read_consistency)?;
        let mut write = ConsistencyLevel::from_name(&config.write_consistency)?;

        if ks.strategy_class.contains("NetworkTopologyStrategy") {
            if read == ConsistencyLevel::Quorum {
                read = ConsistencyLevel::LocalQuorum;
            }
            if write == ConsistencyLevel::Quorum {
                write = ConsistencyLevel::LocalQuorum;
            }
        }

        Ok(ConsistencyPolicy { read, write })
    }
}
