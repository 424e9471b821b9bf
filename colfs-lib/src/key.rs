use crate::{ColfsError, ColfsResult};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Row key for a path: SHA-256 of the absolute path string rendered as
/// fixed-width lowercase hex. Two distinct paths colliding is a residual
/// risk of the hash choice and is not detected.
pub fn path_key(path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    hex::encode(hasher.finalize())
}

/// Row key for a block: the UUID bytes hex-encoded. Reversible, since block
/// ids are already globally unique.
pub fn block_key(block_id: &Uuid) -> String {
    hex::encode(block_id.as_bytes())
}

pub fn block_id_from_key(key: &str) -> ColfsResult<Uuid> {
    let bytes = hex::decode(key)
        .map_err(|e| ColfsError::InvalidParam(format!("bad block key {}: {}", key, e)))?;
    Uuid::from_slice(&bytes)
        .map_err(|e| ColfsError::InvalidParam(format!("bad block key {}: {}", key, e)))
}
