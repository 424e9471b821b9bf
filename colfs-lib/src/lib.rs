mod block_read;
mod client;
mod config;
mod consistency;
mod fs_path;
mod fs_store;
mod inode;
mod key;
mod schema;

pub use block_read::*;
pub use client::*;
pub use config::*;
pub use consistency::*;
pub use fs_path::*;
pub use fs_store::*;
pub use inode::*;
pub use key::*;
pub use schema::*;

use thiserror::Error;

#[macro_use]
extern crate log;

#[cfg(test)]
mod mem_store;

#[derive(Error, Debug)]
pub enum ColfsError {
    #[error("internal error: {0}")]
    Internal(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("store error: {0}")]
    StoreError(String),
    #[error("schema error: {0}")]
    SchemaError(String),
    #[error("local block error: {0}")]
    LocalBlockError(String),
    #[error("invalid param: {0}")]
    InvalidParam(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl ColfsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ColfsError::NotFound(_))
    }
}

pub type ColfsResult<T> = std::result::Result<T, ColfsError>;

impl From<std::io::Error> for ColfsError {
    fn from(err: std::io::Error) -> Self {
        ColfsError::IoError(err.to_string())
    }
}

/// Keyspace holding both column families.
pub const FS_KEYSPACE: &str = "colfs";
/// Column family for serialized inode records and their path-index columns.
pub const INODE_CF: &str = "inode";
/// Column family for raw block payloads.
pub const BLOCK_CF: &str = "blocks";

pub const DATA_COLUMN: &str = "data";
pub const PATH_COLUMN: &str = "path";
pub const SENTINEL_COLUMN: &str = "sentinel";

/// Constant marker written next to every inode so the secondary index on the
/// sentinel column enumerates exactly the live inode rows.
pub const SENTINEL_VALUE: &[u8] = b"x";
