use crate::{ColfsError, ColfsResult};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// One immutable chunk of file data. The payload lives in its own row under
/// [`crate::block_key`]; the inode's block list is the only record of
/// membership. A changed block gets a fresh id, never an in-place update.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    pub id: Uuid,
    /// Byte offset of this block within the file.
    pub offset: u64,
    pub length: u64,
}

impl Block {
    pub fn new(offset: u64, length: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            offset,
            length,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InodeKind {
    File,
    Directory,
}

/// A path's metadata record. Serialized as an opaque payload into the data
/// column of the inode row; the payload is the single source of truth for
/// block membership.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Inode {
    pub user: String,
    pub group: String,
    /// POSIX permission bits, carried opaquely and never enforced here.
    pub permissions: u16,
    pub kind: InodeKind,
    pub replication: u32,
    pub mtime: u64,
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// Write timestamp reported by the store, attached on retrieval. Not part
    /// of the serialized payload.
    #[serde(skip)]
    pub timestamp: i64,
}

impl Inode {
    pub fn new_file(user: &str, group: &str, permissions: u16, replication: u32) -> Self {
        Self {
            user: user.to_string(),
            group: group.to_string(),
            permissions,
            kind: InodeKind::File,
            replication,
            mtime: unix_millis(),
            blocks: Vec::new(),
            timestamp: 0,
        }
    }

    pub fn new_directory(user: &str, group: &str, permissions: u16) -> Self {
        Self {
            user: user.to_string(),
            group: group.to_string(),
            permissions,
            kind: InodeKind::Directory,
            replication: 0,
            mtime: unix_millis(),
            blocks: Vec::new(),
            timestamp: 0,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == InodeKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == InodeKind::Directory
    }

    /// Total file size implied by the block list.
    pub fn size(&self) -> u64 {
        self.blocks.iter().map(|b| b.length).sum()
    }

    pub fn serialize(&self) -> ColfsResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            warn!("Inode: serialize failed! {}", e);
            ColfsError::InvalidData(format!("inode serialize failed: {}", e))
        })
    }

    pub fn deserialize(data: &[u8], timestamp: i64) -> ColfsResult<Self> {
        let mut inode: Inode = serde_json::from_slice(data).map_err(|e| {
            warn!("Inode: deserialize failed! {}", e);
            ColfsError::InvalidData(format!("inode deserialize failed: {}", e))
        })?;
        inode.timestamp = timestamp;
        Ok(inode)
    }
}
