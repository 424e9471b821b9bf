use crate::{
    block_key, open_local_block, path_key, path_depth, subtree_upper_bound, Block, BlockReader,
    ColfsConfig, ColfsError, ColfsResult, ColumnWrite, ConsistencyPolicy, IndexExpression,
    IndexOperator, Inode, LocalOrRemoteBlock, RowMutation, StoreClientRef, ensure_schema,
    DATA_COLUMN, BLOCK_CF, FS_KEYSPACE, INODE_CF, PATH_COLUMN, SENTINEL_COLUMN, SENTINEL_VALUE,
};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Replica placement of one block, for locality-aware scheduling. Endpoint
/// lists carry no topology ordering, that is left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockLocation {
    pub hosts: Vec<String>,
    pub offset: u64,
    pub length: u64,
}

/// Filesystem-store facade over the column store: inode records, block
/// payloads, the secondary-index directory listing and block placement.
///
/// Every operation is one awaited call on the caller's task; there is no
/// internal pool, no client-side timeout and no cancellation at this layer.
/// Concurrent writers to one path race last-write-wins by timestamp, callers
/// needing single-writer semantics must coordinate externally.
pub struct FileSystemStore {
    client: StoreClientRef,
    policy: ConsistencyPolicy,
    scan_row_cap: u32,
    local_host: String,
}

impl FileSystemStore {
    /// Bootstrap the schema (racing creators tolerated) and bind a store to
    /// `client`. The resolved consistency policy is immutable for the life of
    /// the store.
    pub async fn initialize(client: StoreClientRef, config: &ColfsConfig) -> ColfsResult<Self> {
        let policy = ensure_schema(&client, config).await?;
        let local_host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string());

        info!(
            "FileSystemStore: initialized, read={} write={} host={}",
            policy.read.to_str(),
            policy.write.to_str(),
            local_host
        );

        Ok(Self {
            client,
            policy,
            scan_row_cap: config.scan_row_cap,
            local_host,
        })
    }

    pub fn policy(&self) -> ConsistencyPolicy {
        self.policy
    }

    pub fn version(&self) -> &'static str {
        "colfs filesystem store"
    }

    /// Write the inode record plus its path-index columns as one atomic batch
    /// at a single timestamp. Any prior inode at the path is overwritten, no
    /// merge. Callers writing new blocks must store them before the inode
    /// that references them, so a failed inode write strands garbage blocks
    /// rather than dangling references.
    pub async fn store_inode(&self, path: &str, inode: &Inode) -> ColfsResult<()> {
        info!("FileSystemStore: writing inode to {}", path);
        if log_enabled!(log::Level::Debug) {
            for block in &inode.blocks {
                debug!("FileSystemStore: {:?}", block);
            }
        }

        let key = path_key(path);
        let data = inode.serialize()?;
        let ts = now_millis();

        let columns = vec![
            ColumnWrite {
                name: PATH_COLUMN.to_string(),
                value: path.as_bytes().to_vec(),
                timestamp: ts,
            },
            ColumnWrite {
                name: SENTINEL_COLUMN.to_string(),
                value: SENTINEL_VALUE.to_vec(),
                timestamp: ts,
            },
            ColumnWrite {
                name: DATA_COLUMN.to_string(),
                value: data,
                timestamp: ts,
            },
        ];

        self.client
            .batch_mutate(
                vec![RowMutation {
                    key,
                    column_family: INODE_CF.to_string(),
                    columns,
                }],
                self.policy.write,
            )
            .await
    }

    /// Read back the inode at `path`, attaching the store-reported write
    /// timestamp. An absent record is `None`, not an error.
    pub async fn retrieve_inode(&self, path: &str) -> ColfsResult<Option<Inode>> {
        let key = path_key(path);
        match self
            .client
            .get_column(&key, INODE_CF, DATA_COLUMN, self.policy.read)
            .await?
        {
            Some(column) => Ok(Some(Inode::deserialize(&column.value, column.timestamp)?)),
            None => Ok(None),
        }
    }

    /// Tombstone the whole inode row. Readers at weaker consistency may still
    /// observe the path until the tombstone propagates.
    pub async fn delete_inode(&self, path: &str) -> ColfsResult<()> {
        info!("FileSystemStore: deleting inode at {}", path);
        self.client
            .remove_row(&path_key(path), INODE_CF, now_millis(), self.policy.write)
            .await
    }

    /// Rename as an explicit migration: read the source, write it under the
    /// destination, and only tombstone the source once the destination write
    /// is acknowledged. The old record survives if the new write fails.
    pub async fn rename_inode(&self, src: &str, dst: &str) -> ColfsResult<()> {
        info!("FileSystemStore: renaming {} -> {}", src, dst);
        let inode = self.retrieve_inode(src).await?.ok_or_else(|| {
            ColfsError::NotFound(format!("no inode at {}", src))
        })?;
        self.store_inode(dst, &inode).await?;
        self.delete_inode(src).await
    }

    pub async fn store_block(&self, block: &Block, payload: &[u8]) -> ColfsResult<()> {
        debug!("FileSystemStore: storing {:?}", block);
        let key = block_key(&block.id);
        let column = ColumnWrite {
            name: DATA_COLUMN.to_string(),
            value: payload.to_vec(),
            timestamp: now_millis(),
        };
        self.client
            .insert_column(&key, BLOCK_CF, column, self.policy.write)
            .await
    }

    /// Read a block starting at `range_start`. Asks the store whether the
    /// block is resident on this node: a local answer becomes a zero-copy
    /// mapped read, a remote answer is streamed as-is. A store with no
    /// knowledge of the block at all is a missing-block failure.
    pub async fn retrieve_block(
        &self,
        block: &Block,
        range_start: u64,
    ) -> ColfsResult<BlockReader> {
        let key = block_key(&block.id);
        match self
            .client
            .local_or_remote_block(&self.local_host, &key, range_start)
            .await?
        {
            None => Err(ColfsError::NotFound(format!("missing block: {}", block.id))),
            Some(LocalOrRemoteBlock::Local(local)) => {
                debug!(
                    "FileSystemStore: block {} is local at {}",
                    block.id, local.file
                );
                open_local_block(&local)
            }
            Some(LocalOrRemoteBlock::Remote(reader)) => {
                debug!("FileSystemStore: block {} read remotely", block.id);
                Ok(reader)
            }
        }
    }

    pub async fn delete_block(&self, block: &Block) -> ColfsResult<()> {
        debug!("FileSystemStore: deleting block {}", block.id);
        self.client
            .remove_row(&block_key(&block.id), BLOCK_CF, now_millis(), self.policy.write)
            .await
    }

    /// All paths in the subtree rooted at `path`, recovered through the
    /// secondary indexes: sentinel equality picks out live inode rows, and
    /// the half-open range [path, path-with-last-char-incremented) bounds the
    /// scan to the subtree. A single-character path skips the upper bound and
    /// scans to the end of the index.
    pub async fn list_descendants(&self, path: &str) -> ColfsResult<HashSet<String>> {
        let mut predicates = vec![
            IndexExpression {
                column: SENTINEL_COLUMN.to_string(),
                op: IndexOperator::Eq,
                value: SENTINEL_VALUE.to_vec(),
            },
            IndexExpression {
                column: PATH_COLUMN.to_string(),
                op: IndexOperator::Gte,
                value: path.as_bytes().to_vec(),
            },
        ];
        if let Some(bound) = subtree_upper_bound(path) {
            predicates.push(IndexExpression {
                column: PATH_COLUMN.to_string(),
                op: IndexOperator::Lt,
                value: bound.into_bytes(),
            });
        }

        let rows = self
            .client
            .index_scan(
                INODE_CF,
                predicates,
                vec![PATH_COLUMN.to_string()],
                self.scan_row_cap,
                self.policy.read,
            )
            .await?;

        let mut matches = HashSet::with_capacity(rows.len());
        for row in rows {
            for (name, column) in row.columns {
                if name == PATH_COLUMN {
                    let p = String::from_utf8(column.value).map_err(|e| {
                        ColfsError::InvalidData(format!("non-utf8 path in index row: {}", e))
                    })?;
                    matches.insert(p);
                }
            }
        }
        Ok(matches)
    }

    /// Immediate children only: descendants whose depth is exactly one more
    /// than `path`'s.
    pub async fn list_children(&self, path: &str) -> ColfsResult<HashSet<String>> {
        let child_depth = path_depth(path) + 1;
        let all = self.list_descendants(path).await?;
        Ok(all
            .into_iter()
            .filter(|p| path_depth(p) == child_depth)
            .collect())
    }

    /// Replica placement for a run of blocks covering the byte window
    /// `[start, start+len)`. Empty input yields an empty result, meaning "no
    /// locality info" rather than an error. The first block's offset is
    /// clamped to `start` when its natural offset is larger, so the caller's
    /// window is represented even when it begins mid-block; all other blocks
    /// report their natural offset.
    pub async fn block_locations(
        &self,
        blocks: &[Block],
        start: u64,
        _len: u64,
    ) -> ColfsResult<Vec<BlockLocation>> {
        if blocks.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = blocks.iter().map(|b| block_key(&b.id)).collect();
        let endpoint_lists = self.client.replica_endpoints(FS_KEYSPACE, &keys).await?;
        if endpoint_lists.len() != blocks.len() {
            return Err(ColfsError::StoreError(format!(
                "expected {} endpoint lists, got {}",
                blocks.len(),
                endpoint_lists.len()
            )));
        }

        let mut locations = Vec::with_capacity(blocks.len());
        for (i, (block, hosts)) in blocks.iter().zip(endpoint_lists).enumerate() {
            let offset = if i == 0 && block.offset > start {
                start
            } else {
                block.offset
            };
            locations.push(BlockLocation {
                hosts,
                offset,
                length: block.length,
            });
        }
        Ok(locations)
    }
}
