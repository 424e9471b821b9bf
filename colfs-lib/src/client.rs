use crate::{BlockReader, ColfsResult, ConsistencyLevel};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// A column value as read back from the store, carrying the write timestamp
/// the store recorded for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValue {
    pub value: Vec<u8>,
    pub timestamp: i64,
}

/// One column write. All columns of a batch carry the same timestamp so the
/// row mutates atomically under last-write-wins.
#[derive(Debug, Clone)]
pub struct ColumnWrite {
    pub name: String,
    pub value: Vec<u8>,
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
pub struct RowMutation {
    pub key: String,
    pub column_family: String,
    pub columns: Vec<ColumnWrite>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOperator {
    Eq,
    Gte,
    Lt,
}

/// Predicate over an indexed column, compared bytewise by the store.
#[derive(Debug, Clone)]
pub struct IndexExpression {
    pub column: String,
    pub op: IndexOperator,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct IndexRow {
    pub key: String,
    pub columns: Vec<(String, ColumnValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub index_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFamilyDef {
    pub name: String,
    pub comment: String,
    pub key_cache_size: f64,
    pub row_cache_size: f64,
    pub column_metadata: Vec<ColumnDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyspaceDef {
    pub name: String,
    pub strategy_class: String,
    pub strategy_options: HashMap<String, String>,
    pub column_families: Vec<ColumnFamilyDef>,
}

/// Reference to a block resident on the local node: the store hands back the
/// backing file plus the byte range covering the requested read.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalBlockRef {
    pub file: String,
    pub offset: u64,
    pub length: u64,
}

/// Answer to a locality-aware block read request.
pub enum LocalOrRemoteBlock {
    Local(LocalBlockRef),
    Remote(BlockReader),
}

/// Boundary interface to the underlying column store. The wire protocol and
/// connection management live behind this trait; the filesystem store only
/// decides keys, columns and consistency levels.
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn get_column(
        &self,
        key: &str,
        column_family: &str,
        column: &str,
        consistency: ConsistencyLevel,
    ) -> ColfsResult<Option<ColumnValue>>;

    async fn insert_column(
        &self,
        key: &str,
        column_family: &str,
        column: ColumnWrite,
        consistency: ConsistencyLevel,
    ) -> ColfsResult<()>;

    /// Tombstone an entire row at the given timestamp.
    async fn remove_row(
        &self,
        key: &str,
        column_family: &str,
        timestamp: i64,
        consistency: ConsistencyLevel,
    ) -> ColfsResult<()>;

    /// Apply a set of row mutations; columns within one row are atomic.
    async fn batch_mutate(
        &self,
        mutations: Vec<RowMutation>,
        consistency: ConsistencyLevel,
    ) -> ColfsResult<()>;

    /// Scan rows matching all predicates via secondary indexes, returning at
    /// most `row_cap` rows restricted to `column_filter` columns.
    async fn index_scan(
        &self,
        column_family: &str,
        predicates: Vec<IndexExpression>,
        column_filter: Vec<String>,
        row_cap: u32,
        consistency: ConsistencyLevel,
    ) -> ColfsResult<Vec<IndexRow>>;

    async fn describe_keyspace(&self, name: &str) -> ColfsResult<Option<KeyspaceDef>>;

    /// Create a keyspace. A keyspace that already exists surfaces as
    /// [`crate::ColfsError::AlreadyExists`].
    async fn create_keyspace(&self, keyspace: KeyspaceDef) -> ColfsResult<()>;

    async fn use_keyspace(&self, name: &str) -> ColfsResult<()>;

    /// Locality-aware block fetch: `host_hint` names the caller's node so the
    /// store can answer with a local file reference instead of shipping
    /// bytes. `Ok(None)` means the store has no knowledge of the block.
    async fn local_or_remote_block(
        &self,
        host_hint: &str,
        block_key: &str,
        range_start: u64,
    ) -> ColfsResult<Option<LocalOrRemoteBlock>>;

    /// Replica endpoints for each key, in key order.
    async fn replica_endpoints(
        &self,
        keyspace: &str,
        keys: &[String],
    ) -> ColfsResult<Vec<Vec<String>>>;
}

pub type StoreClientRef = Arc<dyn StoreClient>;
