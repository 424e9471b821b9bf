//! In-memory stand-in for the column store, used by the test suites. Models
//! the pieces of store behavior the filesystem layer depends on: per-column
//! last-write-wins by timestamp, bytewise secondary-index predicates, the
//! create-keyspace race and the local-or-remote block answer.

use crate::{
    ColfsError, ColfsResult, ColumnValue, ColumnWrite, ConsistencyLevel, IndexExpression,
    IndexOperator, IndexRow, KeyspaceDef, LocalBlockRef, LocalOrRemoteBlock, RowMutation,
    StoreClient, BLOCK_CF, DATA_COLUMN,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

pub struct MemStoreClient {
    keyspaces: Mutex<HashMap<String, KeyspaceDef>>,
    /// (column family, row key) -> columns.
    rows: Mutex<HashMap<(String, String), HashMap<String, ColumnValue>>>,
    /// block key -> local file reference covering the whole block.
    local_blocks: Mutex<HashMap<String, LocalBlockRef>>,
    /// block key -> replica endpoints.
    endpoints: Mutex<HashMap<String, Vec<String>>>,
    selected_keyspace: Mutex<Option<String>>,
    create_calls: AtomicU32,
    fail_next_batch: AtomicBool,
}

impl MemStoreClient {
    pub fn new() -> Self {
        Self {
            keyspaces: Mutex::new(HashMap::new()),
            rows: Mutex::new(HashMap::new()),
            local_blocks: Mutex::new(HashMap::new()),
            endpoints: Mutex::new(HashMap::new()),
            selected_keyspace: Mutex::new(None),
            create_calls: AtomicU32::new(0),
            fail_next_batch: AtomicBool::new(false),
        }
    }

    /// How many create-keyspace calls actually took effect.
    pub fn effective_creations(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn selected_keyspace(&self) -> Option<String> {
        self.selected_keyspace.lock().unwrap().clone()
    }

    /// Mark a block as resident on the local node, backed by `file`.
    pub fn add_local_block(&self, block_key: &str, local: LocalBlockRef) {
        self.local_blocks
            .lock()
            .unwrap()
            .insert(block_key.to_string(), local);
    }

    pub fn set_endpoints(&self, block_key: &str, hosts: Vec<String>) {
        self.endpoints
            .lock()
            .unwrap()
            .insert(block_key.to_string(), hosts);
    }

    /// Make the next batch_mutate fail with a store error.
    pub fn fail_next_batch_mutate(&self) {
        self.fail_next_batch.store(true, Ordering::SeqCst);
    }

    fn apply_column(
        row: &mut HashMap<String, ColumnValue>,
        column: ColumnWrite,
    ) {
        let apply = match row.get(&column.name) {
            Some(existing) => column.timestamp >= existing.timestamp,
            None => true,
        };
        if apply {
            row.insert(
                column.name,
                ColumnValue {
                    value: column.value,
                    timestamp: column.timestamp,
                },
            );
        }
    }

    fn matches(columns: &HashMap<String, ColumnValue>, predicate: &IndexExpression) -> bool {
        let Some(column) = columns.get(&predicate.column) else {
            return false;
        };
        match predicate.op {
            IndexOperator::Eq => column.value == predicate.value,
            IndexOperator::Gte => column.value >= predicate.value,
            IndexOperator::Lt => column.value < predicate.value,
        }
    }
}

#[async_trait]
impl StoreClient for MemStoreClient {
    async fn get_column(
        &self,
        key: &str,
        column_family: &str,
        column: &str,
        _consistency: ConsistencyLevel,
    ) -> ColfsResult<Option<ColumnValue>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .get(&(column_family.to_string(), key.to_string()))
            .and_then(|columns| columns.get(column))
            .cloned())
    }

    async fn insert_column(
        &self,
        key: &str,
        column_family: &str,
        column: ColumnWrite,
        _consistency: ConsistencyLevel,
    ) -> ColfsResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .entry((column_family.to_string(), key.to_string()))
            .or_default();
        Self::apply_column(row, column);
        Ok(())
    }

    async fn remove_row(
        &self,
        key: &str,
        column_family: &str,
        _timestamp: i64,
        _consistency: ConsistencyLevel,
    ) -> ColfsResult<()> {
        let mut rows = self.rows.lock().unwrap();
        rows.remove(&(column_family.to_string(), key.to_string()));
        Ok(())
    }

    async fn batch_mutate(
        &self,
        mutations: Vec<RowMutation>,
        _consistency: ConsistencyLevel,
    ) -> ColfsResult<()> {
        if self.fail_next_batch.swap(false, Ordering::SeqCst) {
            return Err(ColfsError::StoreError("injected write failure".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        for mutation in mutations {
            let row = rows
                .entry((mutation.column_family, mutation.key))
                .or_default();
            for column in mutation.columns {
                Self::apply_column(row, column);
            }
        }
        Ok(())
    }

    async fn index_scan(
        &self,
        column_family: &str,
        predicates: Vec<IndexExpression>,
        column_filter: Vec<String>,
        row_cap: u32,
        _consistency: ConsistencyLevel,
    ) -> ColfsResult<Vec<IndexRow>> {
        let rows = self.rows.lock().unwrap();
        let mut matched: Vec<IndexRow> = rows
            .iter()
            .filter(|((cf, _), _)| cf == column_family)
            .filter(|(_, columns)| predicates.iter().all(|p| Self::matches(columns, p)))
            .map(|((_, key), columns)| IndexRow {
                key: key.clone(),
                columns: columns
                    .iter()
                    .filter(|(name, _)| column_filter.contains(*name))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect(),
            })
            .collect();
        matched.sort_by(|a, b| a.key.cmp(&b.key));
        matched.truncate(row_cap as usize);
        Ok(matched)
    }

    async fn describe_keyspace(&self, name: &str) -> ColfsResult<Option<KeyspaceDef>> {
        Ok(self.keyspaces.lock().unwrap().get(name).cloned())
    }

    async fn create_keyspace(&self, keyspace: KeyspaceDef) -> ColfsResult<()> {
        let mut keyspaces = self.keyspaces.lock().unwrap();
        if keyspaces.contains_key(&keyspace.name) {
            return Err(ColfsError::AlreadyExists(format!(
                "keyspace {} already exists",
                keyspace.name
            )));
        }
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        keyspaces.insert(keyspace.name.clone(), keyspace);
        Ok(())
    }

    async fn use_keyspace(&self, name: &str) -> ColfsResult<()> {
        if !self.keyspaces.lock().unwrap().contains_key(name) {
            return Err(ColfsError::NotFound(format!("keyspace {} not found", name)));
        }
        *self.selected_keyspace.lock().unwrap() = Some(name.to_string());
        Ok(())
    }

    async fn local_or_remote_block(
        &self,
        _host_hint: &str,
        block_key: &str,
        range_start: u64,
    ) -> ColfsResult<Option<LocalOrRemoteBlock>> {
        if let Some(local) = self.local_blocks.lock().unwrap().get(block_key) {
            if range_start > local.length {
                return Err(ColfsError::InvalidParam(format!(
                    "range start {} beyond block length {}",
                    range_start, local.length
                )));
            }
            return Ok(Some(LocalOrRemoteBlock::Local(LocalBlockRef {
                file: local.file.clone(),
                offset: local.offset + range_start,
                length: local.length - range_start,
            })));
        }

        let rows = self.rows.lock().unwrap();
        if let Some(column) = rows
            .get(&(BLOCK_CF.to_string(), block_key.to_string()))
            .and_then(|columns| columns.get(DATA_COLUMN))
        {
            let start = (range_start as usize).min(column.value.len());
            let data = column.value[start..].to_vec();
            return Ok(Some(LocalOrRemoteBlock::Remote(Box::pin(Cursor::new(
                data,
            )))));
        }

        Ok(None)
    }

    async fn replica_endpoints(
        &self,
        _keyspace: &str,
        keys: &[String],
    ) -> ColfsResult<Vec<Vec<String>>> {
        let endpoints = self.endpoints.lock().unwrap();
        Ok(keys
            .iter()
            .map(|key| endpoints.get(key).cloned().unwrap_or_default())
            .collect())
    }
}
