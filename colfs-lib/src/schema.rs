use crate::{
    ColfsConfig, ColfsError, ColfsResult, ColumnDef, ColumnFamilyDef, ConsistencyPolicy,
    KeyspaceDef, StoreClientRef, BLOCK_CF, FS_KEYSPACE, INODE_CF, PATH_COLUMN, SENTINEL_COLUMN,
};
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;

/// Ensure the filesystem keyspace exists, resolve the consistency policy
/// against its replication strategy, and select it on the connection. Called
/// once per process/connection before any other operation.
///
/// Many cooperating nodes may race to create the same schema; see
/// [`create_fs_keyspace`] for how the race is absorbed. Transport failures
/// here are fatal initialization errors, there is no retry beyond the one
/// desynchronized re-check.
pub async fn ensure_schema(
    client: &StoreClientRef,
    config: &ColfsConfig,
) -> ColfsResult<ConsistencyPolicy> {
    let ks = match check_keyspace(client).await? {
        Some(ks) => ks,
        None => create_fs_keyspace(client, config).await?,
    };

    let policy = ConsistencyPolicy::from_keyspace(config, &ks)?;

    client.use_keyspace(FS_KEYSPACE).await.map_err(|e| {
        warn!("SchemaBootstrap: select keyspace failed! {}", e);
        ColfsError::SchemaError(format!("select keyspace {} failed: {}", FS_KEYSPACE, e))
    })?;

    Ok(policy)
}

async fn check_keyspace(client: &StoreClientRef) -> ColfsResult<Option<KeyspaceDef>> {
    client.describe_keyspace(FS_KEYSPACE).await
}

/// Create the keyspace, tolerating concurrent creators. Sleeps a randomized
/// bounded backoff to desynchronize racing nodes, re-checks, and only issues
/// the create call if the keyspace is still absent. "Already exists" from the
/// create call is success, not failure.
async fn create_fs_keyspace(
    client: &StoreClientRef,
    config: &ColfsConfig,
) -> ColfsResult<KeyspaceDef> {
    let stagger_ms = rand::thread_rng().gen_range(0..=config.bootstrap_stagger_ms);
    debug!(
        "SchemaBootstrap: staggering keyspace creation by {}ms",
        stagger_ms
    );
    tokio::time::sleep(Duration::from_millis(stagger_ms)).await;

    if let Some(ks) = check_keyspace(client).await? {
        debug!("SchemaBootstrap: keyspace appeared while staggering");
        return Ok(ks);
    }

    let ks = fs_keyspace_def(config);
    match client.create_keyspace(ks.clone()).await {
        Ok(()) => {
            info!("SchemaBootstrap: created keyspace {}", FS_KEYSPACE);
            Ok(ks)
        }
        Err(ColfsError::AlreadyExists(_)) => {
            debug!("SchemaBootstrap: lost creation race, keyspace already exists");
            check_keyspace(client).await?.ok_or_else(|| {
                ColfsError::SchemaError(format!(
                    "keyspace {} reported existing but is not describable",
                    FS_KEYSPACE
                ))
            })
        }
        Err(e) => {
            warn!("SchemaBootstrap: create keyspace failed! {}", e);
            Err(ColfsError::SchemaError(format!(
                "create keyspace {} failed: {}",
                FS_KEYSPACE, e
            )))
        }
    }
}

/// Schema for the filesystem keyspace: an inode column family with secondary
/// indexes on the path and sentinel columns, and a block column family with
/// no indexes. Caches are disabled on both, the data is write-once and
/// directly addressed by key.
pub fn fs_keyspace_def(config: &ColfsConfig) -> KeyspaceDef {
    let inode_cf = ColumnFamilyDef {
        name: INODE_CF.to_string(),
        comment: "stores file metadata".to_string(),
        key_cache_size: 0.0,
        row_cache_size: 0.0,
        column_metadata: vec![
            ColumnDef {
                name: PATH_COLUMN.to_string(),
                index_name: Some("path".to_string()),
            },
            ColumnDef {
                name: SENTINEL_COLUMN.to_string(),
                index_name: Some("sentinel".to_string()),
            },
        ],
    };

    let block_cf = ColumnFamilyDef {
        name: BLOCK_CF.to_string(),
        comment: "stores blocks of data associated with an inode".to_string(),
        key_cache_size: 0.0,
        row_cache_size: 0.0,
        column_metadata: Vec::new(),
    };

    let mut strategy_options = HashMap::new();
    strategy_options.insert("replication_factor".to_string(), config.replication.to_string());

    KeyspaceDef {
        name: FS_KEYSPACE.to_string(),
        strategy_class: "org.apache.cassandra.locator.NetworkTopologyStrategy".to_string(),
        strategy_options,
        column_families: vec![inode_cf, block_cf],
    }
}
