//! Purpose: Async key-value persistence facade over redb with connection caching.
//! Exports: `KvStore`, `StoreHandle`.
//! Role: Per-database-name connection registry plus one-transaction put/get.
//! Invariants: At most one in-flight open per database name; concurrent opens
//! converge on the same pending open.
//! Invariants: `put` resolves only after its transaction commits.
//! Invariants: Open failures roll the registry back so a later open retries.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use redb::{Database, TableDefinition, TableError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, OnceCell};
use tokio::task;

use crate::core::error::{Error, ErrorKind};
use crate::core::store_paths::{default_data_dir, resolve_named_db_path};

type DbCell = Arc<OnceCell<Arc<Database>>>;

/// Shared handle to one open database. All callers addressing the same
/// database name hold clones of the same underlying connection.
#[derive(Clone)]
pub struct StoreHandle {
    db: Arc<Database>,
}

impl StoreHandle {
    pub fn same_connection(&self, other: &StoreHandle) -> bool {
        Arc::ptr_eq(&self.db, &other.db)
    }
}

pub struct KvStore {
    root: PathBuf,
    registry: Mutex<HashMap<String, DbCell>>,
}

impl KvStore {
    pub fn new() -> Self {
        Self {
            root: default_data_dir(),
            registry: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Opens (or reuses) the connection for `db_name`. The registry caches the
    /// in-flight open itself, so a second caller arriving before the first
    /// open finishes awaits the same open instead of issuing another.
    pub async fn open(&self, db_name: &str, store_name: &str) -> Result<StoreHandle, Error> {
        let path = resolve_named_db_path(db_name, &self.root)?;
        let cell = {
            let mut registry = self.registry.lock().await;
            registry.entry(db_name.to_string()).or_default().clone()
        };

        let store_name = store_name.to_string();
        let result = cell
            .get_or_try_init(|| open_database(path.clone(), store_name))
            .await;

        match result {
            Ok(db) => Ok(StoreHandle { db: db.clone() }),
            Err(err) => {
                // Roll the registry back so a later open retries cleanly.
                let mut registry = self.registry.lock().await;
                if let Some(existing) = registry.get(db_name) {
                    if Arc::ptr_eq(existing, &cell) && existing.get().is_none() {
                        registry.remove(db_name);
                    }
                }
                Err(err)
            }
        }
    }

    /// Upserts `value` under `key` in one read-write transaction. Resolves
    /// only after the transaction commits.
    pub async fn put<T: Serialize>(
        &self,
        db_name: &str,
        store_name: &str,
        key: &str,
        value: &T,
    ) -> Result<(), Error> {
        let bytes = serde_json::to_vec(value).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("value is not serializable")
                .with_source(err)
        })?;
        let handle = self.open(db_name, store_name).await?;

        let db = handle.db.clone();
        let store_name = store_name.to_string();
        let key = key.to_string();
        run_blocking(move || {
            let txn = db.begin_write().map_err(|err| {
                storage_error("failed to begin write transaction", &store_name, err)
            })?;
            {
                let mut table = txn
                    .open_table(table_def(&store_name))
                    .map_err(|err| storage_error("failed to open store", &store_name, err))?;
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .map_err(|err| storage_error("failed to write record", &store_name, err))?;
            }
            txn.commit()
                .map_err(|err| storage_error("failed to commit transaction", &store_name, err))
        })
        .await
    }

    /// Reads the value stored under `key` in one read-only transaction. A key
    /// (or store) nothing was ever written to resolves to `None`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        db_name: &str,
        store_name: &str,
        key: &str,
    ) -> Result<Option<T>, Error> {
        let handle = self.open(db_name, store_name).await?;

        let db = handle.db.clone();
        let store = store_name.to_string();
        let key = key.to_string();
        let bytes = run_blocking(move || {
            let txn = db
                .begin_read()
                .map_err(|err| storage_error("failed to begin read transaction", &store, err))?;
            let table = match txn.open_table(table_def(&store)) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(None),
                Err(err) => return Err(storage_error("failed to open store", &store, err)),
            };
            let guard = table
                .get(key.as_str())
                .map_err(|err| storage_error("failed to read record", &store, err))?;
            Ok(guard.map(|value| value.value().to_vec()))
        })
        .await?;

        match bytes {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes).map_err(|err| {
                    Error::new(ErrorKind::Storage)
                        .with_message("failed to decode stored value")
                        .with_store(store_name)
                        .with_source(err)
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Evicts the cached connection for `db_name`, the analogue of observing
    /// connection closure. The database file is released once the last
    /// outstanding handle drops; the next `open` performs a fresh open.
    pub async fn close(&self, db_name: &str) -> bool {
        let mut registry = self.registry.lock().await;
        let evicted = registry.remove(db_name).is_some();
        if evicted {
            tracing::debug!(db = db_name, "evicted cached connection");
        }
        evicted
    }
}

impl Default for KvStore {
    fn default() -> Self {
        Self::new()
    }
}

fn table_def(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

async fn open_database(path: PathBuf, store_name: String) -> Result<Arc<Database>, Error> {
    task::spawn_blocking(move || {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                Error::new(ErrorKind::Unsupported)
                    .with_message("storage root unavailable")
                    .with_path(parent)
                    .with_source(err)
            })?;
        }
        let db = Database::create(&path).map_err(|err| {
            Error::new(ErrorKind::Storage)
                .with_message("failed to open database")
                .with_path(&path)
                .with_source(err)
        })?;

        // First physical open materializes the named store, so later reads
        // see it even before anything is written.
        let txn = db
            .begin_write()
            .map_err(|err| storage_error("failed to begin create transaction", &store_name, err))?;
        txn.open_table(table_def(&store_name))
            .map_err(|err| storage_error("failed to create store", &store_name, err))?;
        txn.commit()
            .map_err(|err| storage_error("failed to commit create transaction", &store_name, err))?;

        tracing::debug!(path = %path.display(), store = %store_name, "opened store database");
        Ok(Arc::new(db))
    })
    .await
    .map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("storage task failed")
            .with_source(err)
    })?
}

async fn run_blocking<T, F>(work: F) -> Result<T, Error>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Error> + Send + 'static,
{
    task::spawn_blocking(work).await.map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("storage task failed")
            .with_source(err)
    })?
}

fn storage_error(
    message: &str,
    store: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> Error {
    Error::new(ErrorKind::Storage)
        .with_message(message)
        .with_store(store)
        .with_source(source)
}
