use crate::collection::{operations, Collection, WriteResult};
use crate::common::Value;
use crate::errors::{ErrorKind, MiniDbError, MiniDbResult};
use crate::filter::FilterCache;
use crate::minidb_builder::MiniDbBuilder;
use crate::minidb_config::MiniDbConfig;
use crate::store::{Collections, PersistenceWriter, Storage, StorageProvider};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An embedded, file-backed document database.
///
/// `MiniDb` keeps every collection in memory and persists the whole database
/// as one JSON file after each mutation. Reads are served from memory and
/// never touch the file.
///
/// Every operation takes the collection key as its first argument and most
/// take an optional [filter](crate::filter) expression. `None` and an empty
/// filter both match every record.
///
/// Mutations are applied in memory before they return. The snapshot they
/// produce is saved by a background writer in mutation order; the returned
/// [WriteResult] carries a ticket to wait for that save. [MiniDb::flush]
/// waits for all queued saves.
///
/// `MiniDb` is a cheap handle: clones share the same database, and the
/// writer is drained and stopped when the last clone is dropped or
/// [MiniDb::close] is called.
///
/// # Examples
///
/// ```rust
/// use minidb::doc;
/// use minidb::minidb::MiniDb;
///
/// # fn main() -> minidb::errors::MiniDbResult<()> {
/// # let dir = tempfile::tempdir().unwrap();
/// # let path = dir.path().join("people.json");
/// let db = MiniDb::open(&path)?;
///
/// db.insert("people", doc! { name: "Jim", age: 27 })?;
/// db.insert("people", doc! { name: "Kim", age: 31 })?;
///
/// let older = db.select("people", Some("$.age > 30"))?;
/// assert_eq!(older.len(), 1);
///
/// db.update("people", doc! { age: 28 }, Some("$.name == 'Jim'"))?;
/// db.remove("people", Some("# == 1"))?;
///
/// db.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MiniDb {
    inner: Arc<MiniDbInner>,
}

impl MiniDb {
    /// Creates a new `MiniDbBuilder` for configuring and opening a database.
    pub fn builder() -> MiniDbBuilder {
        MiniDbBuilder::new()
    }

    /// Opens the database file at `path` with default settings.
    ///
    /// If the file does not exist it is created with an empty database
    /// before this returns. The parent directory must exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file cannot be read or does not hold a
    /// valid database.
    pub fn open<P: AsRef<Path>>(path: P) -> MiniDbResult<MiniDb> {
        MiniDb::builder().file_path(path).open()
    }

    pub(crate) fn new(config: MiniDbConfig) -> MiniDbResult<MiniDb> {
        let inner = MiniDbInner::open(config)?;
        Ok(MiniDb {
            inner: Arc::new(inner),
        })
    }

    /// Returns a handle bound to the collection `key`.
    pub fn collection(&self, key: &str) -> Collection {
        Collection::new(self.clone(), key)
    }

    /// Appends a record to the collection `key`, creating the collection if
    /// it does not exist.
    ///
    /// # Returns
    ///
    /// The inserted record and the ticket of the queued save.
    ///
    /// # Errors
    ///
    /// [ErrorKind::InvalidRecord] if the record cannot be stored as JSON.
    pub fn insert<V: Into<Value>>(&self, key: &str, record: V) -> MiniDbResult<WriteResult<Value>> {
        let result = self.insert_many(key, std::iter::once(record))?;
        let ticket = result.ticket().clone();
        let record = result.into_iter().next().unwrap_or_default();
        Ok(WriteResult::new(record, ticket))
    }

    /// Appends several records with one save. Either all records are
    /// inserted or, if any is invalid, none.
    pub fn insert_many<I, V>(&self, key: &str, records: I) -> MiniDbResult<WriteResult<Vec<Value>>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let records: Vec<Value> = records.into_iter().map(Into::into).collect();
        self.inner
            .mutate(|collections| operations::insert(collections, key, records))
    }

    /// Serializes `record` with serde and inserts it.
    pub fn insert_serializable<T: Serialize>(
        &self,
        key: &str,
        record: &T,
    ) -> MiniDbResult<WriteResult<Value>> {
        let value = Value::from_serializable(record)?;
        self.insert(key, value)
    }

    /// Returns copies of the records of `key` matching `filter`, in
    /// collection order. An unknown key yields an empty list.
    ///
    /// The returned values are independent of the database; changing them
    /// does not change stored records.
    pub fn select(&self, key: &str, filter: Option<&str>) -> MiniDbResult<Vec<Value>> {
        self.inner.select(key, filter)
    }

    /// Like [MiniDb::select], deserializing each record into `T`.
    pub fn select_as<T: DeserializeOwned>(
        &self,
        key: &str,
        filter: Option<&str>,
    ) -> MiniDbResult<Vec<T>> {
        self.select(key, filter)?
            .iter()
            .map(Value::deserialize_into)
            .collect()
    }

    /// Merges `patch` into every record of `key` matching `filter`.
    ///
    /// When both the record and the patch are documents the merge is
    /// shallow: fields of the patch replace or extend the record's fields and
    /// the other fields are kept. Otherwise the patch replaces the record.
    ///
    /// # Returns
    ///
    /// The updated records, after the merge.
    pub fn update<V: Into<Value>>(
        &self,
        key: &str,
        patch: V,
        filter: Option<&str>,
    ) -> MiniDbResult<WriteResult<Vec<Value>>> {
        let patch = patch.into();
        let filter = self.inner.filters.resolve(filter)?;
        self.inner
            .mutate(|collections| operations::update(collections, key, &patch, &filter))
    }

    /// Removes every record of `key` matching `filter`. Positions (`#`)
    /// refer to the collection before the removal. A collection left empty
    /// is deleted.
    ///
    /// # Returns
    ///
    /// The removed records.
    pub fn remove(&self, key: &str, filter: Option<&str>) -> MiniDbResult<WriteResult<Vec<Value>>> {
        let filter = self.inner.filters.resolve(filter)?;
        self.inner
            .mutate(|collections| Ok(operations::remove(collections, key, &filter)))
    }

    /// Counts the records of `key` matching `filter`.
    pub fn count(&self, key: &str, filter: Option<&str>) -> MiniDbResult<usize> {
        self.inner.check_opened()?;
        let filter = self.inner.filters.resolve(filter)?;
        let collections = self.inner.collections.read();
        Ok(operations::count(&collections, key, &filter))
    }

    /// Keys of all non-empty collections, in insertion order.
    pub fn keys(&self) -> MiniDbResult<Vec<String>> {
        self.inner.check_opened()?;
        Ok(self.inner.collections.read().keys().map(String::from).collect())
    }

    pub fn contains_key(&self, key: &str) -> MiniDbResult<bool> {
        self.inner.check_opened()?;
        Ok(self.inner.collections.read().contains_key(key))
    }

    /// Waits until every queued save has completed. Returns the outcome of
    /// the latest one.
    pub fn flush(&self) -> MiniDbResult<()> {
        self.inner.writer.flush()
    }

    /// Flushes pending saves and closes the database. Later operations fail
    /// with [ErrorKind::StoreAlreadyClosed]. Closing twice is allowed.
    pub fn close(&self) -> MiniDbResult<()> {
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Where the database is stored, the file path for file databases.
    pub fn location(&self) -> String {
        self.inner.storage.location()
    }

    pub fn config(&self) -> MiniDbConfig {
        self.inner.config.clone()
    }
}

struct MiniDbInner {
    config: MiniDbConfig,
    storage: Storage,
    collections: RwLock<Collections>,
    writer: PersistenceWriter,
    filters: FilterCache,
    closed: AtomicBool,
}

impl MiniDbInner {
    fn open(config: MiniDbConfig) -> MiniDbResult<Self> {
        let storage = config.initialize()?;

        let collections = match storage.load()? {
            Some(collections) => collections,
            None => {
                let collections = Collections::new();
                storage.save(&collections)?;
                log::debug!("Initialized empty database at {}", storage.location());
                collections
            }
        };

        let writer = PersistenceWriter::new(storage.clone(), config.write_mode())?;
        let filters = FilterCache::new(config.filter_cache_capacity(), config.max_filter_depth());

        log::debug!(
            "Opened database at {} with {} collections",
            storage.location(),
            collections.len()
        );

        Ok(MiniDbInner {
            config,
            storage,
            collections: RwLock::new(collections),
            writer,
            filters,
            closed: AtomicBool::new(false),
        })
    }

    fn check_opened(&self) -> MiniDbResult<()> {
        if self.closed.load(Ordering::Acquire) {
            log::error!("Database {} is already closed", self.storage.location());
            return Err(MiniDbError::new(
                "Database is already closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }

    fn select(&self, key: &str, filter: Option<&str>) -> MiniDbResult<Vec<Value>> {
        self.check_opened()?;
        let filter = self.filters.resolve(filter)?;
        let collections = self.collections.read();
        Ok(operations::select(&collections, key, &filter))
    }

    /// Applies `operation` under the write lock and queues the resulting
    /// snapshot before releasing it, so saves follow mutation order.
    fn mutate<T, F>(&self, operation: F) -> MiniDbResult<WriteResult<T>>
    where
        F: FnOnce(&mut Collections) -> MiniDbResult<T>,
    {
        let mut collections = self.collections.write();
        self.check_opened()?;
        let affected = operation(&mut collections)?;
        let ticket = self.writer.enqueue(collections.clone());
        drop(collections);
        Ok(WriteResult::new(affected, ticket))
    }

    fn close(&self) -> MiniDbResult<()> {
        // mutations check the flag under the write lock, so none can slip in
        // between setting it and draining the writer
        let guard = self.collections.write();
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        drop(guard);

        let result = self.writer.flush();
        self.writer.close();
        log::debug!("Closed database at {}", self.storage.location());
        result
    }
}

// Drains the writer when the last handle goes away.
impl Drop for MiniDbInner {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("Last save before closing {} failed: {}", self.storage.location(), err);
        }
    }
}
