//! Configuration management for minidb.

use crate::errors::{ErrorKind, MiniDbError, MiniDbResult};
use crate::filter::{DEFAULT_FILTER_CACHE_CAPACITY, DEFAULT_MAX_FILTER_DEPTH};
use crate::store::{InMemoryStorage, JsonFileStorage, JsonFormat, Storage, WriteMode};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Configuration of a minidb database.
///
/// `MiniDbConfig` is usually populated through
/// [MiniDbBuilder](crate::minidb_builder::MiniDbBuilder). Every setting can
/// be changed only until the database is opened; afterwards setters fail
/// with [ErrorKind::InvalidOperation].
///
/// Exactly one storage source must be configured: a file path, in-memory
/// mode, or a custom [Storage].
///
/// Clones share the same underlying configuration.
#[derive(Clone)]
pub struct MiniDbConfig {
    inner: Arc<MiniDbConfigInner>,
}

impl Default for MiniDbConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MiniDbConfig {
    pub fn new() -> Self {
        MiniDbConfig {
            inner: Arc::new(MiniDbConfigInner::new()),
        }
    }

    /// Sets the path of the JSON database file. Can be set only once.
    pub fn set_db_path(&self, db_path: &str) -> MiniDbResult<()> {
        self.inner.set_db_path(db_path)
    }

    pub fn db_path(&self) -> Option<String> {
        self.inner.db_path.get().cloned()
    }

    /// Keeps the database in memory only.
    pub fn set_in_memory(&self, in_memory: bool) -> MiniDbResult<()> {
        self.inner.check_not_configured("In-memory mode")?;
        self.inner.in_memory.store(in_memory, Ordering::Relaxed);
        Ok(())
    }

    pub fn in_memory(&self) -> bool {
        self.inner.in_memory.load(Ordering::Relaxed)
    }

    /// Uses a custom storage backend instead of a file. Can be set only once.
    pub fn set_storage(&self, storage: Storage) -> MiniDbResult<()> {
        self.inner.check_not_configured("Storage")?;
        if self.inner.storage.set(storage).is_err() {
            log::error!("Storage is already set");
            return Err(MiniDbError::new(
                "Storage is already set",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    pub fn set_write_mode(&self, write_mode: WriteMode) -> MiniDbResult<()> {
        self.inner.check_not_configured("Write mode")?;
        *self.inner.write_mode.lock() = write_mode;
        Ok(())
    }

    pub fn write_mode(&self) -> WriteMode {
        *self.inner.write_mode.lock()
    }

    pub fn set_json_format(&self, json_format: JsonFormat) -> MiniDbResult<()> {
        self.inner.check_not_configured("JSON format")?;
        *self.inner.json_format.lock() = json_format;
        Ok(())
    }

    pub fn json_format(&self) -> JsonFormat {
        *self.inner.json_format.lock()
    }

    /// Sets how many compiled filters are cached. Zero disables the cache.
    pub fn set_filter_cache_capacity(&self, capacity: usize) -> MiniDbResult<()> {
        self.inner.check_not_configured("Filter cache capacity")?;
        self.inner
            .filter_cache_capacity
            .store(capacity, Ordering::Relaxed);
        Ok(())
    }

    pub fn filter_cache_capacity(&self) -> usize {
        self.inner.filter_cache_capacity.load(Ordering::Relaxed)
    }

    /// Sets the maximum nesting of `!` and parentheses accepted in a filter.
    pub fn set_max_filter_depth(&self, depth: usize) -> MiniDbResult<()> {
        self.inner.check_not_configured("Max filter depth")?;
        if depth == 0 {
            log::error!("Max filter depth must be at least 1");
            return Err(MiniDbError::new(
                "Max filter depth must be at least 1",
                ErrorKind::InvalidOperation,
            ));
        }
        self.inner.max_filter_depth.store(depth, Ordering::Relaxed);
        Ok(())
    }

    pub fn max_filter_depth(&self) -> usize {
        self.inner.max_filter_depth.load(Ordering::Relaxed)
    }

    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::Acquire)
    }

    /// Validates the settings, freezes them and creates the storage backend.
    pub(crate) fn initialize(&self) -> MiniDbResult<Storage> {
        self.inner.initialize()
    }
}

struct MiniDbConfigInner {
    configured: AtomicBool,
    db_path: OnceLock<String>,
    in_memory: AtomicBool,
    storage: OnceLock<Storage>,
    write_mode: Mutex<WriteMode>,
    json_format: Mutex<JsonFormat>,
    filter_cache_capacity: AtomicUsize,
    max_filter_depth: AtomicUsize,
}

impl MiniDbConfigInner {
    fn new() -> Self {
        MiniDbConfigInner {
            configured: AtomicBool::new(false),
            db_path: OnceLock::new(),
            in_memory: AtomicBool::new(false),
            storage: OnceLock::new(),
            write_mode: Mutex::new(WriteMode::default()),
            json_format: Mutex::new(JsonFormat::default()),
            filter_cache_capacity: AtomicUsize::new(DEFAULT_FILTER_CACHE_CAPACITY),
            max_filter_depth: AtomicUsize::new(DEFAULT_MAX_FILTER_DEPTH),
        }
    }

    fn check_not_configured(&self, setting: &str) -> MiniDbResult<()> {
        if self.configured.load(Ordering::Acquire) {
            log::error!("{} cannot be changed after the database is opened", setting);
            return Err(MiniDbError::new(
                &format!("{} cannot be changed after the database is opened", setting),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    fn set_db_path(&self, db_path: &str) -> MiniDbResult<()> {
        self.check_not_configured("Database path")?;
        if db_path.trim().is_empty() {
            log::error!("Database path cannot be empty");
            return Err(MiniDbError::new(
                "Database path cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }

        if self.db_path.set(db_path.to_string()).is_err() {
            log::error!("Database path is already set");
            return Err(MiniDbError::new(
                "Database path is already set",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    fn initialize(&self) -> MiniDbResult<Storage> {
        if self.configured.swap(true, Ordering::AcqRel) {
            log::error!("Configuration is already in use by an open database");
            return Err(MiniDbError::new(
                "Configuration is already in use by an open database",
                ErrorKind::InvalidOperation,
            ));
        }

        let in_memory = self.in_memory.load(Ordering::Relaxed);
        let sources = [
            self.db_path.get().is_some(),
            in_memory,
            self.storage.get().is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();

        if sources != 1 {
            // allow fixing the builder and retrying
            self.configured.store(false, Ordering::Release);
            let message = if sources == 0 {
                "No storage configured, set a database path, in-memory mode or a storage provider"
            } else {
                "Only one of database path, in-memory mode or storage provider can be set"
            };
            log::error!("{}", message);
            return Err(MiniDbError::new(message, ErrorKind::InvalidOperation));
        }

        if let Some(storage) = self.storage.get() {
            return Ok(storage.clone());
        }
        if in_memory {
            return Ok(Storage::new(InMemoryStorage::new()));
        }
        match self.db_path.get() {
            Some(path) => Ok(Storage::new(JsonFileStorage::new(
                path,
                *self.json_format.lock(),
            ))),
            None => Err(MiniDbError::new(
                "No storage configured",
                ErrorKind::InternalError,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StorageProvider;

    #[test]
    fn defaults() {
        let config = MiniDbConfig::new();
        assert_eq!(config.db_path(), None);
        assert!(!config.in_memory());
        assert_eq!(config.write_mode(), WriteMode::Background);
        assert_eq!(config.json_format(), JsonFormat::Pretty { indent: 2 });
        assert_eq!(config.filter_cache_capacity(), 256);
        assert_eq!(config.max_filter_depth(), 64);
        assert!(!config.is_configured());
    }

    #[test]
    fn db_path_is_write_once() {
        let config = MiniDbConfig::new();
        config.set_db_path("/tmp/a.json").unwrap();
        let err = config.set_db_path("/tmp/b.json").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        assert_eq!(config.db_path(), Some("/tmp/a.json".to_string()));
    }

    #[test]
    fn rejects_empty_path_and_zero_depth() {
        let config = MiniDbConfig::new();
        assert!(config.set_db_path("  ").is_err());
        assert!(config.set_max_filter_depth(0).is_err());
        assert_eq!(config.max_filter_depth(), 64);
    }

    #[test]
    fn settings_freeze_after_initialize() {
        let config = MiniDbConfig::new();
        config.set_in_memory(true).unwrap();
        let storage = config.initialize().unwrap();
        assert_eq!(storage.location(), "memory");
        assert!(config.is_configured());

        let err = config.set_write_mode(WriteMode::Synchronous).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        assert!(config.set_filter_cache_capacity(1).is_err());
        assert!(config.initialize().is_err());
    }

    #[test]
    fn exactly_one_storage_source() {
        let config = MiniDbConfig::new();
        let err = config.initialize().unwrap_err();
        assert!(err.message().contains("No storage configured"));
        assert!(!config.is_configured());

        config.set_db_path("/tmp/x.json").unwrap();
        config.set_in_memory(true).unwrap();
        let err = config.initialize().unwrap_err();
        assert!(err.message().contains("Only one"));

        config.set_in_memory(false).unwrap();
        let storage = config.initialize().unwrap();
        assert_eq!(storage.location(), "/tmp/x.json");
    }

    #[test]
    fn clones_share_settings() {
        let config = MiniDbConfig::new();
        let clone = config.clone();
        clone.set_filter_cache_capacity(8).unwrap();
        assert_eq!(config.filter_cache_capacity(), 8);
    }
}
