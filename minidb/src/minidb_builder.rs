use crate::errors::{MiniDbError, MiniDbResult};
use crate::minidb::MiniDb;
use crate::minidb_config::MiniDbConfig;
use crate::store::{JsonFormat, Storage, StorageProvider, WriteMode};
use std::path::Path;

/// Builder for creating and configuring a [MiniDb] instance.
///
/// `MiniDbBuilder` provides a fluent API for configuring the database before
/// opening it. The first configuration error is captured and returned by
/// [MiniDbBuilder::open].
///
/// # Examples
///
/// ```rust
/// use minidb::minidb::MiniDb;
/// use minidb::store::WriteMode;
///
/// # fn main() -> minidb::errors::MiniDbResult<()> {
/// # let dir = tempfile::tempdir().unwrap();
/// # let path = dir.path().join("app.json");
/// let db = MiniDb::builder()
///     .file_path(&path)
///     .compact_json()
///     .write_mode(WriteMode::Synchronous)
///     .open()?;
///
/// // an in-memory database for tests
/// let scratch = MiniDb::builder().in_memory().open()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MiniDbBuilder {
    error: Option<MiniDbError>,
    config: MiniDbConfig,
}

impl MiniDbBuilder {
    pub fn new() -> Self {
        MiniDbBuilder {
            error: None,
            config: MiniDbConfig::new(),
        }
    }

    /// Stores the database in the JSON file at `path`.
    pub fn file_path<P: AsRef<Path>>(self, path: P) -> Self {
        let path = path.as_ref().to_string_lossy().to_string();
        self.configure(|config| config.set_db_path(&path))
    }

    /// Keeps the database in memory. Nothing survives the process.
    pub fn in_memory(self) -> Self {
        self.configure(|config| config.set_in_memory(true))
    }

    /// Persists through a custom storage backend.
    pub fn storage(self, storage: Storage) -> Self {
        self.configure(|config| config.set_storage(storage))
    }

    pub fn storage_provider<T: StorageProvider + 'static>(self, provider: T) -> Self {
        self.storage(Storage::new(provider))
    }

    /// Chooses between background and synchronous saves. Background is the
    /// default.
    pub fn write_mode(self, write_mode: WriteMode) -> Self {
        self.configure(|config| config.set_write_mode(write_mode))
    }

    /// Pretty prints the database file with `indent` spaces.
    pub fn json_indent(self, indent: usize) -> Self {
        self.configure(|config| config.set_json_format(JsonFormat::Pretty { indent }))
    }

    /// Writes the database file on a single line.
    pub fn compact_json(self) -> Self {
        self.configure(|config| config.set_json_format(JsonFormat::Compact))
    }

    /// Number of compiled filters kept for reuse. `0` disables the cache.
    pub fn filter_cache_capacity(self, capacity: usize) -> Self {
        self.configure(|config| config.set_filter_cache_capacity(capacity))
    }

    /// Maximum nesting of groups and negations in a filter.
    pub fn max_filter_depth(self, depth: usize) -> Self {
        self.configure(|config| config.set_max_filter_depth(depth))
    }

    /// Opens the database with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns the first error captured while configuring, an
    /// [InvalidOperation](crate::errors::ErrorKind::InvalidOperation) error if
    /// no storage or more than one was configured, or a storage error if the
    /// existing data cannot be loaded.
    pub fn open(self) -> MiniDbResult<MiniDb> {
        if let Some(err) = self.error {
            return Err(err);
        }
        MiniDb::new(self.config)
    }

    fn configure<F>(mut self, apply: F) -> Self
    where
        F: FnOnce(&MiniDbConfig) -> MiniDbResult<()>,
    {
        if self.error.is_none() {
            if let Err(e) = apply(&self.config) {
                self.error = Some(e);
            }
        }
        self
    }
}
