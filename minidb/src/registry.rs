//! Sharing of open databases between callers.
//!
//! Two independent [MiniDb] handles on the same file would each hold their
//! own in-memory copy and overwrite each other's saves. A [StoreRegistry]
//! hands out one shared handle per path instead.

use crate::errors::MiniDbResult;
use crate::minidb::MiniDb;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fs;
use std::path::Path;

/// Keeps one open [MiniDb] per file path.
///
/// # Examples
///
/// ```rust
/// use minidb::registry::StoreRegistry;
///
/// # fn main() -> minidb::errors::MiniDbResult<()> {
/// # let dir = tempfile::tempdir().unwrap();
/// # let path = dir.path().join("shared.json");
/// let registry = StoreRegistry::new();
/// let a = registry.get_or_open(&path)?;
/// let b = registry.get_or_open(&path)?;
///
/// a.insert("k", 1)?;
/// assert_eq!(b.count("k", None)?, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct StoreRegistry {
    stores: DashMap<String, MiniDb>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        StoreRegistry {
            stores: DashMap::new(),
        }
    }

    /// Returns the open database for `path`, opening it with default
    /// settings on first use. A database that was closed through its handle
    /// is reopened.
    pub fn get_or_open<P: AsRef<Path>>(&self, path: P) -> MiniDbResult<MiniDb> {
        let key = registry_key(path.as_ref());
        match self.stores.entry(key) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_closed() {
                    log::debug!("Reopening closed database {}", entry.key());
                    let db = MiniDb::open(entry.key())?;
                    entry.insert(db.clone());
                    return Ok(db);
                }
                Ok(entry.get().clone())
            }
            Entry::Vacant(entry) => {
                let db = MiniDb::open(entry.key())?;
                entry.insert(db.clone());
                Ok(db)
            }
        }
    }

    pub fn get<P: AsRef<Path>>(&self, path: P) -> Option<MiniDb> {
        self.stores
            .get(&registry_key(path.as_ref()))
            .map(|entry| entry.value().clone())
            .filter(|db| !db.is_closed())
    }

    /// Closes and forgets the database for `path`. Returns `Ok(false)` if it
    /// was not registered.
    pub fn close<P: AsRef<Path>>(&self, path: P) -> MiniDbResult<bool> {
        match self.stores.remove(&registry_key(path.as_ref())) {
            Some((_, db)) => db.close().map(|_| true),
            None => Ok(false),
        }
    }

    /// Closes every registered database. Returns the first close error, after
    /// attempting all of them.
    pub fn close_all(&self) -> MiniDbResult<()> {
        let keys: Vec<String> = self.stores.iter().map(|entry| entry.key().clone()).collect();
        let mut first_error = None;
        for key in keys {
            if let Some((_, db)) = self.stores.remove(&key) {
                if let Err(err) = db.close() {
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

/// Resolves `path` so that aliases of one file share a key. The file itself
/// may not exist yet, so only its parent directory is canonicalized.
fn registry_key(path: &Path) -> String {
    let resolved = match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            match fs::canonicalize(parent) {
                Ok(parent) => parent.join(name),
                Err(err) => {
                    log::debug!("Cannot resolve directory of {}: {}", path.display(), err);
                    path.to_path_buf()
                }
            }
        }
        _ => path.to_path_buf(),
    };
    resolved.to_string_lossy().to_string()
}
