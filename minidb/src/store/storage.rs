use crate::errors::MiniDbResult;
use crate::store::Collections;
use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::sync::Arc;

/// A backend that persists the whole database as one snapshot.
///
/// Implementations must be safe to call from the writer thread while the
/// store keeps serving reads on other threads.
pub trait StorageProvider: Send + Sync {
    /// Loads the persisted snapshot.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when nothing has been stored yet, so the store can
    /// initialize an empty database.
    fn load(&self) -> MiniDbResult<Option<Collections>>;

    /// Replaces the persisted snapshot with `collections`.
    fn save(&self, collections: &Collections) -> MiniDbResult<()>;

    /// Human readable location, used in logs.
    fn location(&self) -> String;
}

impl<T: StorageProvider + ?Sized> StorageProvider for Arc<T> {
    fn load(&self) -> MiniDbResult<Option<Collections>> {
        (**self).load()
    }

    fn save(&self, collections: &Collections) -> MiniDbResult<()> {
        (**self).save(collections)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

/// Shared handle to a [StorageProvider].
#[derive(Clone)]
pub struct Storage {
    inner: Arc<dyn StorageProvider>,
}

impl Storage {
    pub fn new<T: StorageProvider + 'static>(inner: T) -> Self {
        Storage {
            inner: Arc::new(inner),
        }
    }
}

impl Debug for Storage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Storage({})", self.inner.location())
    }
}

impl Deref for Storage {
    type Target = Arc<dyn StorageProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
