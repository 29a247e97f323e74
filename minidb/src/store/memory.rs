use crate::errors::MiniDbResult;
use crate::store::{Collections, StorageProvider};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Keeps the last saved snapshot in memory. Nothing outlives the process.
#[derive(Default)]
pub struct InMemoryStorage {
    snapshot: Mutex<Option<Collections>>,
    saves: AtomicUsize,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage::default()
    }

    /// Starts with an existing snapshot, as if it had been saved before.
    pub fn with_snapshot(collections: Collections) -> Self {
        InMemoryStorage {
            snapshot: Mutex::new(Some(collections)),
            saves: AtomicUsize::new(0),
        }
    }

    /// The last saved snapshot.
    pub fn snapshot(&self) -> Option<Collections> {
        self.snapshot.lock().clone()
    }

    /// How many times [StorageProvider::save] has been called.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Acquire)
    }
}

impl StorageProvider for InMemoryStorage {
    fn load(&self) -> MiniDbResult<Option<Collections>> {
        Ok(self.snapshot.lock().clone())
    }

    fn save(&self, collections: &Collections) -> MiniDbResult<()> {
        *self.snapshot.lock() = Some(collections.clone());
        self.saves.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let storage = InMemoryStorage::new();
        assert!(storage.load().unwrap().is_none());
        assert_eq!(storage.save_count(), 0);
        assert_eq!(storage.location(), "memory");
    }

    #[test]
    fn keeps_last_save() {
        let storage = InMemoryStorage::new();
        storage.save(&Collections::new()).unwrap();

        let collections = Collections::from_json(r#"{"a": [1]}"#).unwrap();
        storage.save(&collections).unwrap();

        assert_eq!(storage.load().unwrap(), Some(collections));
        assert_eq!(storage.save_count(), 2);
    }

    #[test]
    fn with_snapshot_loads_it() {
        let collections = Collections::from_json(r#"{"a": [1, 2]}"#).unwrap();
        let storage = InMemoryStorage::with_snapshot(collections.clone());
        assert_eq!(storage.snapshot(), Some(collections));
    }
}
