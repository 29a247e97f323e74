use minidb::doc;
use minidb::errors::{ErrorKind, MiniDbError, MiniDbResult};
use minidb::minidb::MiniDb;
use minidb::store::{Collections, StorageProvider, WriteMode};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Storage that can be switched into a failing state.
#[derive(Default)]
struct FlakyStorage {
    failing: AtomicBool,
    saves: AtomicUsize,
    last: Mutex<Option<Collections>>,
}

impl FlakyStorage {
    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn last(&self) -> Option<Collections> {
        self.last.lock().ok().and_then(|last| last.clone())
    }
}

impl StorageProvider for FlakyStorage {
    fn load(&self) -> MiniDbResult<Option<Collections>> {
        Ok(None)
    }

    fn save(&self, collections: &Collections) -> MiniDbResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MiniDbError::new("No space left", ErrorKind::DiskFull));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last.lock() {
            *last = Some(collections.clone());
        }
        Ok(())
    }

    fn location(&self) -> String {
        "flaky".to_string()
    }
}

fn open(storage: &Arc<FlakyStorage>, mode: WriteMode) -> MiniDb {
    MiniDb::builder()
        .storage_provider(storage.clone())
        .write_mode(mode)
        .open()
        .expect("open flaky database")
}

#[test]
fn test_save_failure_is_reported_without_rollback() {
    for mode in [WriteMode::Background, WriteMode::Synchronous] {
        let storage = Arc::new(FlakyStorage::default());
        let db = open(&storage, mode);
        assert_eq!(storage.saves.load(Ordering::SeqCst), 1);

        storage.fail(true);
        let result = db.insert("people", doc! { name: "Jim" }).expect("insert");
        let err = result.ticket().wait().expect_err("save should fail");
        assert_eq!(err.kind(), &ErrorKind::DiskFull);
        assert!(err.kind().is_storage_error());
        assert!(db.flush().is_err());

        // the mutation stays applied in memory
        assert_eq!(db.count("people", None).expect("count"), 1);

        storage.fail(false);
        db.insert("people", doc! { name: "Kim" })
            .expect("insert")
            .persisted()
            .expect("save should succeed");
        assert!(db.flush().is_ok());

        let saved = storage.last().expect("saved snapshot");
        assert_eq!(saved.get("people").map(|records| records.len()), Some(2));
        db.close().expect("close");
    }
}

#[test]
fn test_load_failure_fails_open() {
    struct Unreadable;

    impl StorageProvider for Unreadable {
        fn load(&self) -> MiniDbResult<Option<Collections>> {
            Err(MiniDbError::new("Access denied", ErrorKind::PermissionDenied))
        }

        fn save(&self, _: &Collections) -> MiniDbResult<()> {
            Ok(())
        }

        fn location(&self) -> String {
            "unreadable".to_string()
        }
    }

    let err = MiniDb::builder()
        .storage_provider(Unreadable)
        .open()
        .err()
        .expect("open should fail");
    assert_eq!(err.kind(), &ErrorKind::PermissionDenied);
}
