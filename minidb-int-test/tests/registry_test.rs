use minidb::doc;
use minidb::minidb::MiniDb;
use minidb::registry::StoreRegistry;
use minidb_int_test::test_util::{random_path, remove_file};
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_registry_shares_one_database_per_path() {
    let path = random_path();
    let registry = StoreRegistry::new();

    let first = registry.get_or_open(&path).expect("open");
    let second = registry.get_or_open(&path).expect("open again");
    first.insert("people", doc! { name: "Jim" }).expect("insert");
    second.insert("people", doc! { name: "Kim" }).expect("insert");

    assert_eq!(first.count("people", None).expect("count"), 2);
    assert_eq!(second.select("people", None).expect("select"), first.select("people", None).expect("select"));

    registry.close_all().expect("close");
    remove_file(&path).expect("cleanup");
}

#[test]
fn test_registry_resolves_path_aliases() {
    let path = random_path();
    let file = Path::new(&path);
    let alias = file
        .parent()
        .expect("temp dir")
        .join(".")
        .join(file.file_name().expect("file name"));
    let registry = StoreRegistry::new();

    let first = registry.get_or_open(&path).expect("open");
    let second = registry.get_or_open(&alias).expect("open alias");
    assert_eq!(registry.len(), 1);

    first.insert("k", 1).expect("insert");
    second.insert("k", 2).expect("insert");
    first.flush().expect("flush");
    second.flush().expect("flush alias");
    registry.close_all().expect("close");

    let reopened = MiniDb::open(&path).expect("reopen");
    assert_eq!(reopened.count("k", None).expect("count"), 2);
    reopened.close().expect("close");
    remove_file(&path).expect("cleanup");
}

#[test]
fn test_registry_from_many_threads() {
    let path = random_path();
    let registry = Arc::new(StoreRegistry::new());
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            let path = path.clone();
            thread::spawn(move || {
                barrier.wait();
                let db = registry.get_or_open(&path).expect("open");
                db.insert("workers", doc! { id: i }).expect("insert");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker");
    }

    assert_eq!(registry.len(), 1);
    let db = registry.get(&path).expect("registered");
    assert_eq!(db.count("workers", None).expect("count"), 8);

    assert!(registry.close(&path).expect("close"));
    remove_file(&path).expect("cleanup");
}
