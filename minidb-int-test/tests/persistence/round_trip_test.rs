use minidb::common::Value;
use minidb::doc;
use minidb::errors::ErrorKind;
use minidb::minidb::MiniDb;
use minidb_int_test::test_util::{
    cleanup, create_test_context, insert_people, random_path, remove_file, run_test,
};
use std::fs;

#[test]
fn test_reopen_restores_collections() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            insert_people(&db)?;
            db.insert("config", doc! { theme: "dark", sizes: [1, 2.5, null] })?;
            db.insert("counters", u64::MAX)?;

            let people = db.select("people", None)?;
            let config = db.select("config", None)?;
            let keys = db.keys()?;

            let reopened = ctx.reopen()?;
            assert_eq!(reopened.select("people", None)?, people);
            assert_eq!(reopened.select("config", None)?, config);
            assert_eq!(reopened.select("counters", None)?, vec![Value::from(u64::MAX)]);
            assert_eq!(reopened.keys()?, keys);
            reopened.close()
        },
        cleanup,
    )
}

#[test]
fn test_file_is_pretty_printed() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            db.insert("k", doc! { a: 1 })?.persisted()?;

            let text = fs::read_to_string(ctx.path())?;
            assert_eq!(text, "{\n  \"k\": [\n    {\n      \"a\": 1\n    }\n  ]\n}");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_open_existing_file() {
    let path = random_path();
    fs::write(&path, r#"{"people": [{"name": "Jim", "age": 27}], "empty": []}"#)
        .expect("write fixture");

    let db = MiniDb::open(&path).expect("open fixture");
    assert_eq!(
        db.select("people", Some("$.age == 27")).expect("select"),
        vec![Value::from(doc! { name: "Jim", age: 27 })]
    );
    assert_eq!(db.keys().expect("keys"), vec!["people".to_string()]);

    db.close().expect("close");
    remove_file(&path).expect("cleanup");
}

#[test]
fn test_open_empty_file() {
    let path = random_path();
    fs::write(&path, "").expect("write fixture");

    let db = MiniDb::open(&path).expect("open empty file");
    assert!(db.keys().expect("keys").is_empty());
    assert_eq!(fs::read_to_string(&path).expect("read"), "");

    db.insert("k", 1).expect("insert");
    db.close().expect("close");
    assert!(!fs::read_to_string(&path).expect("read").is_empty());
    remove_file(&path).expect("cleanup");
}

#[test]
fn test_open_corrupted_file_fails() {
    for content in ["{ not json", "[1, 2]", r#"{"people": {"name": "Jim"}}"#] {
        let path = random_path();
        fs::write(&path, content).expect("write fixture");

        let err = MiniDb::open(&path).err().expect("open should fail");
        assert_eq!(err.kind(), &ErrorKind::FileCorrupted, "content: {}", content);
        assert!(err.kind().is_storage_error());
        assert_eq!(fs::read_to_string(&path).expect("read"), content);

        remove_file(&path).expect("cleanup");
    }
}

#[test]
fn test_open_in_missing_directory_fails() {
    let path = std::path::Path::new(&random_path()).join("nested").join("db.json");
    let err = MiniDb::open(&path).err().expect("open should fail");
    assert_eq!(err.kind(), &ErrorKind::FileNotFound);
}
