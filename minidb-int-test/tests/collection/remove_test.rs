use minidb::common::Value;
use minidb::doc;
use minidb_int_test::test_util::{cleanup, create_test_context, insert_people, run_test};

#[test]
fn test_remove_compacts_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            insert_people(&db)?;

            let removed = db.remove("people", Some("$.city == 'Oslo'"))?;
            assert_eq!(removed.len(), 2);

            let remaining = db.select("people", None)?;
            assert_eq!(remaining.len(), 1);
            assert!(remaining.iter().all(|r| r.get("city") != Some(&Value::from("Oslo"))));
            assert_eq!(db.select("people", Some("# == 0"))?, remaining);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_remove_uses_positions_before_removal() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            db.insert_many("letters", vec!["a", "b", "c", "d"])?;

            let removed = db.remove("letters", Some("# == 1 || # == 2"))?;
            assert_eq!(removed.into_affected(), vec![Value::from("b"), Value::from("c")]);
            assert_eq!(db.select("letters", None)?, vec![Value::from("a"), Value::from("d")]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_remove_last_record_deletes_key() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            db.insert("people", doc! { name: "Jim" })?;
            db.insert("pets", doc! { name: "Rex" })?;

            db.remove("people", None)?;
            assert_eq!(db.keys()?, vec!["pets".to_string()]);

            db.flush()?;
            assert_eq!(
                ctx.file_contents()?,
                serde_json::json!({ "pets": [{ "name": "Rex" }] })
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_remove_without_match_keeps_records() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            insert_people(&db)?;

            let removed = db.remove("people", Some("$.age > 100"))?;
            assert!(removed.is_empty());
            assert_eq!(db.count("people", None)?, 3);

            assert!(db.remove("nobody", None)?.is_empty());
            Ok(())
        },
        cleanup,
    )
}
