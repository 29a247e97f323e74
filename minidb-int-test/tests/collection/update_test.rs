use minidb::common::Value;
use minidb::doc;
use minidb::errors::ErrorKind;
use minidb_int_test::test_util::{cleanup, create_test_context, insert_people, run_test};

#[test]
fn test_update_keeps_unmatched_fields() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            db.insert("people", doc! { name: "Jim", age: 27 })?;

            let updated = db.update("people", doc! { name: "Kim" }, Some("$.age==27"))?;
            assert_eq!(updated.len(), 1);
            assert_eq!(
                db.select("people", None)?,
                vec![Value::from(doc! { name: "Kim", age: 27 })]
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_is_shallow() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            db.insert("people", doc! { name: "Jim", address: { city: "Oslo", zip: "0150" } })?;

            db.update("people", doc! { address: { city: "Bergen" }, active: true }, None)?;
            assert_eq!(
                db.select("people", None)?,
                vec![Value::from(doc! { name: "Jim", address: { city: "Bergen" }, active: true })]
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_by_position_and_field() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            insert_people(&db)?;

            let updated = db.update("people", doc! { vip: true }, Some("# == 2 || $.name == 'Jim'"))?;
            assert_eq!(updated.len(), 2);
            assert_eq!(db.count("people", Some("$.vip"))?, 2);
            assert_eq!(db.count("people", Some("$.vip == undefined"))?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_non_document_records_are_replaced() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            db.insert_many("values", vec![Value::from(1), Value::from("two")])?;

            db.update("values", 3, Some("$ == 1"))?;
            assert_eq!(db.select("values", None)?, vec![Value::from(3), Value::from("two")]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_unknown_key_is_empty() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let updated = db.update("nobody", doc! { a: 1 }, None)?;
            assert!(updated.is_empty());
            updated.persisted()?;
            assert!(!db.contains_key("nobody")?);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_rejects_invalid_patch_before_mutating() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            insert_people(&db)?;

            let err = db.update("people", doc! { age: (f64::INFINITY) }, None).err();
            assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::InvalidRecord));

            let err = db.update("people", doc! { age: 1 }, Some("$.age ==")).err();
            assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::ParseError));

            assert_eq!(db.count("people", Some("$.age == 1"))?, 0);
            Ok(())
        },
        cleanup,
    )
}
