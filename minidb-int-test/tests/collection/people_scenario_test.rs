use minidb::common::Value;
use minidb::doc;
use minidb_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_people_lifecycle() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            assert_eq!(ctx.file_contents()?, serde_json::json!({}));

            let inserted = db.insert("people", doc! { name: "Jim", age: 27 })?;
            assert_eq!(inserted.affected(), &Value::from(doc! { name: "Jim", age: 27 }));

            let selected = db.select("people", Some("$.age==27"))?;
            assert_eq!(selected, vec![Value::from(doc! { name: "Jim", age: 27 })]);

            let updated = db.update("people", doc! { name: "Kim" }, Some("$.age==27"))?;
            assert_eq!(
                updated.affected(),
                &vec![Value::from(doc! { name: "Kim", age: 27 })]
            );

            let removed = db.remove("people", Some("$.age==27"))?;
            assert_eq!(
                removed.affected(),
                &vec![Value::from(doc! { name: "Kim", age: 27 })]
            );

            assert!(db.select("people", None)?.is_empty());
            db.flush()?;
            assert_eq!(ctx.file_contents()?, serde_json::json!({}));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_people_lifecycle_through_collection_handle() {
    run_test(
        create_test_context,
        |ctx| {
            let people = ctx.db().collection("people");
            people.insert(doc! { name: "Jim", age: 27 })?;
            people.insert(doc! { name: "Ann", age: 33 })?;

            people.update(doc! { name: "Kim" }, Some("$.age == 27"))?;
            people.remove(Some("$.name == 'Ann'"))?;
            ctx.db().flush()?;

            assert_eq!(
                ctx.file_contents()?,
                serde_json::json!({ "people": [{ "name": "Kim", "age": 27 }] })
            );
            Ok(())
        },
        cleanup,
    )
}
