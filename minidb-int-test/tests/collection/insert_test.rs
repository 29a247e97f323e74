use minidb::common::Value;
use minidb::doc;
use minidb::errors::ErrorKind;
use minidb_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_insert_grows_collection_by_one() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            for i in 0..5 {
                let before = db.select("numbers", None)?;
                db.insert("numbers", doc! { n: i })?;
                let after = db.select("numbers", None)?;

                assert_eq!(after.len(), before.len() + 1);
                assert_eq!(&after[..before.len()], &before[..]);
                assert_eq!(after.last(), Some(&Value::from(doc! { n: i })));
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_any_record_shape() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            db.insert("mixed", 1)?;
            db.insert("mixed", "text")?;
            db.insert("mixed", Value::Null)?;
            db.insert("mixed", vec![1, 2, 3])?;
            db.insert("mixed", doc! { nested: { deep: [true, null] } })?;

            assert_eq!(db.count("mixed", None)?, 5);
            assert_eq!(db.select("mixed", Some("$ == 'text'"))?.len(), 1);
            assert_eq!(db.select("mixed", Some("$[1] == 2"))?.len(), 1);
            assert_eq!(db.select("mixed", Some("$.nested.deep[0]"))?.len(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_many_is_all_or_nothing() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            db.insert("readings", doc! { value: 1.5 })?;

            let result = db.insert_many(
                "readings",
                vec![
                    Value::from(doc! { value: 2.5 }),
                    Value::from(doc! { value: (f64::NAN) }),
                ],
            );
            assert_eq!(result.err().map(|e| e.kind().clone()), Some(ErrorKind::InvalidRecord));
            assert_eq!(db.count("readings", None)?, 1);

            let result = db.insert_many("readings", vec![doc! { value: 2.5 }, doc! { value: 3.5 }])?;
            assert_eq!(result.len(), 2);
            assert_eq!(db.count("readings", None)?, 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_serializable_record() {
    #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
    struct Employee {
        name: String,
        dept: String,
        salary: u32,
    }

    run_test(
        create_test_context,
        |ctx| {
            let employees = ctx.db().collection("employees");
            employees.insert_serializable(&Employee {
                name: "Jim".into(),
                dept: "sales".into(),
                salary: 4000,
            })?;
            employees.insert_serializable(&Employee {
                name: "Kim".into(),
                dept: "dev".into(),
                salary: 5000,
            })?;

            let devs: Vec<Employee> = employees.select_as(Some("$.dept == 'dev'"))?;
            assert_eq!(devs.len(), 1);
            assert_eq!(devs[0].name, "Kim");
            Ok(())
        },
        cleanup,
    )
}
