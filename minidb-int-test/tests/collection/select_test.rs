use minidb::common::Value;
use minidb::doc;
use minidb::errors::ErrorKind;
use minidb_int_test::test_util::{cleanup, create_test_context, insert_people, run_test};

fn names(records: &[Value]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.get("name").and_then(|n| n.as_str()).map(String::from))
        .collect()
}

#[test]
fn test_select_by_record_fields() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            insert_people(&db)?;

            assert_eq!(names(&db.select("people", Some("$.age > 30"))?), vec!["Kim", "Tim"]);
            assert_eq!(
                names(&db.select("people", Some("$.city == 'Oslo' && $.age < 40"))?),
                vec!["Jim"]
            );
            assert_eq!(
                names(&db.select("people", Some("$.name == 'Jim' || $.name == \"Tim\""))?),
                vec!["Jim", "Tim"]
            );
            assert_eq!(names(&db.select("people", Some("!($.city == 'Oslo')"))?), vec!["Kim"]);
            assert!(db.select("people", Some("$.missing == 1"))?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_select_by_position() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            insert_people(&db)?;

            assert_eq!(names(&db.select("people", Some("# == 0"))?), vec!["Jim"]);
            assert_eq!(names(&db.select("people", Some("# >= 1"))?), vec!["Kim", "Tim"]);
            assert_eq!(names(&db.select("people", Some("# == 1 || $.age == 45"))?), vec!["Kim", "Tim"]);
            assert!(db.select("people", Some("# == 3"))?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_empty_filter_matches_everything() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            insert_people(&db)?;

            let all = db.select("people", None)?;
            assert_eq!(all.len(), 3);
            assert_eq!(db.select("people", Some(""))?, all);
            assert_eq!(db.select("people", Some("   "))?, all);
            assert_eq!(db.select("people", None)?, all);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_select_unknown_key_is_empty() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            assert!(db.select("nobody", None)?.is_empty());
            assert!(db.select("nobody", Some("$.a == 1"))?.is_empty());
            assert!(!db.contains_key("nobody")?);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_selected_records_are_independent() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            db.insert("people", doc! { name: "Jim", address: { city: "Oslo" } })?;

            let mut records = db.select("people", None)?;
            if let Some(person) = records[0].as_document_mut() {
                person.put("name", "Changed");
                if let Some(address) = person.get_mut("address").and_then(|a| a.as_document_mut()) {
                    address.put("city", "Nowhere");
                }
            }

            let fresh = db.select("people", None)?;
            assert_eq!(fresh[0], Value::from(doc! { name: "Jim", address: { city: "Oslo" } }));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_select_reports_parse_error_offset() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            insert_people(&db)?;

            let err = db.select("people", Some("$.age >")).err();
            let err = err.ok_or("expected a parse error")?;
            assert_eq!(err.kind(), &ErrorKind::ParseError);
            assert!(err.message().contains("offset 7"), "{}", err.message());

            let err = db.select("people", Some("$.age @ 3")).err();
            let err = err.ok_or("expected a parse error")?;
            assert_eq!(err.kind(), &ErrorKind::ParseError);
            assert!(err.message().contains("offset 6"), "{}", err.message());
            Ok(())
        },
        cleanup,
    )
}
