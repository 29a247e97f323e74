use minidb::doc;
use minidb::store::WriteTicket;
use minidb_int_test::test_util::{cleanup, create_test_context, run_test};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_file_matches_memory_after_flush() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            for i in 0..200 {
                db.insert("events", doc! { seq: i })?;
                if i % 3 == 0 {
                    db.update("events", doc! { tagged: true }, Some(format!("$.seq == {}", i).as_str()))?;
                }
                if i % 10 == 9 {
                    db.remove("events", Some("# == 0"))?;
                }
            }
            db.flush()?;

            let events = db.select("events", None)?;
            let expected = serde_json::json!({ "events": events });
            assert_eq!(ctx.file_contents()?, expected);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_every_ticket_completes() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let completed = Arc::new(AtomicUsize::new(0));

            let mut tickets: Vec<WriteTicket> = Vec::new();
            for i in 0..50 {
                let result = db.insert("numbers", i)?;
                let counter = completed.clone();
                result.ticket().on_complete(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
                tickets.push(result.ticket().clone());
            }

            awaitility::at_most(Duration::from_secs(10))
                .until(|| completed.load(Ordering::SeqCst) == 50);

            for ticket in tickets {
                assert!(ticket.is_complete());
                ticket.wait()?;
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_close_drains_pending_writes() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let results: Vec<_> = (0..100)
                .map(|i| db.insert("numbers", i))
                .collect::<Result<_, _>>()?;

            db.close()?;
            for result in results {
                assert!(result.ticket().try_result().is_some());
            }

            let numbers = ctx.file_contents()?["numbers"].as_array().map(|a| a.len());
            assert_eq!(numbers, Some(100));
            Ok(())
        },
        cleanup,
    )
}
