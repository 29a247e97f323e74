use minidb::doc;
use minidb::errors::MiniDbResult;
use minidb_int_test::test_util::{cleanup, create_test_context};

fn main() -> MiniDbResult<()> {
    colog::init();
    println!("Starting stress test...");
    let ctx = create_test_context()?;
    let db = ctx.db();

    let count = 10_000;
    let start = std::time::Instant::now();
    for i in 0..count {
        db.insert(
            "records",
            doc! {
                first_name: (uuid::Uuid::new_v4().to_string()),
                last_name: (uuid::Uuid::new_v4().to_string()),
                seq: i,
                processed: false,
                failed: (i % 10 == 0),
            },
        )?;
    }
    db.flush()?;
    println!("Inserted {} records in {:?}", count, start.elapsed());

    let start = std::time::Instant::now();
    let failed = db.count("records", Some("$.failed"))?;
    println!("Counted {} failed records in {:?}", failed, start.elapsed());

    let start = std::time::Instant::now();
    let updated = db.update("records", doc! { processed: true }, Some("!$.failed"))?;
    db.flush()?;
    println!("Updated {} records in {:?}", updated.len(), start.elapsed());

    let start = std::time::Instant::now();
    let removed = db.remove("records", Some("$.failed"))?;
    db.flush()?;
    println!("Removed {} records in {:?}", removed.len(), start.elapsed());

    cleanup(ctx)
}
