use minidb::doc;
use minidb::errors::MiniDbResult;
use minidb::minidb::MiniDb;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::{env, fs};

/// Runs `test` between `before` and `after`.
///
/// `after` runs even when the test fails or panics, so files are cleaned up.
/// Any failure ends in a panic carrying the error and a backtrace.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: FnOnce(TestContext) -> MiniDbResult<()>,
    B: FnOnce() -> MiniDbResult<TestContext>,
    A: FnOnce(TestContext) -> MiniDbResult<()>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let backtrace = Backtrace::capture();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| test(ctx.clone())));
    let after_result = after(ctx);

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            eprintln!("\nBacktrace:\n{}", backtrace);
            panic!("Test failed: {:?}", e);
        }
        Err(panic_err) => panic::resume_unwind(panic_err),
    }

    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

#[derive(Clone)]
pub struct TestContext {
    path: String,
    db: MiniDb,
}

impl TestContext {
    pub fn new(path: String, db: MiniDb) -> Self {
        Self { path, db }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn db(&self) -> MiniDb {
        self.db.clone()
    }

    /// Closes the current handle and opens the same file again.
    pub fn reopen(&self) -> MiniDbResult<MiniDb> {
        self.db.close()?;
        MiniDb::open(&self.path)
    }

    /// The database file as parsed JSON.
    pub fn file_contents(&self) -> MiniDbResult<serde_json::Value> {
        let text = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// A fresh file path in the system temp directory.
pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    let temp_dir = env::temp_dir();
    temp_dir
        .join(format!("minidb-{}.json", id))
        .to_string_lossy()
        .to_string()
}

pub fn create_test_context() -> MiniDbResult<TestContext> {
    let path = random_path();
    let db = MiniDb::open(&path)?;
    Ok(TestContext::new(path, db))
}

pub fn cleanup(ctx: TestContext) -> MiniDbResult<()> {
    let close_result = ctx.db().close();
    remove_file(ctx.path())?;
    close_result
}

/// Removes a database file, if it exists.
pub fn remove_file(path: &str) -> MiniDbResult<()> {
    if Path::new(path).exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Inserts Jim (27), Kim (31) and Tim (45) into `people`.
pub fn insert_people(db: &MiniDb) -> MiniDbResult<()> {
    db.insert_many(
        "people",
        vec![
            doc! { name: "Jim", age: 27, city: "Oslo" },
            doc! { name: "Kim", age: 31, city: "Bergen" },
            doc! { name: "Tim", age: 45, city: "Oslo" },
        ],
    )?;
    Ok(())
}
