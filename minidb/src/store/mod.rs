//! Persistence of the database snapshot.
//!
//! The whole database is persisted as one snapshot of its [Collections].
//! Storage is abstracted behind [StorageProvider]:
//! - [JsonFileStorage] writes a single JSON file, replacing it on every save.
//! - [InMemoryStorage] keeps the snapshot in memory, for tests and ephemeral
//!   databases.
//!
//! Saves go through a [PersistenceWriter], which applies them one at a time
//! in mutation order on a background thread and reports each outcome through
//! a [WriteTicket].

mod collections;
mod json_file;
mod memory;
mod storage;
mod writer;

pub use collections::*;
pub use json_file::*;
pub use memory::*;
pub use storage::*;
pub use writer::*;
