//! Documents and record collections.
//!
//! # Documents
//!
//! A [Document] is an ordered map from field names to
//! [Value](crate::common::Value)s, the JSON object of the record model. The
//! [doc!](crate::doc) macro builds one with JSON-like syntax.
//!
//! ```rust
//! use minidb::doc;
//!
//! let jim = doc! {
//!     name: "Jim",
//!     age: 27,
//!     address: { city: "Oslo" },
//!     tags: ["admin", "dev"],
//! };
//! assert_eq!(jim.size(), 4);
//! ```
//!
//! # Collections
//!
//! Records are grouped under string keys into ordered collections. A
//! [Collection] is a handle bound to one key; the same operations are
//! available on [MiniDb](crate::minidb::MiniDb) with the key as the first
//! argument.
//!
//! - `insert` appends records.
//! - `select` returns copies of the records matching a filter.
//! - `update` shallow-merges a patch into the records matching a filter.
//! - `remove` deletes the records matching a filter; a collection left empty
//!   is deleted.
//!
//! Mutations return a [WriteResult] with the affected records and the
//! ticket of the persistence write they queued.

mod collection;
mod document;
pub(crate) mod operations;
mod write_result;

pub use collection::*;
pub use document::*;
pub use write_result::*;
