//! # minidb - Embedded JSON Document Store
//!
//! minidb keeps collections of JSON records in memory and persists them as a
//! single JSON file. Records are queried and mutated with a small filter
//! language evaluated against each record (`$`) and its position (`#`).
//!
//! ## Quick Start
//!
//! ```rust
//! use minidb::doc;
//! use minidb::minidb::MiniDb;
//!
//! # fn main() -> minidb::errors::MiniDbResult<()> {
//! # let dir = tempfile::tempdir().unwrap();
//! # let path = dir.path().join("quickstart.json");
//! let db = MiniDb::open(&path)?;
//!
//! db.insert("people", doc! { name: "Jim", age: 27 })?;
//! db.insert("people", doc! { name: "Kim", age: 31 })?;
//!
//! let adults = db.select("people", Some("$.age >= 30 && $.name != 'Tim'"))?;
//! assert_eq!(adults.len(), 1);
//!
//! // wait for the background writer
//! db.flush()?;
//! db.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Design
//!
//! [MiniDb](crate::minidb::MiniDb) is a PIMPL handle: clones share one
//! `Arc<MiniDbInner>` holding the collections, the filter cache and the
//! persistence writer. Every mutation is applied in memory under a lock and
//! queues a snapshot of the whole database; a single writer thread saves
//! snapshots in order.
//!
//! ## Module Organization
//!
//! - [`collection`] - Documents, collection operations and write results
//! - [`common`] - The record value model
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - The filter language
//! - [`minidb`] - Core database interface
//! - [`minidb_builder`] - Database builder
//! - [`minidb_config`] - Database configuration
//! - [`registry`] - Shared handles per database file
//! - [`store`] - Storage backends and the persistence writer

pub mod collection;
pub mod common;
pub mod errors;
pub mod filter;
pub mod minidb;
pub mod minidb_builder;
pub mod minidb_config;
pub mod registry;
pub mod store;
