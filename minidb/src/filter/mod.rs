//! Filter expressions for selecting records from collections.
//!
//! A filter is a small boolean expression evaluated once per record. It is
//! parsed into an expression tree and walked by an interpreter; filter text is
//! never executed as code.
//!
//! # Syntax
//!
//! - `$` is the record being tested, `#` is its position in the collection.
//! - Paths navigate into the record: `$.address.city`, `$.tags[0]`,
//!   `$["first name"]`.
//! - Comparisons: `==`, `!=`, `<`, `<=`, `>`, `>=` (`===` and `!==` are
//!   accepted as spellings of `==` and `!=`).
//! - Logic: `&&`, `||`, `!` and parentheses. `&&` binds tighter than `||`.
//! - Literals: numbers (`42`, `-2.5`, `1e3`), single or double quoted strings,
//!   `true`, `false`, `null` and `undefined`.
//! - A bare operand is tested for truthiness: `$.active`, `!$.deleted`.
//!
//! Comparisons cannot be chained (`1 < $.a < 3` is rejected); combine them
//! with `&&` instead.
//!
//! ```text
//! expr       := or
//! or         := and ( "||" and )*
//! and        := unary ( "&&" unary )*
//! unary      := "!" unary | comparison
//! comparison := operand ( cmp_op operand )?
//! operand    := path | literal | "(" expr ")"
//! path       := ( "$" | "#" ) ( "." IDENT | "[" ( INTEGER | STRING ) "]" )*
//! ```
//!
//! # Semantics
//!
//! - A path that does not exist evaluates to `undefined`. `undefined` equals
//!   only `undefined`; in particular it is not equal to `null`.
//! - Values of different kinds are never equal and never ordered: `"1" == 1`
//!   and `"1" < 2` are both false. Integers and floats compare numerically.
//! - Ordering is defined between two numbers, two strings or two booleans.
//!   Every other comparison with `<`, `<=`, `>`, `>=` is false.
//! - Arrays and documents are equal when their contents are equal.
//! - `undefined`, `null`, `false`, `0` and `""` are falsy, everything else is
//!   truthy.
//!
//! # Examples
//!
//! ```rust
//! use minidb::doc;
//! use minidb::common::Value;
//! use minidb::filter::Filter;
//!
//! let record = Value::from(doc! { name: "Jim", age: 27, tags: ["admin"] });
//!
//! assert!(Filter::parse("$.name == 'Jim'").unwrap().matches(&record, 0));
//! assert!(Filter::parse("$.tags[0] == 'admin' && # < 5").unwrap().matches(&record, 3));
//! assert!(Filter::parse("$.email == undefined").unwrap().matches(&record, 0));
//! assert!(!Filter::parse("$.age == '27'").unwrap().matches(&record, 0));
//! ```

mod ast;
mod cache;
mod eval;
mod filter;
mod lexer;
mod parser;

pub use cache::*;
pub use filter::*;

use crate::errors::{ErrorKind, MiniDbError};

/// Default limit on the nesting of `!` and parentheses in a filter.
pub const DEFAULT_MAX_FILTER_DEPTH: usize = 64;

/// Default number of compiled filters kept by a store.
pub const DEFAULT_FILTER_CACHE_CAPACITY: usize = 256;

pub(crate) fn parse_error(message: &str, offset: usize) -> MiniDbError {
    log::error!("Invalid filter: {} at offset {}", message, offset);
    MiniDbError::new(
        &format!("{} at offset {}", message, offset),
        ErrorKind::ParseError,
    )
}
