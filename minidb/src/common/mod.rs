//! Shared record model.

mod value;

pub(crate) use value::compare_numbers;
pub use value::Value;
