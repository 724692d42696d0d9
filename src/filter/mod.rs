//! Client-side filter expressions for log records
//!
//! RouterOS ignores or mishandles the `where` parameter of `/log/print`, so
//! filtering happens here, over the fetched snapshot.
//!
//! # Syntax
//!
//! ```text
//! field~"value"        contains
//! field~i"value"       contains, ignoring case
//! field="value"        exact equality
//! A and B              both
//! A or B               either; `or` binds looser than `and`
//! ```
//!
//! Supported fields are `topics` and `message`. A clause that cannot be read
//! (unknown field, unknown operator, missing literal, empty part) is treated
//! as a match and reported through the diagnostic sink. Text after the
//! closing quote is ignored. Only an odd number of quotes fails the whole
//! expression, in which case nothing is filtered.
//!
//! # Examples
//!
//! ```text
//! topics~"system"
//! message~"deassigned" and topics~"info"
//! topics~"dhcp" or topics~"system"
//! topics~i"SYSTEM"
//! topics="system,info"
//! ```

pub mod error;
pub mod matcher;
pub mod parser;

pub use error::FilterParseError;
pub use matcher::{apply, filter_records};
pub use parser::{conjoin, Clause, Field, FilterExpression, Operator};
