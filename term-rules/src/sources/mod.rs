//! Input materialization: turning raw tabular text into dataset rows.
//!
//! The engine only consumes [`Row`](crate::core::Row) values; these helpers
//! are a convenience for callers holding CSV text or files.

pub mod csv;

pub use self::csv::{parse_csv, parse_csv_with_options, read_csv, CsvOptions};
