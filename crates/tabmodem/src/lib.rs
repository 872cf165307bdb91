//! Streaming, buffer-oriented readers for tabular text: delimiter-separated
//! (CSV-like) and fixed-width records.
//!
//! Both readers pull characters through a fixed-size sliding window, so
//! memory usage stays flat no matter how large the input is, and fields that
//! fit the window materialize with a single allocation. Reading is
//! forward-only by default; on seekable sources records can be re-addressed
//! backward, directly when their positions were cached and by replaying
//! otherwise.
//!
//! ```rust
//! use tabmodem::{DelimitedRecordReader, ReadResult, StringSource};
//!
//! let source = StringSource::new("name,qty:int\nwidget,2\nsprocket,7\n");
//! let mut reader = DelimitedRecordReader::new(source);
//! reader.read_column_headers().unwrap();
//!
//! let mut total = 0;
//! while reader.read().unwrap() == ReadResult::Success {
//!     total += reader.field_by_name("qty").unwrap().parse::<i32>().unwrap();
//! }
//! assert_eq!(total, 9);
//! ```
#![allow(missing_docs)]

mod buffer;
mod column;
mod delimited;
mod error;
mod escape;
mod fixed_width;
mod options;
mod reader;
mod source;
mod value_builder;

#[cfg(test)]
mod tests;

pub use column::{
    ColumnAlignment, DataType, FixedWidthColumn, NamedColumn, RecordColumn, RecordColumns,
};
pub use delimited::DelimitedRecordReader;
pub use error::{ColumnError, MalformedRecordError, MalformedRecordKind, ReadError};
pub use fixed_width::FixedWidthRecordReader;
pub use options::{
    DelimitedReaderOptions, FixedWidthReaderOptions, MissingFieldAction, ParseErrorAction,
};
pub use reader::ReadResult;
pub use source::{CharSource, StringSource, Utf8CharReader};
