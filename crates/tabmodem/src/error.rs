//! Error taxonomy.
//!
//! Data errors ([`MalformedRecordError`]) are the only ones subject to the
//! configurable [`ParseErrorAction`](crate::ParseErrorAction) policy. Usage
//! errors, programmer mistakes such as seeking backward on a forward-only
//! source, panic immediately and are documented on the methods that raise
//! them.

use std::fmt;
use std::io;

use thiserror::Error;

/// Distinguishes a structural violation from its missing-field
/// specialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedRecordKind {
    /// The record violates the format structurally, e.g. a quoted field is
    /// followed by characters that are neither delimiter nor newline.
    Malformed,
    /// A declared column has no corresponding data in the record.
    MissingField,
}

impl fmt::Display for MalformedRecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => f.write_str("malformed record"),
            Self::MissingField => f.write_str("missing record field"),
        }
    }
}

/// A record that could not be tokenized.
///
/// Carries the raw buffer snapshot and the exact failure coordinates so the
/// caller can diagnose or log precisely.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} at record {record_index}, column {column_index} (buffer position {position})")]
pub struct MalformedRecordError {
    /// Whether this is a general structural violation or a missing field.
    pub kind: MalformedRecordKind,
    /// Snapshot of the buffer window content when the error occurred.
    pub buffer: String,
    /// Position inside the buffer snapshot.
    pub position: usize,
    /// Index of the record being read.
    pub record_index: i64,
    /// Index of the column being read.
    pub column_index: usize,
}

impl MalformedRecordError {
    pub(crate) fn malformed(
        buffer: String,
        position: usize,
        record_index: i64,
        column_index: usize,
    ) -> Self {
        Self {
            kind: MalformedRecordKind::Malformed,
            buffer,
            position,
            record_index,
            column_index,
        }
    }

    pub(crate) fn missing_field(
        buffer: String,
        position: usize,
        record_index: i64,
        column_index: usize,
    ) -> Self {
        Self {
            kind: MalformedRecordKind::MissingField,
            buffer,
            position,
            record_index,
            column_index,
        }
    }

    /// Whether the error is the missing-field specialization.
    pub fn is_missing_field(&self) -> bool {
        self.kind == MalformedRecordKind::MissingField
    }
}

/// Failure to define a column.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ColumnError {
    /// A column with the same case-insensitive name already exists.
    #[error("duplicate column name `{0}`")]
    Duplicate(String),
    /// A column-header type tag did not match any known alias.
    #[error("unrecognized column type tag `{0}`")]
    UnknownTypeTag(String),
}

/// Any failure surfaced by a read operation.
#[derive(Debug, Error)]
pub enum ReadError {
    /// A record could not be tokenized and the error policy said to fail.
    #[error(transparent)]
    Malformed(#[from] MalformedRecordError),
    /// Column headers could not be turned into a schema.
    #[error(transparent)]
    Column(#[from] ColumnError),
    /// The character source failed.
    #[error("character source error: {0}")]
    Io(#[from] io::Error),
}
