//! Shared record-reading machinery.
//!
//! [`ReaderCore`] owns the sliding buffer, the current record, the record
//! index, comment/blank-line skipping, the parse-error policy, and the
//! record-addressing protocol. The two tokenizers plug into it through the
//! [`RecordTokenizer`] strategy trait: the core drives the per-record loop
//! and delegates field extraction.

use std::fmt;

use crate::buffer::CharBuffer;
use crate::error::{MalformedRecordError, ReadError};
use crate::options::{MissingFieldAction, ParseErrorAction};
use crate::source::CharSource;

/// Outcome of one read operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReadResult {
    /// One record was tokenized into the current record.
    Success,
    /// No data remains; repeated reads keep returning this.
    EndOfFile,
    /// The record was malformed and the error policy chose to recover.
    ParseError,
}

/// Character classification shared between the core's line handling and the
/// tokenizers. The delimited tokenizer exempts its delimiter so that exotic
/// configurations (tab or newline delimiters) do not confuse line or
/// whitespace handling.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CharClasses {
    delimiter: Option<char>,
}

impl CharClasses {
    pub(crate) fn plain() -> Self {
        Self { delimiter: None }
    }

    pub(crate) fn delimited(delimiter: char) -> Self {
        Self {
            delimiter: Some(delimiter),
        }
    }

    pub(crate) fn is_newline(self, c: char) -> bool {
        Some(c) != self.delimiter && (c == '\r' || c == '\n')
    }

    pub(crate) fn is_whitespace(self, c: char) -> bool {
        Some(c) != self.delimiter && (c == ' ' || c == '\t')
    }
}

/// Field-extraction strategy plugged into [`ReaderCore`].
pub(crate) trait RecordTokenizer<S: CharSource> {
    /// Number of columns the record is padded to after tokenization.
    fn declared_column_count(&self) -> usize;

    /// Tokenizes one record from the buffer into `core.record`.
    fn read_record(&mut self, core: &mut ReaderCore<S>) -> Result<ReadResult, ReadError>;
}

pub(crate) type ParseErrorHandler = Box<dyn FnMut(&MalformedRecordError) -> ParseErrorAction>;

pub(crate) struct ReaderCore<S> {
    pub(crate) buffer: CharBuffer<S>,
    pub(crate) record: Vec<Option<String>>,
    pub(crate) record_index: i64,
    pub(crate) classes: CharClasses,
    pub(crate) comment_char: char,
    pub(crate) skip_empty_lines: bool,
    pub(crate) parse_error_action: ParseErrorAction,
    pub(crate) missing_field_action: MissingFieldAction,
    parse_error_handler: Option<ParseErrorHandler>,
    caching_positions: bool,
    position_cache: Vec<u64>,
    cache_index_offset: i64,
}

impl<S> fmt::Debug for ReaderCore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderCore")
            .field("record_index", &self.record_index)
            .field("record", &self.record)
            .field("caching_positions", &self.caching_positions)
            .finish_non_exhaustive()
    }
}

impl<S: CharSource> ReaderCore<S> {
    pub(crate) fn new(
        source: S,
        buffer_size: usize,
        classes: CharClasses,
        comment_char: char,
        skip_empty_lines: bool,
        parse_error_action: ParseErrorAction,
        missing_field_action: MissingFieldAction,
    ) -> Self {
        // No point holding a window larger than the whole source.
        let capacity = match source.len() {
            Some(len) if len > 0 => buffer_size.min(usize::try_from(len).unwrap_or(usize::MAX)),
            _ => buffer_size,
        };
        Self {
            buffer: CharBuffer::new(source, capacity),
            record: Vec::with_capacity(16),
            record_index: -1,
            classes,
            comment_char,
            skip_empty_lines,
            parse_error_action,
            missing_field_action,
            parse_error_handler: None,
            caching_positions: false,
            position_cache: Vec::new(),
            cache_index_offset: 0,
        }
    }

    pub(crate) fn set_parse_error_handler(&mut self, handler: ParseErrorHandler) {
        self.parse_error_handler = Some(handler);
    }

    /// Reads the next record, skipping comment and (optionally) blank lines.
    pub(crate) fn read<T: RecordTokenizer<S>>(
        &mut self,
        tokenizer: &mut T,
        increment_record_index: bool,
    ) -> Result<ReadResult, ReadError> {
        if !self.buffer.ensure_has_data()? {
            return Ok(ReadResult::EndOfFile);
        }
        if !self.skip_empty_and_commented_lines()? {
            return Ok(ReadResult::EndOfFile);
        }

        if increment_record_index {
            self.record_index += 1;
            if self.caching_positions {
                self.capture_record_position();
            }
        }

        self.record.clear();
        let result = tokenizer.read_record(self)?;

        while self.record.len() < tokenizer.declared_column_count() {
            self.record.push(None);
        }

        Ok(result)
    }

    /// Caches the stream offset of the record about to be tokenized, when it
    /// is the next uncached one.
    fn capture_record_position(&mut self) {
        let Some(position) = self.buffer.source_position() else {
            return;
        };
        let index = self.record_index - self.cache_index_offset;
        if index >= 0 && index as u64 == self.position_cache.len() as u64 {
            self.position_cache.push(position);
        }
    }

    /// Moves to `record_index`, tokenizing every record along the way when
    /// moving forward, or seeking/replaying when moving backward.
    ///
    /// # Panics
    ///
    /// Panics when `record_index` is negative, or when moving backward on a
    /// source without seek support.
    pub(crate) fn move_to<T: RecordTokenizer<S>>(
        &mut self,
        tokenizer: &mut T,
        record_index: i64,
    ) -> Result<ReadResult, ReadError> {
        assert!(record_index >= 0, "record index must not be negative");

        if record_index == self.record_index {
            return Ok(ReadResult::Success);
        }

        if record_index < self.record_index {
            assert!(
                self.buffer.source_is_seekable(),
                "cannot move to a previous record on a forward-only source"
            );

            let cache_slot = record_index - self.cache_index_offset;
            if self.caching_positions
                && cache_slot >= 0
                && (cache_slot as u64) < self.position_cache.len() as u64
            {
                let position = self.position_cache[usize::try_from(cache_slot).expect("checked")];
                self.buffer.seek(position);
                self.record_index = record_index - 1;
                return self.read(tokenizer, true);
            }

            // No cached offset: rescan from the top of the data.
            self.stop_caching_record_positions(true);
            self.buffer.seek(0);
            self.record_index = -1;

            let mut result = ReadResult::Success;
            for _ in 0..=record_index {
                result = self.read(tokenizer, true)?;
                if result == ReadResult::EndOfFile {
                    return Ok(ReadResult::EndOfFile);
                }
            }
            return Ok(result);
        }

        let mut remaining = record_index - self.record_index;
        loop {
            let result = self.read(tokenizer, true)?;
            if result == ReadResult::EndOfFile {
                return Ok(ReadResult::EndOfFile);
            }
            remaining -= 1;
            if remaining == 0 {
                return Ok(result);
            }
        }
    }

    /// Begins capturing the stream offset of each subsequently read record.
    pub(crate) fn start_caching_record_positions(&mut self) {
        self.caching_positions = true;
        self.position_cache.clear();
        self.cache_index_offset = self.record_index + 1;
    }

    /// Stops capturing record offsets, optionally discarding those already
    /// captured.
    pub(crate) fn stop_caching_record_positions(&mut self, clear_cache: bool) {
        self.caching_positions = false;
        if clear_cache {
            self.position_cache.clear();
            self.cache_index_offset = self.record_index + 1;
        }
    }

    pub(crate) fn record_positions_cache_enabled(&self) -> bool {
        self.caching_positions
    }

    /// Consumes one line terminator at the current position, treating `\r\n`
    /// as a single terminator.
    pub(crate) fn parse_new_line(&mut self) -> Result<bool, ReadError> {
        if self.buffer.ensure_has_data()? {
            let c = self.buffer.current();
            if c == '\r' && self.classes.is_newline(c) {
                self.buffer.pos += 1;
                if self.buffer.ensure_has_data()? && self.buffer.current() == '\n' {
                    self.buffer.pos += 1;
                }
                return Ok(true);
            } else if c == '\n' {
                self.buffer.pos += 1;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Scans forward to the next line, consuming its terminator. Returns
    /// whether data remains.
    pub(crate) fn skip_to_next_line(&mut self) -> Result<bool, ReadError> {
        loop {
            let mut i = self.buffer.pos;
            while i < self.buffer.len {
                if self.classes.is_newline(self.buffer.data[i]) {
                    self.buffer.pos = i;
                    self.parse_new_line()?;
                    return Ok(self.buffer.ensure_has_data()?);
                }
                i += 1;
            }
            self.buffer.pos = self.buffer.len;
            if !self.buffer.fill(0)? {
                return Ok(false);
            }
        }
    }

    /// Skips comment lines and, when configured, blank lines. Returns whether
    /// data remains.
    pub(crate) fn skip_empty_and_commented_lines(&mut self) -> Result<bool, ReadError> {
        while self.buffer.ensure_has_data()? {
            if self.buffer.current() == self.comment_char {
                self.buffer.pos += 1;
                self.skip_to_next_line()?;
            } else if self.skip_empty_lines && self.parse_new_line()? {
                continue;
            } else {
                break;
            }
        }
        Ok(self.buffer.ensure_has_data()?)
    }

    /// Skips whitespace at the current position, refilling as needed. Returns
    /// whether data remains.
    pub(crate) fn skip_white_spaces(&mut self) -> Result<bool, ReadError> {
        loop {
            let mut i = self.buffer.pos;
            while i < self.buffer.len {
                if !self.classes.is_whitespace(self.buffer.data[i]) {
                    self.buffer.pos = i;
                    return Ok(self.buffer.ensure_has_data()?);
                }
                i += 1;
            }
            self.buffer.pos = self.buffer.len;
            if !self.buffer.fill(0)? {
                return Ok(false);
            }
        }
    }

    /// Dispatches a tokenization failure through the configured policy.
    ///
    /// `Ok(())` means the error was recovered (the malformed line was
    /// skipped); the read then reports [`ReadResult::ParseError`].
    ///
    /// # Panics
    ///
    /// Panics when the registered handler answers
    /// [`ParseErrorAction::Notify`], which would recurse.
    pub(crate) fn handle_parse_error(
        &mut self,
        error: MalformedRecordError,
    ) -> Result<(), ReadError> {
        let action = match self.parse_error_action {
            ParseErrorAction::Notify => match self.parse_error_handler.as_mut() {
                Some(handler) => handler(&error),
                None => ParseErrorAction::Fail,
            },
            action => action,
        };

        match action {
            ParseErrorAction::Fail => Err(error.into()),
            ParseErrorAction::SkipToNextLine => {
                self.skip_to_next_line()?;
                Ok(())
            }
            ParseErrorAction::Notify => {
                panic!("parse error handler must not request Notify from within itself")
            }
        }
    }

    /// Snapshot of the buffer window for error reporting.
    pub(crate) fn snapshot(&self) -> String {
        self.buffer.data[..self.buffer.len].iter().collect()
    }
}
