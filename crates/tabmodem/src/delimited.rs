//! Reader for delimiter-separated records.

use crate::column::{DataType, RecordColumn, RecordColumns};
use crate::error::{ColumnError, MalformedRecordError, ReadError};
use crate::escape;
use crate::options::{DelimitedReaderOptions, MissingFieldAction, ParseErrorAction};
use crate::reader::{CharClasses, ReadResult, ReaderCore, RecordTokenizer};
use crate::source::CharSource;
use crate::value_builder::ValueBuilder;

/// A streaming reader for delimiter-separated (CSV-like) records.
///
/// Forward-only over any [`CharSource`]; record addressing
/// ([`move_to`](Self::move_to)) additionally works backward on seekable
/// sources. Field values live until the next read; copy out whatever must be
/// retained.
///
/// # Examples
///
/// ```rust
/// use tabmodem::{DelimitedRecordReader, ReadResult, StringSource};
///
/// let mut reader = DelimitedRecordReader::new(StringSource::new("a,b\nc,d"));
/// assert_eq!(reader.read().unwrap(), ReadResult::Success);
/// assert_eq!(reader.field(1), Some("b"));
/// assert_eq!(reader.read().unwrap(), ReadResult::Success);
/// assert_eq!(reader.field(0), Some("c"));
/// assert_eq!(reader.read().unwrap(), ReadResult::EndOfFile);
/// ```
#[derive(Debug)]
pub struct DelimitedRecordReader<S> {
    core: ReaderCore<S>,
    tokenizer: DelimitedTokenizer,
}

impl<S: CharSource> DelimitedRecordReader<S> {
    /// Creates a reader with [default options](DelimitedReaderOptions).
    pub fn new(source: S) -> Self {
        Self::with_options(source, DelimitedReaderOptions::default())
    }

    /// Creates a reader with explicit options.
    ///
    /// # Panics
    ///
    /// Panics if `options.buffer_size` is zero.
    pub fn with_options(source: S, options: DelimitedReaderOptions) -> Self {
        let DelimitedReaderOptions {
            buffer_size,
            delimiter_char,
            quote_char,
            comment_char,
            column_header_type_separator,
            double_quote_escaping_enabled,
            advanced_escaping_enabled,
            trim_white_spaces,
            dynamic_column_count,
            skip_empty_lines,
            missing_field_action,
            parse_error_action,
            default_column_name_prefix,
        } = options;

        Self {
            core: ReaderCore::new(
                source,
                buffer_size,
                CharClasses::delimited(delimiter_char),
                comment_char,
                skip_empty_lines,
                parse_error_action,
                missing_field_action,
            ),
            tokenizer: DelimitedTokenizer {
                columns: RecordColumns::new(),
                delimiter: delimiter_char,
                quote: quote_char,
                double_quote_escaping: double_quote_escaping_enabled,
                advanced_escaping: advanced_escaping_enabled,
                trim_white_spaces,
                dynamic_column_count,
                header_type_separator: column_header_type_separator,
                default_column_name_prefix,
                value: ValueBuilder::new(),
                reading_headers: false,
            },
        }
    }

    /// Reads the next record.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Malformed`] when a record fails to tokenize and
    /// the parse-error policy resolves to failing, or [`ReadError::Io`] when
    /// the source does.
    pub fn read(&mut self) -> Result<ReadResult, ReadError> {
        self.core.read(&mut self.tokenizer, true)
    }

    /// Reads the next record as column headers, replacing the schema.
    ///
    /// Each header field is `name` or `name<sep>tag` with `<sep>` the
    /// configured type separator; blank names become
    /// `<default_column_name_prefix><ordinal>`. The record index is not
    /// advanced.
    ///
    /// # Errors
    ///
    /// Besides read failures, returns [`ColumnError::UnknownTypeTag`] for an
    /// unrecognized tag and [`ColumnError::Duplicate`] for repeated names.
    pub fn read_column_headers(&mut self) -> Result<ReadResult, ReadError> {
        self.tokenizer.reading_headers = true;
        let result = self.core.read(&mut self.tokenizer, false);
        self.tokenizer.reading_headers = false;

        let result = result?;
        if result != ReadResult::Success {
            return Ok(result);
        }

        self.tokenizer.columns.clear();
        for i in 0..self.core.record.len() {
            let raw = self.core.record[i].as_deref().unwrap_or("");
            let mut parts = raw.split(self.tokenizer.header_type_separator);
            let name_part = parts.next().unwrap_or("");
            let tag = parts.next();

            let name = if name_part.trim().is_empty() {
                format!("{}{}", self.tokenizer.default_column_name_prefix, i)
            } else {
                name_part.to_string()
            };
            let column = match tag {
                None => RecordColumn::new(name),
                Some(tag) => {
                    let data_type = DataType::parse(tag)
                        .ok_or_else(|| ColumnError::UnknownTypeTag(tag.to_string()))?;
                    RecordColumn::with_type(name, data_type)
                }
            };
            self.tokenizer.columns.add(column)?;
        }
        Ok(ReadResult::Success)
    }

    /// Moves to `record_index`. Forward moves tokenize every intervening
    /// record; backward moves seek directly when a cached position exists and
    /// otherwise replay from the start of the data.
    ///
    /// # Errors
    ///
    /// Propagates failures from the reads performed along the way.
    ///
    /// # Panics
    ///
    /// Panics when `record_index` is negative, or on a backward move over a
    /// source without seek support.
    pub fn move_to(&mut self, record_index: i64) -> Result<ReadResult, ReadError> {
        self.core.move_to(&mut self.tokenizer, record_index)
    }

    /// Discards the rest of the current line. Returns whether data remains.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Io`] when the source fails.
    pub fn skip_to_next_line(&mut self) -> Result<bool, ReadError> {
        self.core.skip_to_next_line()
    }

    /// Begins caching the stream offset of each record read from now on,
    /// enabling direct backward seeks. Only useful on seekable sources.
    pub fn start_caching_record_positions(&mut self) {
        self.core.start_caching_record_positions();
    }

    /// Stops caching record offsets, optionally discarding the cache.
    pub fn stop_caching_record_positions(&mut self, clear_cache: bool) {
        self.core.stop_caching_record_positions(clear_cache);
    }

    /// Whether record positions are currently being cached.
    pub fn record_positions_cache_enabled(&self) -> bool {
        self.core.record_positions_cache_enabled()
    }

    /// Index of the current record; `-1` before the first read.
    pub fn current_record_index(&self) -> i64 {
        self.core.record_index
    }

    /// The current record's field at `column_index`; `None` is a null field.
    ///
    /// # Panics
    ///
    /// Panics when no record has been read or the index is out of range.
    pub fn field(&self, column_index: usize) -> Option<&str> {
        self.core.record[column_index].as_deref()
    }

    /// The current record's field for the named column (case-insensitive).
    ///
    /// # Panics
    ///
    /// Panics when the column does not exist or no record has been read.
    pub fn field_by_name(&self, name: &str) -> Option<&str> {
        let index = self
            .tokenizer
            .columns
            .index_of(name)
            .unwrap_or_else(|| panic!("unknown column `{name}`"));
        self.field(index)
    }

    /// All fields of the current record, in column order.
    pub fn fields(&self) -> &[Option<String>] {
        &self.core.record
    }

    /// The column schema.
    pub fn columns(&self) -> &RecordColumns<RecordColumn> {
        &self.tokenizer.columns
    }

    /// Appends a column to the schema.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::Duplicate`] for a repeated name.
    pub fn add_column(&mut self, column: RecordColumn) -> Result<(), ColumnError> {
        self.tokenizer.columns.add(column)
    }

    /// Replaces the parse-error policy.
    pub fn set_parse_error_action(&mut self, action: ParseErrorAction) {
        self.core.parse_error_action = action;
    }

    /// Replaces the missing-field policy.
    pub fn set_missing_field_action(&mut self, action: MissingFieldAction) {
        self.core.missing_field_action = action;
    }

    /// Registers the handler consulted under [`ParseErrorAction::Notify`].
    pub fn set_parse_error_handler(
        &mut self,
        handler: impl FnMut(&MalformedRecordError) -> ParseErrorAction + 'static,
    ) {
        self.core.set_parse_error_handler(Box::new(handler));
    }

    /// Consumes the reader, returning the character source.
    pub fn into_source(self) -> S {
        self.core.buffer.into_source()
    }
}

#[derive(Debug)]
struct DelimitedTokenizer {
    columns: RecordColumns<RecordColumn>,
    delimiter: char,
    quote: char,
    double_quote_escaping: bool,
    advanced_escaping: bool,
    trim_white_spaces: bool,
    dynamic_column_count: bool,
    header_type_separator: char,
    default_column_name_prefix: String,
    value: ValueBuilder,
    reading_headers: bool,
}

struct FieldOutcome {
    value: String,
    ends_with_delimiter: bool,
    malformed: bool,
}

impl DelimitedTokenizer {
    /// Extracts one field starting at the buffer position. `keep_value`
    /// controls whether the value is materialized; structure is honored
    /// either way.
    fn parse_field<S: CharSource>(
        &mut self,
        core: &mut ReaderCore<S>,
        keep_value: bool,
    ) -> Result<FieldOutcome, ReadError> {
        self.value.clear();
        let mut ends_with_delimiter = false;

        if self.trim_white_spaces && !core.skip_white_spaces()? {
            return Ok(FieldOutcome {
                value: String::new(),
                ends_with_delimiter: false,
                malformed: false,
            });
        }

        if core.buffer.current() == self.quote {
            // Quoted field: skip the opening quote, scan for the closing one.
            core.buffer.pos += 1;
            let mut start = core.buffer.pos;

            loop {
                if core.buffer.pos >= core.buffer.len {
                    if keep_value && core.buffer.pos > start {
                        self.value
                            .append_slice(&core.buffer.data, start, core.buffer.pos - start);
                    }
                    if !core.buffer.fill(0)? {
                        // The data ended while still inside the quotes.
                        return Ok(FieldOutcome {
                            value: self.value.take_string(),
                            ends_with_delimiter: false,
                            malformed: true,
                        });
                    }
                    start = 0;
                    continue;
                }

                let c = core.buffer.current();
                if c == self.quote {
                    if self.double_quote_escaping {
                        if core.buffer.pos + 1 >= core.buffer.len {
                            // The pair may straddle the window edge: flush the
                            // pending run, refill keeping the quote in place.
                            if keep_value && core.buffer.pos > start {
                                self.value.append_slice(
                                    &core.buffer.data,
                                    start,
                                    core.buffer.pos - start,
                                );
                            }
                            let keep = core.buffer.len - core.buffer.pos;
                            let obtained = core.buffer.fill(keep)?;
                            start = core.buffer.pos;
                            if !obtained {
                                // Nothing follows, so this was the closer.
                                core.buffer.pos += 1;
                                break;
                            }
                        }
                        if core.buffer.data[core.buffer.pos + 1] == self.quote {
                            // Doubled quote: one literal quote character.
                            if keep_value {
                                self.value.append_slice(
                                    &core.buffer.data,
                                    start,
                                    core.buffer.pos - start + 1,
                                );
                            }
                            core.buffer.pos += 2;
                            start = core.buffer.pos;
                            continue;
                        }
                    }
                    // Closing quote.
                    if keep_value && core.buffer.pos > start {
                        self.value
                            .append_slice(&core.buffer.data, start, core.buffer.pos - start);
                    }
                    core.buffer.pos += 1;
                    break;
                }

                if keep_value && self.advanced_escaping && c == escape::ESCAPE_CHAR {
                    // Flush first: the decoder may refill past the run.
                    if core.buffer.pos > start {
                        self.value
                            .append_slice(&core.buffer.data, start, core.buffer.pos - start);
                    }
                    match escape::decode(&mut core.buffer)? {
                        Some(decoded) => {
                            self.value.append_char(decoded);
                            start = core.buffer.pos;
                        }
                        None => {
                            // Not an escape after all: the backslash stays in
                            // the value as a literal.
                            start = core.buffer.pos;
                            core.buffer.pos += 1;
                        }
                    }
                    continue;
                }

                core.buffer.pos += 1;
            }

            if self.trim_white_spaces {
                core.skip_white_spaces()?;
            }

            // The closing quote must be followed by a delimiter or a line
            // boundary.
            if core.buffer.ensure_has_data()? {
                let c = core.buffer.current();
                if c == self.delimiter {
                    core.buffer.pos += 1;
                    ends_with_delimiter = true;
                } else if !core.classes.is_newline(c) {
                    return Ok(FieldOutcome {
                        value: self.value.take_string(),
                        ends_with_delimiter: false,
                        malformed: true,
                    });
                }
            }
        } else {
            // Unquoted field: scan to the delimiter or line boundary.
            let mut start = core.buffer.pos;

            loop {
                let c = core.buffer.current();

                if c == self.delimiter || core.classes.is_newline(c) {
                    if keep_value {
                        if self.trim_white_spaces {
                            self.append_trimmed(core, start, core.buffer.pos);
                        } else {
                            self.value
                                .append_slice(&core.buffer.data, start, core.buffer.pos - start);
                        }
                    }
                    // Only the delimiter is consumed here; a newline belongs
                    // to the record loop.
                    if c == self.delimiter {
                        core.buffer.pos += 1;
                        ends_with_delimiter = true;
                    }
                    break;
                }

                if keep_value && self.advanced_escaping && c == escape::ESCAPE_CHAR {
                    if core.buffer.pos > start {
                        self.value
                            .append_slice(&core.buffer.data, start, core.buffer.pos - start);
                    }
                    match escape::decode(&mut core.buffer)? {
                        Some(decoded) => {
                            self.value.append_char(decoded);
                            start = core.buffer.pos;
                        }
                        None => {
                            start = core.buffer.pos;
                            core.buffer.pos += 1;
                        }
                    }
                } else {
                    core.buffer.pos += 1;
                }

                if core.buffer.pos >= core.buffer.len {
                    if start == 0 {
                        // The field spans the whole window: flush it and keep
                        // scanning from a fresh fill.
                        if keep_value {
                            self.value.append_slice(&core.buffer.data, 0, core.buffer.pos);
                        }
                        start = core.buffer.len;
                    }
                    if !core.buffer.fill(core.buffer.len - start)? {
                        // End of data terminates the field.
                        if keep_value && core.buffer.len > 0 {
                            if self.trim_white_spaces {
                                self.append_trimmed(core, 0, core.buffer.pos);
                            } else {
                                self.value
                                    .append_slice(&core.buffer.data, 0, core.buffer.pos);
                            }
                        }
                        core.buffer.pos = core.buffer.len;
                        break;
                    }
                    start = 0;
                }
            }
        }

        Ok(FieldOutcome {
            value: self.value.take_string(),
            ends_with_delimiter,
            malformed: false,
        })
    }

    /// Appends `[start, end)` of the window with its trailing whitespace
    /// removed. When the span is entirely whitespace, previously accumulated
    /// content is trimmed instead.
    fn append_trimmed<S: CharSource>(&mut self, core: &ReaderCore<S>, start: usize, end: usize) {
        let mut i = end;
        while i > start && core.classes.is_whitespace(core.buffer.data[i - 1]) {
            i -= 1;
        }
        if i > start {
            self.value.append_slice(&core.buffer.data, start, i - start);
        } else {
            let classes = core.classes;
            self.value.trim_end(move |c| classes.is_whitespace(c));
        }
    }
}

impl<S: CharSource> RecordTokenizer<S> for DelimitedTokenizer {
    fn declared_column_count(&self) -> usize {
        self.columns.len()
    }

    fn read_record(&mut self, core: &mut ReaderCore<S>) -> Result<ReadResult, ReadError> {
        // Index of the last field that ended on a delimiter; tells us whether
        // a record like `a,` needs its trailing empty field.
        let mut last_delimited_field: i64 = -1;
        let mut keep_value = false;

        loop {
            if !core.buffer.ensure_has_data()? {
                break;
            }
            if core.classes.is_newline(core.buffer.current()) {
                break;
            }

            keep_value = self.dynamic_column_count
                || self.reading_headers
                || (core.record.len() < self.columns.len()
                    && !self.columns[core.record.len()].is_ignored());

            let outcome = self.parse_field(core, keep_value)?;
            if outcome.malformed {
                let error = MalformedRecordError::malformed(
                    core.snapshot(),
                    core.buffer.pos,
                    core.record_index,
                    core.record.len(),
                );
                core.handle_parse_error(error)?;
                return Ok(ReadResult::ParseError);
            }

            core.record.push(Some(outcome.value));
            if outcome.ends_with_delimiter {
                last_delimited_field = core.record.len() as i64 - 1;
            }
        }

        // A record ending on a delimiter (or an entirely empty one) carries a
        // trailing empty field.
        if (last_delimited_field == core.record.len() as i64 - 1 || core.record.is_empty())
            && keep_value
        {
            core.record.push(Some(String::new()));
        }

        if self.dynamic_column_count {
            let count = core.record.len();
            if self.columns.len() < count {
                for i in self.columns.len()..count {
                    let name = format!("{}{}", self.default_column_name_prefix, i);
                    self.columns.add(RecordColumn::new(name))?;
                }
            } else {
                self.columns.truncate(count);
            }
        } else if core.record.len() < self.columns.len() {
            match core.missing_field_action {
                MissingFieldAction::ReturnEmptyValue => {
                    while core.record.len() < self.columns.len() {
                        core.record.push(Some(String::new()));
                    }
                }
                MissingFieldAction::ReturnNullValue => {
                    while core.record.len() < self.columns.len() {
                        core.record.push(None);
                    }
                }
                MissingFieldAction::HandleAsParseError => {
                    let error = MalformedRecordError::missing_field(
                        core.snapshot(),
                        core.buffer.pos,
                        core.record_index,
                        core.record.len(),
                    );
                    core.handle_parse_error(error)?;
                    return Ok(ReadResult::ParseError);
                }
            }
        }

        if core.buffer.pos < core.buffer.len {
            core.parse_new_line()?;
        }
        Ok(ReadResult::Success)
    }
}
