//! Reader for fixed-width records.

use crate::column::{ColumnAlignment, FixedWidthColumn, RecordColumns};
use crate::error::{ColumnError, MalformedRecordError, ReadError};
use crate::options::{FixedWidthReaderOptions, MissingFieldAction, ParseErrorAction};
use crate::reader::{CharClasses, ReadResult, ReaderCore, RecordTokenizer};
use crate::source::CharSource;
use crate::value_builder::ValueBuilder;

/// A streaming reader extracting fields by column offset and width.
///
/// Columns may be declared in any order and need not be contiguous; gaps
/// between them are skipped. Values are addressed by declaration order.
///
/// # Examples
///
/// ```rust
/// use tabmodem::{FixedWidthColumn, FixedWidthRecordReader, ReadResult, StringSource};
///
/// let mut reader = FixedWidthRecordReader::new(StringSource::new("AB123\nCD456"));
/// reader.add_column(FixedWidthColumn::new("code", 0, 2)).unwrap();
/// reader.add_column(FixedWidthColumn::new("qty", 2, 3)).unwrap();
/// assert_eq!(reader.read().unwrap(), ReadResult::Success);
/// assert_eq!(reader.field_by_name("qty"), Some("123"));
/// assert_eq!(reader.read().unwrap(), ReadResult::Success);
/// assert_eq!(reader.field(0), Some("CD"));
/// assert_eq!(reader.read().unwrap(), ReadResult::EndOfFile);
/// ```
#[derive(Debug)]
pub struct FixedWidthRecordReader<S> {
    core: ReaderCore<S>,
    tokenizer: FixedWidthTokenizer,
}

impl<S: CharSource> FixedWidthRecordReader<S> {
    /// Creates a reader with [default options](FixedWidthReaderOptions).
    pub fn new(source: S) -> Self {
        Self::with_options(source, FixedWidthReaderOptions::default())
    }

    /// Creates a reader with explicit options.
    ///
    /// # Panics
    ///
    /// Panics if `options.buffer_size` is zero.
    pub fn with_options(source: S, options: FixedWidthReaderOptions) -> Self {
        let FixedWidthReaderOptions {
            buffer_size,
            comment_char,
            skip_empty_lines,
            all_records_on_single_line,
            missing_field_action,
            parse_error_action,
        } = options;

        Self {
            core: ReaderCore::new(
                source,
                buffer_size,
                CharClasses::plain(),
                comment_char,
                skip_empty_lines,
                parse_error_action,
                missing_field_action,
            ),
            tokenizer: FixedWidthTokenizer {
                columns: RecordColumns::new(),
                sorted: Vec::new(),
                sorted_dirty: false,
                all_records_on_single_line,
                value: ValueBuilder::new(),
            },
        }
    }

    /// Reads the next record.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Malformed`] when the record ends before every
    /// column was filled and the policies resolve to failing, or
    /// [`ReadError::Io`] when the source does.
    ///
    /// # Panics
    ///
    /// Panics when no columns have been defined.
    pub fn read(&mut self) -> Result<ReadResult, ReadError> {
        self.core.read(&mut self.tokenizer, true)
    }

    /// Moves to `record_index`; see
    /// [`DelimitedRecordReader::move_to`](crate::DelimitedRecordReader::move_to).
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

    /// Begins caching the stream offset of each record read from now on.
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

    /// The current record's field at `column_index` (declaration order).
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

    /// All fields of the current record, in declaration order.
    pub fn fields(&self) -> &[Option<String>] {
        &self.core.record
    }

    /// The column schema, in declaration order.
    pub fn columns(&self) -> &RecordColumns<FixedWidthColumn> {
        &self.tokenizer.columns
    }

    /// Appends a column to the schema.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::Duplicate`] for a repeated name.
    pub fn add_column(&mut self, column: FixedWidthColumn) -> Result<(), ColumnError> {
        self.tokenizer.sorted_dirty = true;
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

    /// Registers the handler consulted under
    /// [`ParseErrorAction::Notify`](crate::ParseErrorAction::Notify).
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
struct FixedWidthTokenizer {
    columns: RecordColumns<FixedWidthColumn>,
    /// Column indices ordered by starting position; traversal order.
    sorted: Vec<usize>,
    sorted_dirty: bool,
    all_records_on_single_line: bool,
    value: ValueBuilder,
}

impl FixedWidthTokenizer {
    fn sort_columns(&mut self) {
        self.sorted.clear();
        self.sorted.extend(0..self.columns.len());
        let columns = &self.columns;
        self.sorted
            .sort_by_key(|&index| columns[index].starting_position());
        self.sorted_dirty = false;
    }

    /// Resolves a record that ended before `sorted_index`'s column was
    /// filled: every remaining column gets the policy value, or the whole
    /// record becomes a parse error.
    fn handle_missing_field<S: CharSource>(
        &mut self,
        core: &mut ReaderCore<S>,
        sorted_index: usize,
    ) -> Result<ReadResult, ReadError> {
        let fill_value = match core.missing_field_action {
            MissingFieldAction::ReturnEmptyValue => Some(String::new()),
            MissingFieldAction::ReturnNullValue => None,
            MissingFieldAction::HandleAsParseError => {
                let error = MalformedRecordError::missing_field(
                    core.snapshot(),
                    core.buffer.pos,
                    core.record_index,
                    self.sorted[sorted_index],
                );
                core.handle_parse_error(error)?;
                return Ok(ReadResult::ParseError);
            }
        };

        for &column_index in &self.sorted[sorted_index..] {
            core.record[column_index] = fill_value.clone();
        }

        if !self.all_records_on_single_line {
            core.skip_to_next_line()?;
        }
        Ok(ReadResult::Success)
    }
}

impl<S: CharSource> RecordTokenizer<S> for FixedWidthTokenizer {
    fn declared_column_count(&self) -> usize {
        self.columns.len()
    }

    fn read_record(&mut self, core: &mut ReaderCore<S>) -> Result<ReadResult, ReadError> {
        assert!(
            !self.columns.is_empty(),
            "fixed-width reading requires at least one column"
        );
        if self.sorted_dirty {
            self.sort_columns();
        }

        for _ in 0..self.columns.len() {
            core.record.push(None);
        }

        let mut previous: Option<usize> = None;
        for sorted_index in 0..self.sorted.len() {
            let column_index = self.sorted[sorted_index];
            let (starting_position, width) = {
                let column = &self.columns[column_index];
                (column.starting_position(), column.width())
            };
            self.value.clear();

            // Gap between this column and the end of the previous one.
            let mut to_skip = match previous {
                None => 0,
                Some(prev) => {
                    let prev = &self.columns[prev];
                    starting_position.saturating_sub(prev.starting_position() + prev.width())
                }
            };

            let mut remaining = width + to_skip;
            while remaining > 0 {
                if core.buffer.pos >= core.buffer.len && !core.buffer.fill(0)? {
                    return self.handle_missing_field(core, sorted_index);
                }

                let delta = remaining.min(core.buffer.len - core.buffer.pos);
                for i in core.buffer.pos..core.buffer.pos + delta {
                    if core.classes.is_newline(core.buffer.data[i]) {
                        return self.handle_missing_field(core, sorted_index);
                    }
                }

                if delta > to_skip {
                    self.value
                        .append_slice(&core.buffer.data, core.buffer.pos + to_skip, delta - to_skip);
                }
                core.buffer.pos += delta;
                remaining -= delta;
                to_skip = to_skip.saturating_sub(delta);
            }

            let mut value = self.value.take_string();
            let column = &self.columns[column_index];
            if column.trims_padding() {
                value = trim_padding(
                    value,
                    column.padding(),
                    column.value_alignment(),
                    column.min_width(),
                );
            }
            core.record[column_index] = Some(value);
            previous = Some(column_index);
        }

        if !self.all_records_on_single_line {
            core.skip_to_next_line()?;
        }
        Ok(ReadResult::Success)
    }
}

/// Removes padding from the alignment-appropriate side, never leaving fewer
/// than `minimum_width` characters of content.
fn trim_padding(
    mut value: String,
    padding: char,
    alignment: ColumnAlignment,
    minimum_width: usize,
) -> String {
    let total = value.chars().count();
    match alignment {
        ColumnAlignment::Left => {
            let content = value.trim_end_matches(padding).chars().count();
            let keep = content.max(minimum_width).min(total);
            if keep < total {
                let cut = value
                    .char_indices()
                    .nth(keep)
                    .map_or(value.len(), |(offset, _)| offset);
                value.truncate(cut);
            }
            value
        }
        ColumnAlignment::Right => {
            let content = value.trim_start_matches(padding).chars().count();
            let keep = content.max(minimum_width).min(total);
            if keep < total {
                let cut = value
                    .char_indices()
                    .nth(total - keep)
                    .map_or(value.len(), |(offset, _)| offset);
                value = value.split_off(cut);
            }
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::trim_padding;
    use crate::column::ColumnAlignment;

    #[test]
    fn left_alignment_trims_trailing_padding() {
        let trimmed = trim_padding("ab   ".to_string(), ' ', ColumnAlignment::Left, 0);
        assert_eq!(trimmed, "ab");
    }

    #[test]
    fn right_alignment_trims_leading_padding() {
        let trimmed = trim_padding("000042".to_string(), '0', ColumnAlignment::Right, 0);
        assert_eq!(trimmed, "42");
    }

    #[test]
    fn minimum_width_bounds_the_trim() {
        let trimmed = trim_padding("ab   ".to_string(), ' ', ColumnAlignment::Left, 4);
        assert_eq!(trimmed, "ab  ");
        let trimmed = trim_padding("000042".to_string(), '0', ColumnAlignment::Right, 4);
        assert_eq!(trimmed, "0042");
    }

    #[test]
    fn all_padding_trims_to_empty() {
        let trimmed = trim_padding("    ".to_string(), ' ', ColumnAlignment::Left, 0);
        assert_eq!(trimmed, "");
    }
}
