#![allow(clippy::struct_excessive_bools)]

//! Reader configuration.

/// Action taken when a record fails to tokenize.
///
/// Only data errors consult this policy; usage errors always panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParseErrorAction {
    /// Invoke the handler registered with
    /// [`set_parse_error_handler`](crate::DelimitedRecordReader::set_parse_error_handler)
    /// and follow the action it returns. Without a handler this behaves like
    /// [`Fail`](Self::Fail). The handler must not answer `Notify` again; doing
    /// so is a misconfiguration and panics.
    #[default]
    Notify,
    /// Discard the rest of the malformed line and keep reading; the read
    /// reports [`ReadResult::ParseError`](crate::ReadResult::ParseError).
    SkipToNextLine,
    /// Surface the error to the caller as
    /// [`ReadError::Malformed`](crate::ReadError::Malformed).
    Fail,
}

/// Action taken when a record supplies fewer fields than the schema declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MissingFieldAction {
    /// Treat the record as malformed, subject to [`ParseErrorAction`], with
    /// the error positioned at the first missing column.
    #[default]
    HandleAsParseError,
    /// Fill the missing columns with empty strings.
    ReturnEmptyValue,
    /// Fill the missing columns with nulls ([`None`]).
    ReturnNullValue,
}

/// Configuration for [`DelimitedRecordReader`](crate::DelimitedRecordReader).
///
/// # Examples
///
/// ```rust
/// use tabmodem::DelimitedReaderOptions;
///
/// let options = DelimitedReaderOptions {
///     delimiter_char: ';',
///     trim_white_spaces: false,
///     ..Default::default()
/// };
/// assert_eq!(options.quote_char, '"');
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DelimitedReaderOptions {
    /// Capacity of the sliding character buffer. The window grows on demand
    /// when a retained span would not fit, so small sizes stay correct; they
    /// just refill more often.
    ///
    /// # Default
    ///
    /// `4096`
    pub buffer_size: usize,

    /// Character separating fields within a record.
    ///
    /// # Default
    ///
    /// `,`
    pub delimiter_char: char,

    /// Character opening and closing a quoted field.
    ///
    /// # Default
    ///
    /// `"`
    pub quote_char: char,

    /// Lines starting with this character are skipped entirely.
    ///
    /// # Default
    ///
    /// `#`
    pub comment_char: char,

    /// Separator between a column name and its type tag inside a header
    /// field, e.g. `qty:int`.
    ///
    /// # Default
    ///
    /// `:`
    pub column_header_type_separator: char,

    /// Whether a doubled quote inside a quoted field stands for one literal
    /// quote character.
    ///
    /// # Default
    ///
    /// `true`
    pub double_quote_escaping_enabled: bool,

    /// Whether backslash escape sequences (`\n`, `\t`, `\uXXXX`, `\dNNNNN`,
    /// `\oNNNNNN`, ...) are decoded inside fields.
    ///
    /// # Default
    ///
    /// `false`
    pub advanced_escaping_enabled: bool,

    /// Whether whitespace around unquoted fields (and around the quotes of
    /// quoted fields) is removed.
    ///
    /// # Default
    ///
    /// `true`
    pub trim_white_spaces: bool,

    /// Whether the schema tracks the observed field count instead of a
    /// declared one: columns are added or removed to match each record.
    ///
    /// # Default
    ///
    /// `true`
    pub dynamic_column_count: bool,

    /// Whether blank lines are skipped rather than read as empty records.
    ///
    /// # Default
    ///
    /// `true`
    pub skip_empty_lines: bool,

    /// Policy for records with fewer fields than declared columns. Only
    /// consulted when [`dynamic_column_count`](Self::dynamic_column_count) is
    /// off.
    ///
    /// # Default
    ///
    /// [`MissingFieldAction::HandleAsParseError`]
    pub missing_field_action: MissingFieldAction,

    /// Policy for malformed records.
    ///
    /// # Default
    ///
    /// [`ParseErrorAction::Notify`]
    pub parse_error_action: ParseErrorAction,

    /// Prefix for generated column names: dynamically discovered columns and
    /// header fields with a blank name become `<prefix><ordinal>`.
    ///
    /// # Default
    ///
    /// `"Column"`
    pub default_column_name_prefix: String,
}

impl Default for DelimitedReaderOptions {
    fn default() -> Self {
        Self {
            buffer_size: 4096,
            delimiter_char: ',',
            quote_char: '"',
            comment_char: '#',
            column_header_type_separator: ':',
            double_quote_escaping_enabled: true,
            advanced_escaping_enabled: false,
            trim_white_spaces: true,
            dynamic_column_count: true,
            skip_empty_lines: true,
            missing_field_action: MissingFieldAction::default(),
            parse_error_action: ParseErrorAction::default(),
            default_column_name_prefix: "Column".to_string(),
        }
    }
}

/// Configuration for
/// [`FixedWidthRecordReader`](crate::FixedWidthRecordReader).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedWidthReaderOptions {
    /// Capacity of the sliding character buffer; grows on demand.
    ///
    /// # Default
    ///
    /// `4096`
    pub buffer_size: usize,

    /// Lines starting with this character are skipped entirely.
    ///
    /// # Default
    ///
    /// `#`
    pub comment_char: char,

    /// Whether blank lines are skipped rather than reported as missing
    /// fields.
    ///
    /// # Default
    ///
    /// `true`
    pub skip_empty_lines: bool,

    /// Whether consecutive records sit on a single line: the reader does not
    /// skip to the next line after the last column of a record.
    ///
    /// # Default
    ///
    /// `false`
    pub all_records_on_single_line: bool,

    /// Policy for records that end (newline or end of data) before every
    /// declared column was filled.
    ///
    /// # Default
    ///
    /// [`MissingFieldAction::HandleAsParseError`]
    pub missing_field_action: MissingFieldAction,

    /// Policy for malformed records.
    ///
    /// # Default
    ///
    /// [`ParseErrorAction::Notify`]
    pub parse_error_action: ParseErrorAction,
}

impl Default for FixedWidthReaderOptions {
    fn default() -> Self {
        Self {
            buffer_size: 4096,
            comment_char: '#',
            skip_empty_lines: true,
            all_records_on_single_line: false,
            missing_field_action: MissingFieldAction::default(),
            parse_error_action: ParseErrorAction::default(),
        }
    }
}
