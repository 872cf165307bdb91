use super::{fields, read_all};
use crate::{
    CharSource, DelimitedReaderOptions, DelimitedRecordReader, MissingFieldAction, ReadResult,
    RecordColumn, StringSource,
};

#[test]
fn reads_one_success_per_record_then_end_of_file() {
    let mut reader = DelimitedRecordReader::new(StringSource::new("a,b\nc,d"));
    assert_eq!(reader.read().unwrap(), ReadResult::Success);
    assert_eq!(reader.fields(), fields(&["a", "b"]));
    assert_eq!(reader.read().unwrap(), ReadResult::Success);
    assert_eq!(reader.fields(), fields(&["c", "d"]));
    assert_eq!(reader.read().unwrap(), ReadResult::EndOfFile);
    // End of file is sticky.
    assert_eq!(reader.read().unwrap(), ReadResult::EndOfFile);
}

#[test]
fn empty_input_is_end_of_file() {
    let mut reader = DelimitedRecordReader::new(StringSource::new(""));
    assert_eq!(reader.read().unwrap(), ReadResult::EndOfFile);
}

#[test]
fn record_index_counts_successful_reads() {
    let mut reader = DelimitedRecordReader::new(StringSource::new("a\nb\n"));
    assert_eq!(reader.current_record_index(), -1);
    reader.read().unwrap();
    assert_eq!(reader.current_record_index(), 0);
    reader.read().unwrap();
    assert_eq!(reader.current_record_index(), 1);
}

#[test]
fn trailing_delimiter_yields_a_trailing_empty_field() {
    let records = read_all("a,\nb,c", DelimitedReaderOptions::default());
    assert_eq!(records, vec![fields(&["a", ""]), fields(&["b", "c"])]);
}

#[test]
fn comment_lines_are_skipped() {
    let input = "# heading\na,b\n# middle\nc,d\n";
    let records = read_all(input, DelimitedReaderOptions::default());
    assert_eq!(records, vec![fields(&["a", "b"]), fields(&["c", "d"])]);
}

#[test]
fn comment_character_is_configurable() {
    let options = DelimitedReaderOptions {
        comment_char: ';',
        ..Default::default()
    };
    let records = read_all("; note\na,b\n", options);
    assert_eq!(records, vec![fields(&["a", "b"])]);
}

#[test]
fn blank_lines_are_skipped_by_default() {
    let records = read_all("00\n\n10", DelimitedReaderOptions::default());
    assert_eq!(records, vec![fields(&["00"]), fields(&["10"])]);
}

#[test]
fn blank_lines_become_empty_records_when_not_skipped() {
    let options = DelimitedReaderOptions {
        skip_empty_lines: false,
        dynamic_column_count: false,
        missing_field_action: MissingFieldAction::ReturnEmptyValue,
        ..Default::default()
    };
    let mut reader = DelimitedRecordReader::with_options(StringSource::new("00\n\n10"), options);
    reader.add_column(RecordColumn::new("value")).unwrap();

    assert_eq!(reader.read().unwrap(), ReadResult::Success);
    assert_eq!(reader.field(0), Some("00"));
    assert_eq!(reader.read().unwrap(), ReadResult::Success);
    assert_eq!(reader.field(0), Some(""));
    assert_eq!(reader.read().unwrap(), ReadResult::Success);
    assert_eq!(reader.field(0), Some("10"));
    assert_eq!(reader.read().unwrap(), ReadResult::EndOfFile);
}

#[test]
fn whitespace_is_trimmed_around_unquoted_fields() {
    let records = read_all(" a ,\tb \nx,y", DelimitedReaderOptions::default());
    assert_eq!(records, vec![fields(&["a", "b"]), fields(&["x", "y"])]);
}

#[test]
fn whitespace_is_kept_when_trimming_is_off() {
    let options = DelimitedReaderOptions {
        trim_white_spaces: false,
        ..Default::default()
    };
    let records = read_all(" a , b ", options);
    assert_eq!(records, vec![fields(&[" a ", " b "])]);
}

#[test]
fn quoted_fields_may_contain_delimiters_and_newlines() {
    let records = read_all("\"a,b\",c\n\"x\ny\",z", DelimitedReaderOptions::default());
    assert_eq!(records, vec![fields(&["a,b", "c"]), fields(&["x\ny", "z"])]);
}

#[test]
fn doubled_quotes_round_trip() {
    let records = read_all("\"Bob said, \"\"Hey!\"\"\"", DelimitedReaderOptions::default());
    assert_eq!(records, vec![fields(&["Bob said, \"Hey!\""])]);
}

#[test]
fn quotes_are_literal_when_doubling_is_disabled() {
    let options = DelimitedReaderOptions {
        double_quote_escaping_enabled: false,
        ..Default::default()
    };
    // The field ends at the first closing quote.
    let records = read_all("\"ab\",c", options);
    assert_eq!(records, vec![fields(&["ab", "c"])]);
}

#[test]
fn quoted_fields_are_trimmed_outside_the_quotes_only() {
    let records = read_all("  \" a \"  ,x", DelimitedReaderOptions::default());
    assert_eq!(records, vec![fields(&[" a ", "x"])]);
}

#[test]
fn delimiter_is_configurable() {
    let options = DelimitedReaderOptions {
        delimiter_char: ';',
        ..Default::default()
    };
    let records = read_all("a;b\nc;d", options);
    assert_eq!(records, vec![fields(&["a", "b"]), fields(&["c", "d"])]);
}

#[test]
fn carriage_return_line_feed_is_one_terminator() {
    let records = read_all("a,b\r\nc,d\rx,y", DelimitedReaderOptions::default());
    assert_eq!(
        records,
        vec![fields(&["a", "b"]), fields(&["c", "d"]), fields(&["x", "y"])]
    );
}

#[test]
fn dynamic_column_count_tracks_each_record() {
    let mut reader = DelimitedRecordReader::new(StringSource::new("a,b,c\nd,e\n"));
    reader.read().unwrap();
    assert_eq!(reader.columns().len(), 3);
    reader.read().unwrap();
    assert_eq!(reader.columns().len(), 2);
    assert_eq!(reader.fields(), fields(&["d", "e"]));
}

#[test]
fn ignored_columns_keep_their_slot_but_not_their_value() {
    let options = DelimitedReaderOptions {
        dynamic_column_count: false,
        ..Default::default()
    };
    let mut reader = DelimitedRecordReader::with_options(StringSource::new("1,secret,3"), options);
    reader.add_column(RecordColumn::new("a")).unwrap();
    reader.add_column(RecordColumn::new("b").ignored()).unwrap();
    reader.add_column(RecordColumn::new("c")).unwrap();

    assert_eq!(reader.read().unwrap(), ReadResult::Success);
    assert_eq!(reader.field(0), Some("1"));
    assert_eq!(reader.field(1), Some(""));
    assert_eq!(reader.field(2), Some("3"));
}

#[test]
fn final_record_without_newline_is_read() {
    let records = read_all("a,b\nc,d", DelimitedReaderOptions::default());
    assert_eq!(records.len(), 2);
    assert_eq!(records[1], fields(&["c", "d"]));
}

#[test]
fn fields_outlive_only_until_the_next_read() {
    let mut reader = DelimitedRecordReader::new(StringSource::new("a,b\nc,d"));
    reader.read().unwrap();
    let copied: Vec<Option<String>> = reader.fields().to_vec();
    reader.read().unwrap();
    assert_eq!(copied, fields(&["a", "b"]));
    assert_eq!(reader.fields(), fields(&["c", "d"]));
}

#[test]
fn source_can_be_borrowed_rather_than_owned() {
    let mut source = StringSource::new("a,b");
    {
        let mut reader = DelimitedRecordReader::new(&mut source);
        reader.read().unwrap();
        assert_eq!(reader.field(0), Some("a"));
    }
    // The reader released the borrow; the source is ours again.
    assert!(source.position().is_some());
}

#[test]
fn into_source_returns_the_underlying_source() {
    let mut reader = DelimitedRecordReader::new(StringSource::new("a,b"));
    reader.read().unwrap();
    let source = reader.into_source();
    assert_eq!(source.position(), Some(3));
}
