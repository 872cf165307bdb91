//! The sequence of field values must not depend on the window size: any
//! configuration that parses at 1024 characters parses identically at 1.

use rstest::rstest;

use super::{fields, read_all};
use crate::{
    DelimitedReaderOptions, FixedWidthColumn, FixedWidthReaderOptions, FixedWidthRecordReader,
    ReadResult, StringSource,
};

#[rstest]
#[case(1)]
#[case(9)]
#[case(39)]
#[case(166)]
#[case(1024)]
fn delimited_values_are_invariant(#[case] buffer_size: usize) {
    let options = DelimitedReaderOptions {
        buffer_size,
        ..Default::default()
    };
    let input = "alpha,beta,gamma\n\"Bob said, \"\"Hey!\"\"\",two, three \nlast,,\n";
    let records = read_all(input, options);
    assert_eq!(
        records,
        vec![
            fields(&["alpha", "beta", "gamma"]),
            fields(&["Bob said, \"Hey!\"", "two", "three"]),
            fields(&["last", "", ""]),
        ]
    );
}

#[rstest]
#[case(1)]
#[case(9)]
#[case(39)]
#[case(166)]
#[case(1024)]
fn escaped_values_are_invariant(#[case] buffer_size: usize) {
    let options = DelimitedReaderOptions {
        buffer_size,
        advanced_escaping_enabled: true,
        ..Default::default()
    };
    let input = "a\\tb,\"c\\u0041d\",plain\nnext,\\\\,end\n";
    let records = read_all(input, options);
    assert_eq!(
        records,
        vec![
            fields(&["a\tb", "cAd", "plain"]),
            fields(&["next", "\\", "end"]),
        ]
    );
}

#[rstest]
#[case(1)]
#[case(9)]
#[case(39)]
#[case(166)]
#[case(1024)]
fn fixed_width_values_are_invariant(#[case] buffer_size: usize) {
    let options = FixedWidthReaderOptions {
        buffer_size,
        ..Default::default()
    };
    let mut reader = FixedWidthRecordReader::with_options(
        StringSource::new("123123412345\nab c   d    "),
        options,
    );
    reader.add_column(FixedWidthColumn::new("a", 0, 3)).unwrap();
    reader.add_column(FixedWidthColumn::new("b", 3, 4)).unwrap();
    reader.add_column(FixedWidthColumn::new("c", 7, 5)).unwrap();

    assert_eq!(reader.read().unwrap(), ReadResult::Success);
    assert_eq!(reader.fields(), fields(&["123", "1234", "12345"]));
    assert_eq!(reader.read().unwrap(), ReadResult::Success);
    assert_eq!(reader.fields(), fields(&["ab", "c", "d"]));
    assert_eq!(reader.read().unwrap(), ReadResult::EndOfFile);
}
