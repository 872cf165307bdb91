mod buffer_sizes;
mod delimited;

use crate::{DelimitedReaderOptions, DelimitedRecordReader, ReadResult, StringSource};

/// Reads every record of `input`, panicking on parse errors.
pub(crate) fn read_all(input: &str, options: DelimitedReaderOptions) -> Vec<Vec<Option<String>>> {
    let mut reader = DelimitedRecordReader::with_options(StringSource::new(input), options);
    let mut records = Vec::new();
    loop {
        match reader.read().unwrap() {
            ReadResult::Success => records.push(reader.fields().to_vec()),
            ReadResult::EndOfFile => return records,
            ReadResult::ParseError => panic!("unexpected parse error in {input:?}"),
        }
    }
}

pub(crate) fn fields(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some((*v).to_string())).collect()
}
