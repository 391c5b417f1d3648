//! Delimited-text record IO.
//!
//! One record per line, fields separated by [`FIELD_DELIMITER`] in a fixed
//! order decided by the entity codec. Quoting and escaping follow the csv
//! conventions, so field values may themselves contain the delimiter.

use crate::error::{CodecError, CodecResult};
use std::io::{Read, Write};

/// The field separator used by the delimited-text format.
pub const FIELD_DELIMITER: u8 = b',';

/// Reads every delimited record from the source.
///
/// An empty source yields an empty vector.
///
/// # Errors
///
/// Returns a decode error for unreadable or structurally invalid input.
pub fn read_delimited<R: Read>(source: R) -> CodecResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(FIELD_DELIMITER)
        .flexible(true)
        .from_reader(source);
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| CodecError::decode(format!("delimited record: {e}")))?;
        records.push(row.iter().map(str::to_string).collect());
    }
    Ok(records)
}

/// Writes delimited records to the sink, one per line.
///
/// # Errors
///
/// Returns an encode error if a record cannot be written or flushed.
pub fn write_delimited<W: Write>(sink: W, records: &[Vec<String>]) -> CodecResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(FIELD_DELIMITER)
        .from_writer(sink);
    for record in records {
        writer
            .write_record(record)
            .map_err(|e| CodecError::encode(format!("delimited record: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| CodecError::encode(format!("delimited flush: {e}")))?;
    Ok(())
}
