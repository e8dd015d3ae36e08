//! CSV output of harvested series
//!
//! The whole table is rendered and written in one go, replacing any
//! previous file at the same path.

use std::fs;
use std::io;
use std::path::Path;

use crate::data::{Column, SeriesRecord};

/// Renders records as CSV with a header row
///
/// With `with_index` a leading column of 0-based row numbers is added under
/// an empty header cell.
pub fn to_csv(records: &[SeriesRecord], columns: &[Column], with_index: bool) -> String {
    let mut output = String::new();

    let header: Vec<&str> = columns.iter().map(|c| c.name()).collect();
    if with_index {
        output.push(',');
    }
    output.push_str(&header.join(","));
    output.push('\n');

    for (row, record) in records.iter().enumerate() {
        if with_index {
            output.push_str(&row.to_string());
            output.push(',');
        }
        let fields: Vec<String> = columns
            .iter()
            .map(|&column| escape_csv(record.field(column)))
            .collect();
        output.push_str(&fields.join(","));
        output.push('\n');
    }

    output
}

/// Writes records to `path`, overwriting it
pub fn write_csv(
    path: &Path,
    records: &[SeriesRecord],
    columns: &[Column],
    with_index: bool,
) -> io::Result<()> {
    fs::write(path, to_csv(records, columns, with_index))
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
