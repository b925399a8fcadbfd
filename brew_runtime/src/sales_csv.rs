//! Sales file reader.
//!
//! Rows are returned as raw positional fields; the kernel decides what
//! is a header and what is malformed.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use brew_engine::error::EngineError;

use crate::error::BrewError;

/// Read every row of the CSV at `path`.
pub fn read_sales_file(path: &Path) -> Result<Vec<Vec<String>>, BrewError> {
    let file = File::open(path).map_err(|e| BrewError::io(path, e))?;
    Ok(read_sales_rows(file)?)
}

/// Read every row from `reader`. No header row is assumed and rows may
/// differ in length. Invalid UTF-8 is `MalformedInput`.
pub fn read_sales_rows<R: Read>(reader: R) -> Result<Vec<Vec<String>>, EngineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| EngineError::MalformedInput {
            line: e
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(i + 1),
            row: String::new(),
            reason: e.to_string(),
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}
