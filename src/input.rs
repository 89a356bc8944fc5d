// src/input.rs

use crate::error::InputError;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Reads the non-blank values of `column` from a CSV file with a header row.
pub fn read_repo_urls(csv_path: &Path, column: &str) -> Result<Vec<String>, InputError> {
    let file = File::open(csv_path).map_err(|source| InputError::Io {
        path: csv_path.to_path_buf(),
        source,
    })?;
    read_repo_urls_from(file, column)
}

pub fn read_repo_urls_from<R: Read>(reader: R, column: &str) -> Result<Vec<String>, InputError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();
    let index = headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| InputError::ColumnNotFound {
            column: column.to_string(),
            available: headers.iter().map(str::to_string).collect(),
        })?;

    let mut urls = Vec::new();
    for record in reader.records() {
        let record = record?;
        let url = record.get(index).map(str::trim).unwrap_or_default();
        if !url.is_empty() {
            urls.push(url.to_string());
        }
    }
    Ok(urls)
}
