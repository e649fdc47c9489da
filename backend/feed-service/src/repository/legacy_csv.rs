//! Import of the `posts.csv` file kept by the first Firebox release
//!
//! That file has a header row `username,content,timestamp,likes,comments,image_path`
//! and standard CSV quoting, so cells may hold commas, quotes and newlines.
//! Each record maps onto the first six columns of a `Row`; the codec treats
//! the absent trailing columns as a legacy record.

use crate::error::{FeedError, FeedResult};

use super::codec::{column, Row};

/// Number of columns the legacy layout fills
const LEGACY_WIDTH: usize = column::IMAGE_REF + 1;

/// Map a legacy header name to its row column; unknown headers are skipped
fn column_for(header: &str) -> Option<usize> {
    match header.trim() {
        "username" => Some(column::AUTHOR),
        "content" => Some(column::CONTENT),
        "timestamp" => Some(column::CREATED_AT),
        "likes" => Some(column::LIKE_COUNT),
        "comments" => Some(column::COMMENTS),
        "image_path" => Some(column::IMAGE_REF),
        _ => None,
    }
}

/// Parse the whole legacy file into rows, in file order
pub fn parse(raw: &str) -> FeedResult<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let targets: Vec<Option<usize>> = reader
        .headers()
        .map_err(corrupt)?
        .iter()
        .map(column_for)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(corrupt)?;
        let mut row = vec![String::new(); LEGACY_WIDTH];
        for (cell, target) in record.iter().zip(&targets) {
            if let Some(idx) = target {
                row[*idx] = cell.to_string();
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

fn corrupt(err: csv::Error) -> FeedError {
    FeedError::Corrupt {
        line: err.position().map(|p| p.line() as usize).unwrap_or(0),
        reason: err.to_string(),
    }
}
