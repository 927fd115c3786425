//! Recipient records from a CSV export.
//!
//! # Format
//! - A fixed number of leading rows (3 in the usual export) are headers.
//! - Column 0 is the name, column 1 the achievement; extra columns are ignored.
//! - Rows with fewer than two fields, or blank in both columns, are skipped.
//! - A row with a blank name continues the previous record's achievement on a
//!   new line. With no previous record it is dropped.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_HEADER_ROWS: usize = 3;

#[derive(Debug, Error)]
pub enum CsvSourceError {
    #[error("Failed to read CSV file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse CSV file: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub name: String,
    pub achievement: String,
}

impl CertificateRecord {
    pub fn new(name: impl Into<String>, achievement: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            achievement: achievement.into(),
        }
    }
}

/// Reads records from a CSV file on disk.
pub fn load_records(
    path: impl AsRef<Path>,
    header_rows: usize,
) -> Result<Vec<CertificateRecord>, CsvSourceError> {
    let file = std::fs::File::open(path.as_ref())?;
    parse_records(file, header_rows)
}

/// Reads records from any CSV source. A leading UTF-8 BOM is ignored.
pub fn parse_records<R: Read>(
    mut source: R,
    header_rows: usize,
) -> Result<Vec<CertificateRecord>, CsvSourceError> {
    let mut raw = String::new();
    source.read_to_string(&mut raw)?;
    let data = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records().skip(header_rows) {
        let record = record?;
        if record.len() < 2 {
            continue;
        }
        rows.push((record[0].to_string(), record[1].to_string()));
    }
    Ok(merge_rows(rows))
}

/// Applies the skip and continuation rules to raw `(name, achievement)` rows.
pub fn merge_rows<I>(rows: I) -> Vec<CertificateRecord>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut records: Vec<CertificateRecord> = Vec::new();
    for (name, achievement) in rows {
        let name = name.trim();
        let achievement = achievement.trim();
        if name.is_empty() && achievement.is_empty() {
            continue;
        }

        if !name.is_empty() {
            records.push(CertificateRecord::new(name, achievement));
        } else if let Some(previous) = records.last_mut() {
            previous.achievement.push('\n');
            previous.achievement.push_str(achievement);
        } else {
            debug!(achievement, "Continuation row before any named row; dropped");
        }
    }
    records
}
