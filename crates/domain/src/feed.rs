//! External feed: extraction of the identifying timestamp from a tabular export.
//!
//! The feed is CSV text. Row 0 is a header; the first column of row 1 holds
//! the timestamp of the most recent activity. The raw cell text (not the
//! parsed instant) is what deduplication compares, so two renderings of the
//! same instant count as two signals.

use chrono::{NaiveDate, NaiveDateTime};

/// Formats accepted for the timestamp cell, tried in order after RFC 3339.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// The identifying cell of the feed's newest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSignal {
    /// Cell text exactly as published (trimmed, unquoted).
    pub raw: String,
    /// The instant the cell denotes, in the feed's own (unspecified) zone.
    pub observed_at: NaiveDateTime,
}

/// Why a feed body yielded no signal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedParseError {
    #[error("feed has no data row")]
    NoDataRow,
    #[error("feed is not valid CSV: {0}")]
    Malformed(String),
    #[error("first cell of the data row is empty")]
    EmptyCell,
    #[error("first cell {0:?} is not a timestamp")]
    NotATimestamp(String),
}

/// Extract and validate the first data cell of a CSV body.
///
/// # Errors
///
/// Returns [`FeedParseError`] when the body is not CSV, there is no data
/// row, the cell is empty, or the cell does not parse as a timestamp.
pub fn parse_feed(body: &str) -> Result<FeedSignal, FeedParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());
    let record = reader
        .records()
        .next()
        .ok_or(FeedParseError::NoDataRow)?
        .map_err(|err| FeedParseError::Malformed(err.to_string()))?;

    let raw = record.get(0).unwrap_or_default().trim().to_string();
    if raw.is_empty() {
        return Err(FeedParseError::EmptyCell);
    }
    let observed_at =
        parse_cell_timestamp(&raw).ok_or_else(|| FeedParseError::NotATimestamp(raw.clone()))?;
    Ok(FeedSignal { raw, observed_at })
}

fn parse_cell_timestamp(cell: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(cell) {
        return Some(dt.naive_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(cell, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
