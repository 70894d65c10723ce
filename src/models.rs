//! Data models.

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use chrono_tz::Pacific::Auckland;
use serde::{Deserialize, Serialize};

use crate::errors::TidePublisherError;

/// One row of the tide table.
///
/// `date` is the row-header text kept verbatim apart from trimming; the
/// source labels rows with strings like `"12:01 AM"` and nothing in this
/// crate interprets them further. `value` is the tide height in metres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TideRecord {
    pub date: String,
    pub value: f64,
}

impl TideRecord {
    /// Build a record from raw row cells.
    ///
    /// The value cell must parse as a number once surrounding whitespace and
    /// a trailing `m` unit suffix are stripped; anything else is an error.
    pub fn from_cells(label: &str, text: &str) -> Result<Self, TidePublisherError> {
        Ok(Self {
            date: label.trim().to_string(),
            value: parse_height(text)?,
        })
    }
}

/// Parse a tide height like `"1.8m"` into metres.
fn parse_height(text: &str) -> Result<f64, TidePublisherError> {
    let trimmed = text.trim();
    let number = trimmed.strip_suffix('m').unwrap_or(trimmed).trim_end();
    number
        .parse::<f64>()
        .map_err(|_| TidePublisherError::InvalidHeight(text.to_string()))
}

/// The document published to the broker and persisted in the cache file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TidePayload {
    /// Fetch time rendered in the Pacific/Auckland zone, ISO-8601 with
    /// offset. Home Assistant displays this as-is.
    pub last_updated: DateTime<FixedOffset>,
    /// Tide records in source table row order. Labels need not be unique.
    pub data: Vec<TideRecord>,
}

impl TidePayload {
    /// Assemble a payload from ordered raw (label, text) row pairs, stamped
    /// with `now` rendered in the Pacific/Auckland zone.
    ///
    /// The first unparseable value aborts assembly; a payload is always
    /// complete or absent, never partial.
    pub fn from_rows(
        rows: Vec<(String, String)>,
        now: DateTime<Utc>,
    ) -> Result<Self, TidePublisherError> {
        let mut data = Vec::with_capacity(rows.len());
        for (label, text) in &rows {
            data.push(TideRecord::from_cells(label, text)?);
        }
        Ok(Self {
            last_updated: now.with_timezone(&Auckland).fixed_offset(),
            data,
        })
    }

    /// Age of the payload relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.last_updated)
    }
}
