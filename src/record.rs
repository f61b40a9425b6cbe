//! Timestamped numeric readings keyed by a partition label.
//!
//! This is the item type the reference pipeline moves through the buffer; the
//! buffer itself never inspects it.  On the wire a record is one JSON line
//! with three **textual** fields:
//!
//! ```json
//! {"datetime":"2024-05-01 10:11:12.123456.654321","value":"42","partition":"eu-1"}
//! ```
//!
//! In memory the value is an `i64` and the timestamp a shape-validated text
//! field; re-encoding reproduces the input byte for byte.  No calendar
//! arithmetic is ever performed on the timestamp, so it stays the original
//! fixed fractional-seconds text (one or two dot-separated fraction groups of
//! up to six digits).

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// A validated `YYYY-MM-DD HH:MM:SS.ffffff[.ffffff]` timestamp, kept as the
/// original text so it round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Timestamp(String);

impl Timestamp {
    /// Validates `text` against the fixed fractional-seconds shape.
    pub fn parse(text: &str) -> Result<Self, RecordError> {
        if is_valid_timestamp(text) {
            Ok(Timestamp(text.to_owned()))
        } else {
            Err(RecordError::BadTimestamp(text.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Timestamp {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timestamp::parse(s)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn in_range(s: &str, lo: u32, hi: u32) -> bool {
    matches!(s.parse::<u32>(), Ok(v) if (lo..=hi).contains(&v))
}

fn is_valid_timestamp(text: &str) -> bool {
    let Some((date, time)) = text.split_once(' ') else {
        return false;
    };

    // Date: YYYY-MM-DD with calendar-plausible fields.
    let date_parts: Vec<&str> = date.split('-').collect();
    let [year, month, day] = date_parts.as_slice() else {
        return false;
    };
    if year.len() != 4 || month.len() != 2 || day.len() != 2 {
        return false;
    }
    if !all_digits(year) || !in_range(month, 1, 12) || !in_range(day, 1, 31) {
        return false;
    }

    // Time: HH:MM:SS followed by one or two fraction groups.
    let (clock, fraction) = match time.split_once('.') {
        Some((c, f)) => (c, Some(f)),
        None => (time, None),
    };
    let clock_parts: Vec<&str> = clock.split(':').collect();
    let [hour, minute, second] = clock_parts.as_slice() else {
        return false;
    };
    if hour.len() != 2 || minute.len() != 2 || second.len() != 2 {
        return false;
    }
    if !in_range(hour, 0, 23) || !in_range(minute, 0, 59) || !in_range(second, 0, 59) {
        return false;
    }

    match fraction {
        None => true,
        Some(f) => {
            let groups: Vec<&str> = f.split('.').collect();
            groups.len() <= 2 && groups.iter().all(|g| all_digits(g) && g.len() <= 6)
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Wire form of a record: three textual fields, value included.
#[derive(Serialize, Deserialize)]
struct RawRecord {
    datetime: String,
    value: String,
    partition: String,
}

/// One decoded reading: a timestamp, an integer value and a partition label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord", into = "RawRecord")]
pub struct Record {
    pub timestamp: Timestamp,
    pub value: i64,
    pub partition: String,
}

impl Record {
    pub fn new(timestamp: Timestamp, value: i64, partition: impl Into<String>) -> Self {
        Record {
            timestamp,
            value,
            partition: partition.into(),
        }
    }
}

impl TryFrom<RawRecord> for Record {
    type Error = RecordError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let timestamp = Timestamp::parse(&raw.datetime)?;
        let value = raw.value.parse::<i64>().map_err(|source| RecordError::BadValue {
            text: raw.value.clone(),
            source,
        })?;
        Ok(Record {
            timestamp,
            value,
            partition: raw.partition,
        })
    }
}

impl From<Record> for RawRecord {
    fn from(record: Record) -> Self {
        RawRecord {
            datetime: record.timestamp.0,
            value: record.value.to_string(),
            partition: record.partition,
        }
    }
}
