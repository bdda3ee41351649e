//! Calendar month keys for ledger indexing and seasonal tokens

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar month (UTC), used as the ledger index, the season tag of
/// temporary tokens and the key of ranking/achievement records.
/// Deserialization rejects out-of-range months, so snapshot and config
/// data can never smuggle in a `month: 13`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "RawMonth")]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

#[derive(Deserialize)]
struct RawMonth {
    year: i32,
    month: u32,
}

impl TryFrom<RawMonth> for Month {
    type Error = String;

    fn try_from(raw: RawMonth) -> Result<Self, Self::Error> {
        if !(1..=12).contains(&raw.month) {
            return Err(format!("month out of range: {}", raw.month));
        }
        Ok(Month {
            year: raw.year,
            month: raw.month,
        })
    }
}

impl Month {
    pub fn new(year: i32, month: u32) -> Self {
        assert!((1..=12).contains(&month), "month out of range: {}", month);
        Month { year, month }
    }

    /// Month containing the given instant
    pub fn containing(at: DateTime<Utc>) -> Self {
        Month {
            year: at.year(),
            month: at.month(),
        }
    }

    /// First instant of this month
    pub fn start(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(self.year, self.month, 1, 0, 0, 0)
            .single()
            .expect("valid month start")
    }

    /// First instant of the following month (exclusive upper bound)
    pub fn end(&self) -> DateTime<Utc> {
        self.next().start()
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Month {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Month {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Month {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Month {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start() && at < self.end()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
