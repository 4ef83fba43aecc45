//! Positions in a series index, addressed by number, alias or timestamp.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::str::FromStr;

/// A position in (or just past) a series index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Integer position; negative values count back from the end.
    Index(isize),
    /// The first observation.
    Start,
    /// One past the last observation.
    End,
    /// An index timestamp, or one lying whole periods after the last one.
    Timestamp(DateTime<Utc>),
}

impl Location {
    /// Resolve to a non-negative position.
    ///
    /// Positions past the end of the sample are allowed; callers decide
    /// which range is acceptable.
    pub fn resolve(&self, series: &TimeSeries) -> Result<usize> {
        let n = series.len();
        match *self {
            Location::Start => Ok(0),
            Location::End => Ok(n),
            Location::Index(i) if i >= 0 => Ok(i as usize),
            Location::Index(i) => {
                let back = i.unsigned_abs();
                if back > n {
                    Err(ForecastError::InvalidAnchor(format!(
                        "index {} is before the start of a series of length {}",
                        i, n
                    )))
                } else {
                    Ok(n - back)
                }
            }
            Location::Timestamp(ts) => series.locate(ts),
        }
    }
}

impl From<isize> for Location {
    fn from(index: isize) -> Self {
        Location::Index(index)
    }
}

impl From<DateTime<Utc>> for Location {
    fn from(ts: DateTime<Utc>) -> Self {
        Location::Timestamp(ts)
    }
}

impl FromStr for Location {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "start" => return Ok(Location::Start),
            "end" => return Ok(Location::End),
            _ => {}
        }
        if let Ok(i) = s.parse::<isize>() {
            return Ok(Location::Index(i));
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Ok(Location::Timestamp(ts.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(Location::Timestamp(naive.and_utc()));
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(Location::Timestamp(naive.and_utc()));
            }
        }
        Err(ForecastError::InvalidAnchor(format!(
            "cannot interpret '{}' as a location",
            s
        )))
    }
}
