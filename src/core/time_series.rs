//! TimeSeries data structure for representing temporal data.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Timelike, Utc};
use std::collections::HashMap;

/// Layout of multivariate data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueLayout {
    /// Each inner vector is a dimension (column-major).
    #[default]
    Column,
    /// Each inner vector is an observation across dimensions (row-major).
    Row,
}

/// Spacing between consecutive observations.
///
/// Calendar-month spacing is kept separate from fixed durations so that
/// monthly, quarterly and annual data step to the right day of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// A fixed wall-clock step.
    Fixed(Duration),
    /// A step of whole calendar months.
    Monthly {
        months: u32,
        /// Observations sit on the last day of their month.
        month_end: bool,
    },
}

impl Frequency {
    /// Monthly frequency anchored on the same day of month.
    pub fn months(months: u32) -> Self {
        Frequency::Monthly {
            months,
            month_end: false,
        }
    }

    /// Quarterly frequency anchored on the same day of month.
    pub fn quarterly() -> Self {
        Self::months(3)
    }

    /// Move `steps` periods away from `from` (negative steps go back).
    pub fn advance(&self, from: DateTime<Utc>, steps: i64) -> Result<DateTime<Utc>> {
        let out_of_range =
            || ForecastError::TimestampError(format!("{} periods from {} is out of range", steps, from));

        match *self {
            Frequency::Fixed(step) => {
                let factor = i32::try_from(steps).map_err(|_| out_of_range())?;
                let delta = step.checked_mul(factor).ok_or_else(out_of_range)?;
                from.checked_add_signed(delta).ok_or_else(out_of_range)
            }
            Frequency::Monthly { months, month_end } => {
                let total = (months as i64)
                    .checked_mul(steps)
                    .ok_or_else(out_of_range)?;
                let span = u32::try_from(total.unsigned_abs()).map_err(|_| out_of_range())?;
                let shifted = if total >= 0 {
                    from.checked_add_months(Months::new(span))
                } else {
                    from.checked_sub_months(Months::new(span))
                }
                .ok_or_else(out_of_range)?;

                if month_end {
                    last_day_of_month(shifted).ok_or_else(out_of_range)
                } else {
                    Ok(shifted)
                }
            }
        }
    }

    /// Whole periods from `from` up to `to`, rounded down.
    ///
    /// `None` when `to` precedes `from` or the gap does not fit the
    /// arithmetic. Whether `to` lies exactly on the grid is left to the
    /// caller.
    pub fn periods_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Option<u64> {
        if to < from {
            return None;
        }
        match *self {
            Frequency::Fixed(step) => {
                let step = step.num_nanoseconds().filter(|&ns| ns > 0)?;
                let gap = (to - from).num_nanoseconds()?;
                u64::try_from(gap / step).ok()
            }
            Frequency::Monthly { months, .. } => {
                if months == 0 {
                    return None;
                }
                let month_index = |t: &DateTime<Utc>| t.year() as i64 * 12 + t.month0() as i64;
                let gap = month_index(&to) - month_index(&from);
                u64::try_from(gap / months as i64).ok()
            }
        }
    }

    /// Conventional number of periods in one seasonal cycle.
    ///
    /// Monthly data maps to 12, quarterly to 4, annual to 1, weekly to 52,
    /// daily to 7, hourly to 24 and minutely or secondly to 60.
    pub fn seasonal_periods(&self) -> Option<usize> {
        match *self {
            Frequency::Monthly { months, .. } => {
                if months > 0 && 12 % months == 0 {
                    Some((12 / months) as usize)
                } else {
                    None
                }
            }
            Frequency::Fixed(step) => {
                if step == Duration::weeks(1) {
                    Some(52)
                } else if step == Duration::days(1) {
                    Some(7)
                } else if step == Duration::hours(1) {
                    Some(24)
                } else if step == Duration::minutes(1) || step == Duration::seconds(1) {
                    Some(60)
                } else {
                    None
                }
            }
        }
    }
}

fn last_day_of_month(ts: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let (year, month) = if ts.month() == 12 {
        (ts.year() + 1, 1)
    } else {
        (ts.year(), ts.month() + 1)
    };
    let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first_of_next.pred_opt()?;
    let naive = last.and_hms_nano_opt(ts.hour(), ts.minute(), ts.second(), ts.nanosecond())?;
    Some(Utc.from_utc_datetime(&naive))
}

fn is_month_end(ts: &DateTime<Utc>) -> bool {
    ts.date_naive()
        .succ_opt()
        .map(|next| next.month() != ts.month())
        .unwrap_or(false)
}

/// A time series with timestamps and values.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    /// Values stored in column-major format: values[dimension][observation]
    values: Vec<Vec<f64>>,
    frequency: Option<Frequency>,
    /// The index was generated for bare values and carries no calendar meaning.
    synthetic_index: bool,
}

impl TimeSeries {
    /// Create a new TimeSeries from timestamps and values in the given layout.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<Vec<f64>>,
        layout: ValueLayout,
    ) -> Result<Self> {
        // Validate timestamps are strictly increasing
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(ForecastError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        let values = match layout {
            ValueLayout::Column => {
                for series in &values {
                    if series.len() != timestamps.len() {
                        return Err(ForecastError::DimensionMismatch {
                            expected: timestamps.len(),
                            got: series.len(),
                        });
                    }
                }
                values
            }
            ValueLayout::Row => {
                if values.len() != timestamps.len() {
                    return Err(ForecastError::DimensionMismatch {
                        expected: timestamps.len(),
                        got: values.len(),
                    });
                }

                let dims = values.first().map(|row| row.len()).unwrap_or(0);
                for row in &values {
                    if row.len() != dims {
                        return Err(ForecastError::DimensionMismatch {
                            expected: dims,
                            got: row.len(),
                        });
                    }
                }

                // Transpose to column-major
                (0..dims)
                    .map(|d| values.iter().map(|row| row[d]).collect())
                    .collect()
            }
        };

        Ok(Self {
            timestamps,
            values,
            frequency: None,
            synthetic_index: false,
        })
    }

    /// Create a simple univariate time series.
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        Self::new(timestamps, vec![values], ValueLayout::Column)
    }

    /// Create a multivariate series from column-major values.
    pub fn multivariate(timestamps: Vec<DateTime<Utc>>, values: Vec<Vec<f64>>) -> Result<Self> {
        Self::new(timestamps, values, ValueLayout::Column)
    }

    /// Create a univariate series from bare values.
    ///
    /// The index is a synthetic one-second grid; locations resolve by
    /// position only and no seasonal period can be inferred from it.
    pub fn from_values(values: Vec<f64>) -> Self {
        let base = DateTime::<Utc>::UNIX_EPOCH;
        let timestamps = (0..values.len())
            .map(|i| base + Duration::seconds(i as i64))
            .collect();
        Self {
            timestamps,
            values: vec![values],
            frequency: None,
            synthetic_index: true,
        }
    }

    /// Attach an explicit frequency.
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get the number of dimensions (1 for univariate).
    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is multivariate.
    pub fn is_multivariate(&self) -> bool {
        self.values.len() > 1
    }

    /// Get timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get values for a specific dimension.
    pub fn values(&self, dimension: usize) -> Result<&[f64]> {
        self.values
            .get(dimension)
            .map(|v| v.as_slice())
            .ok_or(ForecastError::IndexOutOfBounds {
                index: dimension,
                size: self.values.len(),
            })
    }

    /// Get primary (first dimension) values.
    pub fn primary_values(&self) -> &[f64] {
        self.values.first().map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Check whether any value is NaN or infinite.
    pub fn has_missing_values(&self) -> bool {
        self.values
            .iter()
            .any(|dim| dim.iter().any(|v| !v.is_finite()))
    }

    /// Explicitly attached frequency, if any.
    pub fn frequency(&self) -> Option<Frequency> {
        self.frequency
    }

    /// Whether the index was generated by [`TimeSeries::from_values`].
    pub fn has_synthetic_index(&self) -> bool {
        self.synthetic_index
    }

    /// Explicit frequency, falling back to inference from the timestamps.
    ///
    /// A synthetic index without an attached frequency steps by one second.
    pub fn resolved_frequency(&self) -> Option<Frequency> {
        match self.frequency {
            Some(frequency) => Some(frequency),
            None if self.synthetic_index => Some(Frequency::Fixed(Duration::seconds(1))),
            None => self.infer_frequency(0.5).ok(),
        }
    }

    /// Infer frequency from timestamps.
    ///
    /// Whole calendar-month spacing is recognised first; otherwise the modal
    /// spacing is returned if it covers at least `tolerance` of the gaps.
    pub fn infer_frequency(&self, tolerance: f64) -> Result<Frequency> {
        if self.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: self.len(),
            });
        }

        if let Some(freq) = self.infer_monthly() {
            return Ok(freq);
        }

        let diffs: Vec<i64> = self
            .timestamps
            .windows(2)
            .map(|w| (w[1] - w[0]).num_seconds())
            .collect();

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for &diff in &diffs {
            *counts.entry(diff).or_insert(0) += 1;
        }

        let (modal_diff, modal_count) = counts
            .iter()
            .max_by_key(|(_, &count)| count)
            .map(|(&diff, &count)| (diff, count))
            .ok_or(ForecastError::FrequencyInference(
                "empty spacing data".to_string(),
            ))?;

        let modal_ratio = modal_count as f64 / diffs.len() as f64;
        if modal_ratio < tolerance {
            return Err(ForecastError::FrequencyInference(
                "no unique modal spacing found".to_string(),
            ));
        }

        Ok(Frequency::Fixed(Duration::seconds(modal_diff)))
    }

    fn infer_monthly(&self) -> Option<Frequency> {
        let first = self.timestamps.first()?;
        if self.timestamps.iter().any(|t| t.time() != first.time()) {
            return None;
        }

        let month_index = |t: &DateTime<Utc>| t.year() as i64 * 12 + t.month0() as i64;
        let step = month_index(&self.timestamps[1]) - month_index(first);
        if step <= 0 || step > 12 {
            return None;
        }
        let regular = self
            .timestamps
            .windows(2)
            .all(|w| month_index(&w[1]) - month_index(&w[0]) == step);
        if !regular {
            return None;
        }

        if self.timestamps.iter().all(|t| t.day() == first.day()) {
            Some(Frequency::Monthly {
                months: step as u32,
                month_end: false,
            })
        } else if self.timestamps.iter().all(is_month_end) {
            Some(Frequency::Monthly {
                months: step as u32,
                month_end: true,
            })
        } else {
            None
        }
    }

    /// Timestamp at `position`, extrapolating past the end of the index.
    pub fn timestamp_at(&self, position: usize) -> Option<DateTime<Utc>> {
        if let Some(ts) = self.timestamps.get(position) {
            return Some(*ts);
        }
        let last = *self.timestamps.last()?;
        let freq = self.resolved_frequency()?;
        let steps = (position - (self.len() - 1)) as i64;
        freq.advance(last, steps).ok()
    }

    /// Position of `timestamp` in the index.
    ///
    /// Timestamps after the last observation resolve to `len() - 1 + k` when
    /// they lie exactly `k` periods past the end. A synthetic index has no
    /// calendar meaning, so every timestamp is rejected for it.
    pub fn locate(&self, timestamp: DateTime<Utc>) -> Result<usize> {
        if self.synthetic_index {
            return Err(ForecastError::InvalidAnchor(format!(
                "{} cannot be located in a series without timestamps",
                timestamp
            )));
        }
        if let Ok(position) = self.timestamps.binary_search(&timestamp) {
            return Ok(position);
        }

        let last = *self.timestamps.last().ok_or(ForecastError::EmptyData)?;
        if timestamp > last {
            if let Some(freq) = self.resolved_frequency() {
                let steps = freq
                    .periods_between(last, timestamp)
                    .and_then(|k| i64::try_from(k).ok());
                if let Some(steps) = steps {
                    if freq.advance(last, steps).ok() == Some(timestamp) {
                        return Ok(self.len() - 1 + steps as usize);
                    }
                }
            }
        }

        Err(ForecastError::InvalidAnchor(format!(
            "{} is not part of the series index",
            timestamp
        )))
    }
}
