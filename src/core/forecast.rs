//! Forecast result structure for holding predictions.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// Point forecasts with optional timestamps and prediction intervals.
#[derive(Debug, Clone, Default)]
pub struct Forecast {
    point: Vec<f64>,
    timestamps: Option<Vec<DateTime<Utc>>>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
    /// Coverage of the interval, e.g. 0.95.
    level: Option<f64>,
}

impl Forecast {
    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            ..Default::default()
        }
    }

    /// Create a forecast with prediction intervals at coverage `level`.
    pub fn from_values_with_intervals(
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        level: f64,
    ) -> Result<Self> {
        for bound in [&lower, &upper] {
            if bound.len() != values.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: values.len(),
                    got: bound.len(),
                });
            }
        }
        Ok(Self {
            point: values,
            timestamps: None,
            lower: Some(lower),
            upper: Some(upper),
            level: Some(level),
        })
    }

    /// Attach the timestamps the predictions refer to.
    pub fn with_timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Result<Self> {
        if timestamps.len() != self.point.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.point.len(),
                got: timestamps.len(),
            });
        }
        self.timestamps = Some(timestamps);
        Ok(self)
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Check if forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn primary(&self) -> &[f64] {
        &self.point
    }

    pub fn timestamps(&self) -> Option<&[DateTime<Utc>]> {
        self.timestamps.as_deref()
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    pub fn level(&self) -> Option<f64> {
        self.level
    }

    /// Check if prediction intervals are available.
    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }
}
