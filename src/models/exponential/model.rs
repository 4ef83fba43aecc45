//! Holt-Winters model bound to an observed series.

use super::components::{ModelSpec, TrendType};
use super::estimator::{self, FitConfig};
use super::params::heuristic_initial_values;
use super::results::HoltWintersResults;
use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use tracing::debug;

/// A validated Holt-Winters specification together with its data.
///
/// Construction resolves the seasonal period, inferring it from the series
/// frequency when the specification leaves it open.
///
/// # Example
/// ```
/// use anofox_holtwinters::core::TimeSeries;
/// use anofox_holtwinters::models::exponential::{ExponentialSmoothing, FitConfig};
///
/// let series = TimeSeries::from_values(vec![10.0, 12.0, 11.0, 13.0, 12.5, 14.0]);
/// let model = ExponentialSmoothing::simple(&series).unwrap();
/// let fit = model
///     .fit(&FitConfig::new().with_smoothing_level(0.5).optimized(false))
///     .unwrap();
/// assert_eq!(fit.forecast(3).unwrap().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ExponentialSmoothing {
    series: TimeSeries,
    spec: ModelSpec,
}

impl ExponentialSmoothing {
    pub fn new(series: &TimeSeries, spec: ModelSpec) -> Result<Self> {
        if series.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if series.dimensions() != 1 {
            return Err(ForecastError::NotUnivariate {
                dimensions: series.dimensions(),
            });
        }
        if series.has_missing_values() {
            return Err(ForecastError::MissingValues);
        }
        if spec.damped && !spec.has_trend() {
            return Err(ForecastError::InvalidSpecification(
                "can only dampen the trend component".to_string(),
            ));
        }

        let mut spec = spec;
        let n = series.len();

        if spec.has_season() {
            let periods = match spec.seasonal_periods {
                Some(m) => m,
                None => Self::infer_periods(series)?,
            };
            if periods < 2 {
                return Err(ForecastError::InvalidSpecification(format!(
                    "seasonal_periods must be at least 2, got {}",
                    periods
                )));
            }
            let needed = if spec.has_trend() { 2 * periods } else { periods };
            if n < needed {
                return Err(ForecastError::InsufficientData { needed, got: n });
            }
            spec.seasonal_periods = Some(periods);
        } else {
            spec.seasonal_periods = None;
            if spec.has_trend() && n < 2 {
                return Err(ForecastError::InsufficientData { needed: 2, got: n });
            }
        }

        if spec.is_multiplicative() && series.primary_values().iter().any(|&v| v <= 0.0) {
            return Err(ForecastError::NonPositiveData(
                "multiplicative components require strictly positive data".to_string(),
            ));
        }

        debug!(model = %spec, nobs = n, "created exponential smoothing model");
        Ok(Self {
            series: series.clone(),
            spec,
        })
    }

    /// Model over raw values with a positional index.
    pub fn from_values(values: &[f64], spec: ModelSpec) -> Result<Self> {
        Self::new(&TimeSeries::from_values(values.to_vec()), spec)
    }

    /// Simple exponential smoothing.
    pub fn simple(series: &TimeSeries) -> Result<Self> {
        Self::new(series, ModelSpec::simple())
    }

    /// Holt's method, exponential when `exponential` is set.
    pub fn holt(series: &TimeSeries, exponential: bool, damped: bool) -> Result<Self> {
        let trend = if exponential {
            TrendType::Multiplicative
        } else {
            TrendType::Additive
        };
        Self::new(series, ModelSpec::holt(trend).damped(damped))
    }

    fn infer_periods(series: &TimeSeries) -> Result<usize> {
        if series.has_synthetic_index() && series.frequency().is_none() {
            return Err(ForecastError::InvalidSpecification(
                "seasonal_periods must be given for a series without a dated index".to_string(),
            ));
        }
        series
            .resolved_frequency()
            .and_then(|f| f.seasonal_periods())
            .ok_or_else(|| {
                ForecastError::InvalidSpecification(
                    "unable to determine seasonal_periods from the index frequency".to_string(),
                )
            })
    }

    /// Resolved specification.
    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    /// Observed values.
    pub fn endog(&self) -> &[f64] {
        self.series.primary_values()
    }

    pub fn nobs(&self) -> usize {
        self.series.len()
    }

    /// Seasonal period, or 0 for non-seasonal models.
    pub fn seasonal_periods(&self) -> usize {
        self.spec.seasonal_periods.unwrap_or(0)
    }

    /// Heuristic initial level, slope and seasons on the original scale.
    ///
    /// The slope is `None` for models without a trend.
    pub fn initial_values(&self) -> (f64, Option<f64>, Vec<f64>) {
        let (level, slope, seasons) = heuristic_initial_values(self.endog(), &self.spec);
        (level, self.spec.has_trend().then_some(slope), seasons)
    }

    /// Estimate the model.
    pub fn fit(&self, config: &FitConfig) -> Result<HoltWintersResults> {
        estimator::fit(self, config)
    }
}
