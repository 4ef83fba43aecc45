//! Forecaster trait defining the common interface for fitted models.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;

/// Common interface for forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Generate predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with intervals at coverage `level`.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        // Default implementation just returns point predictions
        let _ = level;
        self.predict(horizon)
    }

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use anofox_holtwinters::models::exponential::HoltWinters;
/// use anofox_holtwinters::models::{BoxedForecaster, Forecaster};
///
/// let model: BoxedForecaster = Box::new(HoltWinters::additive(12));
/// assert_eq!(model.name(), "HoltWinters(A,A,12)");
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exponential::{FitConfig, HoltWinters, ModelSpec};

    fn make_test_series(n: usize) -> TimeSeries {
        TimeSeries::from_values((0..n).map(|i| 10.0 + (i % 5) as f64).collect())
    }

    #[test]
    fn boxed_forecaster_fit_predict() {
        let mut model: BoxedForecaster = Box::new(HoltWinters::new(
            ModelSpec::simple(),
            FitConfig::default(),
        ));
        let ts = make_test_series(20);

        assert!(!model.is_fitted());
        assert!(model.fit(&ts).is_ok());
        assert!(model.is_fitted());

        let forecast = model.predict(5).unwrap();
        assert_eq!(forecast.horizon(), 5);
    }

    #[test]
    fn boxed_forecaster_with_intervals() {
        let mut model: BoxedForecaster = Box::new(
            HoltWinters::new(ModelSpec::simple(), FitConfig::default())
                .with_interval_simulation(200, Some(5)),
        );
        model.fit(&make_test_series(20)).unwrap();
        let forecast = model.predict_with_intervals(5, 0.95).unwrap();

        assert_eq!(forecast.horizon(), 5);
        assert!(forecast.has_intervals());
    }
}
