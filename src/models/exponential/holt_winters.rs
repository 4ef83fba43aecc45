//! Holt-Winters behind the [`Forecaster`] interface.

use super::components::{ModelSpec, SeasonalType, TrendType};
use super::estimator::FitConfig;
use super::model::ExponentialSmoothing;
use super::results::HoltWintersResults;
use super::simulate::SimulationConfig;
use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::bootstrap::percentile_bounds;

/// Default number of simulated paths behind prediction intervals.
const INTERVAL_REPETITIONS: usize = 1000;

/// Holt-Winters forecaster.
///
/// Fitting estimates the model described by its [`ModelSpec`] under a
/// [`FitConfig`]. Prediction intervals are empirical quantiles of
/// simulated future paths.
///
/// # Example
/// ```
/// use anofox_holtwinters::core::TimeSeries;
/// use anofox_holtwinters::models::exponential::HoltWinters;
/// use anofox_holtwinters::models::Forecaster;
///
/// let values: Vec<f64> = (0..24).map(|i| 20.0 + (i % 4) as f64 * 3.0 + i as f64 * 0.5).collect();
/// let mut model = HoltWinters::additive(4);
/// model.fit(&TimeSeries::from_values(values)).unwrap();
///
/// let forecast = model.predict_with_intervals(8, 0.9).unwrap();
/// assert_eq!(forecast.horizon(), 8);
/// assert!(forecast.has_intervals());
/// ```
#[derive(Debug, Clone)]
pub struct HoltWinters {
    spec: ModelSpec,
    config: FitConfig,
    repetitions: usize,
    seed: Option<u64>,
    name: String,
    results: Option<HoltWintersResults>,
}

impl HoltWinters {
    pub fn new(spec: ModelSpec, config: FitConfig) -> Self {
        Self {
            name: spec.to_string(),
            spec,
            config,
            repetitions: INTERVAL_REPETITIONS,
            seed: None,
            results: None,
        }
    }

    /// Additive trend and additive seasonality.
    pub fn additive(seasonal_periods: usize) -> Self {
        Self::new(
            ModelSpec::new(TrendType::Additive, SeasonalType::Additive)
                .with_seasonal_periods(seasonal_periods),
            FitConfig::default(),
        )
    }

    /// Additive trend and multiplicative seasonality.
    pub fn multiplicative(seasonal_periods: usize) -> Self {
        Self::new(
            ModelSpec::new(TrendType::Additive, SeasonalType::Multiplicative)
                .with_seasonal_periods(seasonal_periods),
            FitConfig::default(),
        )
    }

    /// Simulation settings for prediction intervals.
    pub fn with_interval_simulation(mut self, repetitions: usize, seed: Option<u64>) -> Self {
        self.repetitions = repetitions;
        self.seed = seed;
        self
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    /// Fitted results, available after [`Forecaster::fit`].
    pub fn results(&self) -> Option<&HoltWintersResults> {
        self.results.as_ref()
    }

    fn fitted(&self) -> Result<&HoltWintersResults> {
        self.results.as_ref().ok_or(ForecastError::FitRequired)
    }

    fn attach_index(&self, forecast: Forecast) -> Result<Forecast> {
        let results = self.fitted()?;
        match results.forecast_index(forecast.horizon()) {
            Some(index) => forecast.with_timestamps(index),
            None => Ok(forecast),
        }
    }
}

impl Forecaster for HoltWinters {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let model = ExponentialSmoothing::new(series, self.spec)?;
        self.spec = *model.spec();
        self.results = Some(model.fit(&self.config)?);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let values = self.fitted()?.forecast(horizon)?;
        self.attach_index(Forecast::from_values(values))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let results = self.fitted()?;
        let mut simulation = SimulationConfig::new(horizon).with_repetitions(self.repetitions);
        simulation.seed = self.seed;
        let paths = results.simulate(&simulation)?;
        let (lower, upper) = percentile_bounds(paths.paths(), level)?;

        let forecast =
            Forecast::from_values_with_intervals(results.forecast(horizon)?, lower, upper, level)?;
        self.attach_index(forecast)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.results.as_ref().map(|r| r.fitted_values())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.results.as_ref().map(|r| r.resid())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Frequency;
    use chrono::{TimeZone, Utc};

    fn seasonal_values(n: usize) -> Vec<f64> {
        let pattern = [4.0, -2.0, -5.0, 3.0];
        (0..n)
            .map(|i| 50.0 + 0.4 * i as f64 + pattern[i % 4] + ((i * 7) % 5) as f64 * 0.3)
            .collect()
    }

    #[test]
    fn predict_requires_fit() {
        let model = HoltWinters::additive(4);
        assert_eq!(model.predict(3).unwrap_err(), ForecastError::FitRequired);
        assert!(!model.is_fitted());
    }

    #[test]
    fn fit_predict_with_positional_index() {
        let mut model = HoltWinters::additive(4);
        model.fit(&TimeSeries::from_values(seasonal_values(32))).unwrap();

        let forecast = model.predict(6).unwrap();
        assert_eq!(forecast.horizon(), 6);
        assert!(forecast.timestamps().is_none());
        assert_eq!(model.fitted_values().unwrap().len(), 32);
        assert_eq!(model.residuals().unwrap().len(), 32);
        assert_eq!(model.name(), "HoltWinters(A,A,4)");
    }

    #[test]
    fn intervals_bracket_point_forecast() {
        let mut model = HoltWinters::multiplicative(4).with_interval_simulation(400, Some(11));
        model.fit(&TimeSeries::from_values(seasonal_values(40))).unwrap();

        let forecast = model.predict_with_intervals(4, 0.95).unwrap();
        let lower = forecast.lower().unwrap();
        let upper = forecast.upper().unwrap();
        for i in 0..4 {
            assert!(lower[i] < forecast.primary()[i]);
            assert!(upper[i] > forecast.primary()[i]);
        }
        assert_eq!(forecast.level(), Some(0.95));
    }

    #[test]
    fn dated_series_gets_forecast_timestamps() {
        let start = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        let timestamps = (0..24)
            .map(|i| Frequency::quarterly().advance(start, i).unwrap())
            .collect();
        let series = TimeSeries::univariate(timestamps, seasonal_values(24)).unwrap();

        let mut model = HoltWinters::new(
            ModelSpec::new(TrendType::None, SeasonalType::Additive),
            FitConfig::default(),
        );
        model.fit(&series).unwrap();
        assert_eq!(model.spec().seasonal_periods, Some(4));

        let forecast = model.predict(2).unwrap();
        let ts = forecast.timestamps().unwrap();
        assert_eq!(ts[0], Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(ts[1], Utc.with_ymd_and_hms(2016, 4, 1, 0, 0, 0).unwrap());
    }
}
