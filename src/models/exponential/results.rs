//! Fitted Holt-Winters model: parameters, states, diagnostics and forecasts.

use super::components::{ModelSpec, TrendType};
use super::estimator::BoxCox;
use super::kernel::{SmoothingParams, Smoothed, MAX_SEEN};
use super::model::ExponentialSmoothing;
use crate::core::{Location, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::transform::inv_boxcox_value;
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::warn;

/// Non-fatal conditions met while estimating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimationWarning {
    /// Optimization was requested but every parameter was fixed.
    NoFreeParameters,
    /// The optimizer stopped at its iteration limit.
    ConvergenceFailure,
}

impl fmt::Display for EstimationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimationWarning::NoFreeParameters => {
                write!(f, "model has no free parameters to estimate")
            }
            EstimationWarning::ConvergenceFailure => {
                write!(f, "optimization failed to converge, check parameters")
            }
        }
    }
}

/// Outcome of the numerical optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationSummary {
    /// Optimal free parameters, usable as `start_params` for a refit.
    pub x: Vec<f64>,
    /// Objective at `x`.
    pub fun: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Estimated parameters.
///
/// Components absent from the model are reported as NaN. Initial states
/// are on the Box-Cox scale when a transform is in use.
#[derive(Debug, Clone, PartialEq)]
pub struct HoltWintersParams {
    pub smoothing_level: f64,
    pub smoothing_slope: f64,
    pub smoothing_seasonal: f64,
    pub damping_slope: f64,
    pub initial_level: f64,
    pub initial_slope: f64,
    pub initial_seasons: Vec<f64>,
    pub use_boxcox: BoxCox,
    pub lambda: Option<f64>,
    pub remove_bias: bool,
}

impl HoltWintersParams {
    /// Scalar parameter by name.
    ///
    /// `use_boxcox` and `lambda` report the lambda in use (NaN without a
    /// transform); `remove_bias` reports 1.0 or 0.0.
    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            "smoothing_level" => Some(self.smoothing_level),
            "smoothing_slope" => Some(self.smoothing_slope),
            "smoothing_seasonal" => Some(self.smoothing_seasonal),
            "damping_slope" => Some(self.damping_slope),
            "initial_level" => Some(self.initial_level),
            "initial_slope" => Some(self.initial_slope),
            "use_boxcox" | "lambda" | "lamda" => Some(self.lambda.unwrap_or(f64::NAN)),
            "remove_bias" => Some(if self.remove_bias { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn initial_seasons(&self) -> &[f64] {
        &self.initial_seasons
    }
}

/// Results of fitting an [`ExponentialSmoothing`] model.
///
/// `level`, `trend` and `season` hold the state after each observation;
/// absent components are zero. They can be edited through the `*_mut`
/// accessors, which shifts the forecast and simulation origin.
#[derive(Debug, Clone)]
pub struct HoltWintersResults {
    model: ExponentialSmoothing,
    params: HoltWintersParams,
    kernel_params: SmoothingParams,
    period: usize,
    level: Vec<f64>,
    trend: Vec<f64>,
    season: Vec<f64>,
    fitted: Vec<f64>,
    resid: Vec<f64>,
    y_transformed: Vec<f64>,
    fitted_transformed: Vec<f64>,
    sse: f64,
    aic: f64,
    aicc: f64,
    bic: f64,
    k: usize,
    bias: f64,
    warnings: Vec<EstimationWarning>,
    optimization: Option<OptimizationSummary>,
}

impl HoltWintersResults {
    pub(crate) fn new(
        model: ExponentialSmoothing,
        params: HoltWintersParams,
        kernel_params: SmoothingParams,
        smoothed: Smoothed,
        y_transformed: Vec<f64>,
        warnings: Vec<EstimationWarning>,
        optimization: Option<OptimizationSummary>,
    ) -> Result<Self> {
        let spec = *model.spec();
        let data = model.endog();
        let n = data.len();
        if smoothed.fitted.len() != n || y_transformed.len() != n {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: smoothed.fitted.len(),
            });
        }
        if smoothed.sse >= MAX_SEEN {
            warn!(model = %spec, "smoothing recursion left the finite range");
        }

        let period = smoothed.period;
        let untransform = |v: f64| match params.lambda {
            Some(lambda) => inv_boxcox_value(v, lambda),
            None => v,
        };

        let raw: Vec<f64> = smoothed.fitted.iter().map(|&v| untransform(v)).collect();
        let bias = if params.remove_bias {
            data.iter().zip(&raw).map(|(y, f)| y - f).sum::<f64>() / n as f64
        } else {
            0.0
        };
        let fitted: Vec<f64> = raw.iter().map(|f| f + bias).collect();
        let resid: Vec<f64> = data.iter().zip(&fitted).map(|(y, f)| y - f).collect();

        let sse = if params.lambda.is_some() {
            y_transformed
                .iter()
                .zip(&smoothed.fitted)
                .map(|(y, f)| (y - f) * (y - f))
                .sum()
        } else {
            resid.iter().map(|r| r * r).sum()
        };

        let k = parameter_count(&spec);
        let (aic, aicc, bic) = information_criteria(sse, n, k);

        Ok(Self {
            model,
            params,
            kernel_params,
            period,
            level: smoothed.level[1..].to_vec(),
            trend: smoothed.trend[1..].to_vec(),
            season: smoothed.season[period..].to_vec(),
            fitted,
            resid,
            y_transformed,
            fitted_transformed: smoothed.fitted,
            sse,
            aic,
            aicc,
            bic,
            k,
            bias,
            warnings,
            optimization,
        })
    }

    pub fn model(&self) -> &ExponentialSmoothing {
        &self.model
    }

    pub fn spec(&self) -> &ModelSpec {
        self.model.spec()
    }

    pub fn params(&self) -> &HoltWintersParams {
        &self.params
    }

    pub fn nobs(&self) -> usize {
        self.fitted.len()
    }

    pub fn level(&self) -> &[f64] {
        &self.level
    }

    pub fn trend(&self) -> &[f64] {
        &self.trend
    }

    /// Alias of [`trend`](Self::trend).
    pub fn slope(&self) -> &[f64] {
        &self.trend
    }

    pub fn season(&self) -> &[f64] {
        &self.season
    }

    pub fn level_mut(&mut self) -> &mut [f64] {
        &mut self.level
    }

    pub fn trend_mut(&mut self) -> &mut [f64] {
        &mut self.trend
    }

    pub fn season_mut(&mut self) -> &mut [f64] {
        &mut self.season
    }

    /// In-sample one-step predictions on the original scale.
    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    pub fn resid(&self) -> &[f64] {
        &self.resid
    }

    /// Sum of squared errors, on the Box-Cox scale when a transform is used.
    pub fn sse(&self) -> f64 {
        self.sse
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn aicc(&self) -> f64 {
        self.aicc
    }

    pub fn bic(&self) -> f64 {
        self.bic
    }

    /// Number of estimated quantities used by the information criteria.
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn warnings(&self) -> &[EstimationWarning] {
        &self.warnings
    }

    pub fn optimization(&self) -> Option<&OptimizationSummary> {
        self.optimization.as_ref()
    }

    /// Out-of-sample forecasts for steps `1..=horizon`.
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be at least 1".to_string(),
            ));
        }
        let n = self.nobs();
        let level = self.level[n - 1];
        let trend = self.trend[n - 1];
        let spec = self.spec();
        let phi = self.kernel_params.phi;
        let seasoned = spec.variant().equations().seasoned;

        let mut damped_sum = 0.0;
        let mut phi_power = 1.0;
        let forecasts = (1..=horizon)
            .map(|h| {
                if spec.damped {
                    phi_power *= phi;
                    damped_sum += phi_power;
                } else {
                    damped_sum = h as f64;
                }
                let base = match spec.trend {
                    TrendType::None => level,
                    TrendType::Additive => level + damped_sum * trend,
                    TrendType::Multiplicative => level * trend.powf(damped_sum),
                };
                let season = self.seasonal_state(n + (h - 1) % self.period);
                self.untransform(seasoned(base, season)) + self.bias
            })
            .collect();
        Ok(forecasts)
    }

    /// Fitted values followed by the one-step-ahead forecast.
    pub fn fitted_forecast(&self) -> Result<Vec<f64>> {
        let mut values = self.fitted.clone();
        values.extend(self.forecast(1)?);
        Ok(values)
    }

    /// In-sample predictions and forecasts for positions `start..=end`.
    ///
    /// Positions before the end of the sample use the fitted values.
    pub fn predict(&self, start: Location, end: Location) -> Result<Vec<f64>> {
        let series = self.model.series();
        let first = start.resolve(series)?;
        let last = end.resolve(series)?;
        if first > last {
            return Err(ForecastError::InvalidParameter(format!(
                "prediction start {} is after end {}",
                first, last
            )));
        }

        let n = self.nobs();
        let out_of_sample = if last >= n {
            self.forecast(last - n + 1)?
        } else {
            Vec::new()
        };
        Ok((first..=last)
            .map(|p| {
                if p < n {
                    self.fitted[p]
                } else {
                    out_of_sample[p - n]
                }
            })
            .collect())
    }

    /// Timestamps of the first `horizon` forecasts.
    ///
    /// `None` for series built from bare values.
    pub fn forecast_index(&self, horizon: usize) -> Option<Vec<DateTime<Utc>>> {
        index_after(self.model.series(), self.nobs(), horizon)
    }

    /// Human-readable parameter and diagnostic table.
    pub fn summary(&self) -> String {
        let p = &self.params;
        let mut out = String::new();
        out.push_str(&format!("{}\n", self.spec()));
        out.push_str(&format!(
            "nobs: {}  sse: {:.6}  k: {}\n",
            self.nobs(),
            self.sse,
            self.k
        ));
        out.push_str(&format!(
            "aic: {:.4}  aicc: {:.4}  bic: {:.4}\n",
            self.aic, self.aicc, self.bic
        ));
        let scalars = [
            ("smoothing_level", p.smoothing_level),
            ("smoothing_slope", p.smoothing_slope),
            ("smoothing_seasonal", p.smoothing_seasonal),
            ("damping_slope", p.damping_slope),
            ("initial_level", p.initial_level),
            ("initial_slope", p.initial_slope),
        ];
        for (name, value) in scalars.iter().filter(|(_, v)| !v.is_nan()) {
            out.push_str(&format!("{:<20}{:>14.6}\n", name, value));
        }
        for (i, s) in p.initial_seasons.iter().enumerate() {
            out.push_str(&format!("{:<20}{:>14.6}\n", format!("initial_seasons.{}", i), s));
        }
        if let Some(lambda) = p.lambda {
            out.push_str(&format!("{:<20}{:>14.6}\n", "lambda", lambda));
        }
        for warning in &self.warnings {
            out.push_str(&format!("warning: {}\n", warning));
        }
        out
    }

    pub(crate) fn kernel_params(&self) -> &SmoothingParams {
        &self.kernel_params
    }

    pub(crate) fn period(&self) -> usize {
        self.period
    }

    pub(crate) fn bias(&self) -> f64 {
        self.bias
    }

    pub(crate) fn y_transformed(&self) -> &[f64] {
        &self.y_transformed
    }

    pub(crate) fn fitted_transformed(&self) -> &[f64] {
        &self.fitted_transformed
    }

    /// Level and trend before observation `position`.
    pub(crate) fn state_before(&self, position: usize) -> (f64, f64) {
        if position == 0 {
            (
                self.kernel_params.initial_level,
                self.kernel_params.initial_trend,
            )
        } else {
            (self.level[position - 1], self.trend[position - 1])
        }
    }

    /// Seasonal state `index` in the extended layout where the first
    /// `period` entries are the initial seasons.
    pub(crate) fn seasonal_state(&self, index: usize) -> f64 {
        if !self.spec().has_season() {
            0.0
        } else if index < self.period {
            self.kernel_params.initial_seasons[index]
        } else {
            self.season[index - self.period]
        }
    }

    pub(crate) fn untransform(&self, value: f64) -> f64 {
        match self.params.lambda {
            Some(lambda) => inv_boxcox_value(value, lambda),
            None => value,
        }
    }
}

/// `k = m·seasonal + 2·trending + 2 + damped`.
pub(crate) fn parameter_count(spec: &ModelSpec) -> usize {
    let seasonal = if spec.has_season() {
        spec.seasonal_periods.unwrap_or(0)
    } else {
        0
    };
    let trending = if spec.has_trend() { 2 } else { 0 };
    seasonal + trending + 2 + usize::from(spec.damped)
}

/// AIC, AICc and BIC from the SSE.
///
/// AICc is infinite when `n - k - 3 <= 0`.
pub(crate) fn information_criteria(sse: f64, n: usize, k: usize) -> (f64, f64, f64) {
    let nf = n as f64;
    let kf = k as f64;
    let fit = nf * (sse / nf).ln();
    let aic = fit + 2.0 * kf;
    let dof = nf - kf - 3.0;
    let aicc = if dof > 0.0 {
        aic + 2.0 * (kf + 2.0) * (kf + 3.0) / dof
    } else {
        f64::INFINITY
    };
    let bic = fit + kf * nf.ln();
    (aic, aicc, bic)
}

/// Timestamps for positions `start..start + count`, when the index carries
/// calendar meaning.
pub(crate) fn index_after(
    series: &TimeSeries,
    start: usize,
    count: usize,
) -> Option<Vec<DateTime<Utc>>> {
    if series.has_synthetic_index() {
        return None;
    }
    (start..start + count)
        .map(|p| series.timestamp_at(p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exponential::components::SeasonalType;
    use crate::models::exponential::FitConfig;
    use approx::assert_relative_eq;

    fn fixed_ses(values: &[f64], alpha: f64) -> HoltWintersResults {
        ExponentialSmoothing::from_values(values, ModelSpec::simple())
            .unwrap()
            .fit(&FitConfig::new().with_smoothing_level(alpha).optimized(false))
            .unwrap()
    }

    #[test]
    fn parameter_count_counts_components() {
        let spec = ModelSpec::new(TrendType::Additive, SeasonalType::Additive)
            .damped(true)
            .with_seasonal_periods(4);
        assert_eq!(parameter_count(&spec), 4 + 2 + 2 + 1);
        assert_eq!(parameter_count(&ModelSpec::simple()), 2);
    }

    #[test]
    fn aicc_is_infinite_without_degrees_of_freedom() {
        let (aic, aicc, bic) = information_criteria(10.0, 5, 2);
        assert_relative_eq!(aic, 5.0 * 2.0f64.ln() + 4.0, epsilon = 1e-12);
        assert!(aicc.is_infinite());
        assert_relative_eq!(bic, 5.0 * 2.0f64.ln() + 2.0 * 5.0f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn ses_forecast_is_flat_at_final_level() {
        let fit = fixed_ses(&[10.0, 12.0, 11.0, 13.0], 0.5);
        let fc = fit.forecast(3).unwrap();
        let last = *fit.level().last().unwrap();
        assert!(fc.iter().all(|&v| (v - last).abs() < 1e-12));
        assert!(fit.forecast(0).is_err());
    }

    #[test]
    fn predict_spans_sample_and_horizon() {
        let fit = fixed_ses(&[10.0, 12.0, 11.0, 13.0], 0.5);
        let values = fit.predict(Location::Index(2), Location::Index(5)).unwrap();
        assert_eq!(values.len(), 4);
        assert_eq!(values[0], fit.fitted_values()[2]);
        assert_eq!(values[1], fit.fitted_values()[3]);
        assert_relative_eq!(values[2], fit.forecast(1).unwrap()[0], epsilon = 1e-12);
        assert!(fit.predict(Location::Index(3), Location::Index(1)).is_err());
    }

    #[test]
    fn editing_final_level_moves_forecasts() {
        let mut fit = fixed_ses(&[10.0, 12.0, 11.0, 13.0], 0.5);
        *fit.level_mut().last_mut().unwrap() = 100.0;
        assert_eq!(fit.forecast(2).unwrap(), vec![100.0, 100.0]);
    }

    #[test]
    fn params_lookup_by_name() {
        let fit = fixed_ses(&[10.0, 12.0, 11.0, 13.0], 0.5);
        let params = fit.params();
        assert_eq!(params.get("smoothing_level"), Some(0.5));
        assert!(params.get("smoothing_slope").unwrap().is_nan());
        assert!(params.get("use_boxcox").unwrap().is_nan());
        assert_eq!(params.get("unknown"), None);
        assert!(fit.summary().contains("smoothing_level"));
    }

    #[test]
    fn bias_removal_centres_residuals() {
        let values = [10.0, 12.0, 14.0, 16.0, 18.0, 20.0];
        let fit = ExponentialSmoothing::from_values(&values, ModelSpec::simple())
            .unwrap()
            .fit(
                &FitConfig::new()
                    .with_smoothing_level(0.3)
                    .optimized(false)
                    .remove_bias(true),
            )
            .unwrap();
        let mean_resid = fit.resid().iter().sum::<f64>() / values.len() as f64;
        assert_relative_eq!(mean_resid, 0.0, epsilon = 1e-10);
    }
}
