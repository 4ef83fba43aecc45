//! Residual bootstrap for simulated forecast paths.
//!
//! Simulation innovations are drawn with replacement from the in-sample
//! residuals, and path ensembles are summarised by per-step empirical
//! quantiles.

use crate::error::{ForecastError, Result};
use crate::utils::stats::quantile;
use rand::Rng;

/// Draw `count` residuals with replacement.
pub fn resample_residuals(residuals: &[f64], count: usize, rng: &mut impl Rng) -> Result<Vec<f64>> {
    let valid: Vec<f64> = residuals.iter().copied().filter(|r| r.is_finite()).collect();
    if valid.is_empty() {
        return Err(ForecastError::ComputationError(
            "No valid residuals for bootstrap".to_string(),
        ));
    }
    let n = valid.len();
    Ok((0..count).map(|_| valid[rng.gen_range(0..n)]).collect())
}

/// Per-step lower and upper quantiles of simulated paths.
///
/// `paths` is indexed `[step][repetition]`; the bounds enclose the central
/// `level` mass of each step. Non-finite draws are ignored.
pub fn percentile_bounds(paths: &[Vec<f64>], level: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    if !(0.0 < level && level < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "interval level must be in (0, 1), got {}",
            level
        )));
    }
    let tail = (1.0 - level) / 2.0;
    let mut lower = Vec::with_capacity(paths.len());
    let mut upper = Vec::with_capacity(paths.len());
    for step in paths {
        let finite: Vec<f64> = step.iter().copied().filter(|v| v.is_finite()).collect();
        lower.push(quantile(&finite, tail));
        upper.push(quantile(&finite, 1.0 - tail));
    }
    Ok((lower, upper))
}
