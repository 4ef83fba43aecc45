//! Monte-Carlo simulation of future paths from a fitted model.
//!
//! Paths start from the state at an anchor position and run the
//! innovations form of the model forward. With a multiplicative error the
//! simulated observation is `ŷ (1 + ε)`, otherwise `ŷ + ε`. Box-Cox fits are
//! simulated on the transformed scale and mapped back.

use super::components::{ErrorType, Weights};
use super::results::{index_after, HoltWintersResults};
use crate::core::Location;
use crate::error::{ForecastError, Result};
use crate::utils::bootstrap::resample_residuals;
use crate::utils::stats::{mean, mean_absolute_deviation, median, quantile};
use chrono::{DateTime, Utc};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use statrs::distribution::{Laplace, Normal};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A source of scalar innovations.
///
/// Every `rand` distribution over `f64` is a sampler, including the
/// `statrs` continuous distributions.
pub trait InnovationSampler: Send + Sync {
    fn draw(&self, rng: &mut dyn RngCore) -> f64;
}

impl<D> InnovationSampler for D
where
    D: Distribution<f64> + Send + Sync,
{
    fn draw(&self, rng: &mut dyn RngCore) -> f64 {
        self.sample(rng)
    }
}

/// Distribution families that can be fitted to the residuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionFamily {
    /// Maximum-likelihood mean and standard deviation.
    Normal,
    /// Median location and mean absolute deviation scale.
    Laplace,
}

/// How simulation innovations are generated.
#[derive(Clone, Default)]
pub enum RandomErrors {
    /// Zero-mean normal with the residual standard error.
    #[default]
    Gaussian,
    /// A distribution family fitted to the residuals.
    Fitted(DistributionFamily),
    /// A fully specified distribution.
    Frozen(Arc<dyn InnovationSampler>),
    /// Pre-drawn innovations indexed `[step][repetition]`.
    Given(Vec<Vec<f64>>),
    /// Residuals resampled with replacement.
    Bootstrap,
}

impl RandomErrors {
    /// Pre-drawn innovations for a single repetition.
    pub fn given_path(innovations: Vec<f64>) -> Self {
        RandomErrors::Given(innovations.into_iter().map(|e| vec![e]).collect())
    }

    pub fn frozen<D: InnovationSampler + 'static>(sampler: D) -> Self {
        RandomErrors::Frozen(Arc::new(sampler))
    }
}

impl fmt::Debug for RandomErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RandomErrors::Gaussian => write!(f, "Gaussian"),
            RandomErrors::Fitted(family) => write!(f, "Fitted({:?})", family),
            RandomErrors::Frozen(_) => write!(f, "Frozen(..)"),
            RandomErrors::Given(values) => write!(
                f,
                "Given({}x{})",
                values.len(),
                values.first().map_or(0, Vec::len)
            ),
            RandomErrors::Bootstrap => write!(f, "Bootstrap"),
        }
    }
}

/// Simulation options.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub horizon: usize,
    pub repetitions: usize,
    /// First simulated position; `End` continues after the sample.
    pub anchor: Location,
    pub error: ErrorType,
    pub random_errors: RandomErrors,
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            repetitions: 1,
            anchor: Location::End,
            error: ErrorType::Additive,
            random_errors: RandomErrors::Gaussian,
            seed: None,
        }
    }

    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = repetitions;
        self
    }

    pub fn with_anchor(mut self, anchor: Location) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_error(mut self, error: ErrorType) -> Self {
        self.error = error;
        self
    }

    pub fn with_random_errors(mut self, random_errors: RandomErrors) -> Self {
        self.random_errors = random_errors;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "simulation horizon must be at least 1".to_string(),
            ));
        }
        if self.repetitions == 0 {
            return Err(ForecastError::InvalidParameter(
                "repetitions must be at least 1".to_string(),
            ));
        }
        if let RandomErrors::Given(values) = &self.random_errors {
            if values.len() != self.horizon {
                return Err(ForecastError::DimensionMismatch {
                    expected: self.horizon,
                    got: values.len(),
                });
            }
            if let Some(row) = values.iter().find(|row| row.len() != self.repetitions) {
                return Err(ForecastError::DimensionMismatch {
                    expected: self.repetitions,
                    got: row.len(),
                });
            }
        }
        Ok(())
    }
}

/// Simulated paths indexed `[step][repetition]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    paths: Vec<Vec<f64>>,
    timestamps: Option<Vec<DateTime<Utc>>>,
    anchor: usize,
}

impl SimulationResult {
    pub fn horizon(&self) -> usize {
        self.paths.len()
    }

    pub fn repetitions(&self) -> usize {
        self.paths.first().map_or(0, Vec::len)
    }

    pub fn paths(&self) -> &[Vec<f64>] {
        &self.paths
    }

    pub fn value(&self, step: usize, repetition: usize) -> Option<f64> {
        self.paths.get(step)?.get(repetition).copied()
    }

    /// One repetition across all steps.
    pub fn path(&self, repetition: usize) -> Option<Vec<f64>> {
        self.paths
            .iter()
            .map(|step| step.get(repetition).copied())
            .collect()
    }

    /// The single path of a one-repetition simulation.
    pub fn as_flat(&self) -> Option<Vec<f64>> {
        if self.repetitions() == 1 {
            self.path(0)
        } else {
            None
        }
    }

    /// Per-step mean over repetitions.
    pub fn mean(&self) -> Vec<f64> {
        self.paths.iter().map(|step| mean(step)).collect()
    }

    /// Per-step empirical quantile over repetitions.
    pub fn quantile(&self, q: f64) -> Vec<f64> {
        self.paths.iter().map(|step| quantile(step, q)).collect()
    }

    /// Timestamps of the simulated steps, when the index is dated.
    pub fn timestamps(&self) -> Option<&[DateTime<Utc>]> {
        self.timestamps.as_deref()
    }

    /// Position of the first simulated step.
    pub fn anchor(&self) -> usize {
        self.anchor
    }
}

impl HoltWintersResults {
    /// Simulate future paths.
    ///
    /// Seeded configurations are reproducible.
    pub fn simulate(&self, config: &SimulationConfig) -> Result<SimulationResult> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.simulate_with_rng(config, &mut rng)
    }

    /// Simulate future paths drawing from `rng`.
    pub fn simulate_with_rng<R: Rng>(
        &self,
        config: &SimulationConfig,
        rng: &mut R,
    ) -> Result<SimulationResult> {
        config.validate()?;
        let series = self.model().series();
        let n = self.nobs();
        let anchor = config.anchor.resolve(series)?;
        if anchor > n {
            return Err(ForecastError::InvalidAnchor(format!(
                "cannot anchor simulation at {} outside of a sample of {}",
                anchor, n
            )));
        }

        let residuals = self.simulation_residuals(config.error);
        let innovations = self.draw_innovations(config, &residuals, rng)?;
        let paths = self.propagate(anchor, config.error, &innovations);

        debug!(
            model = %self.spec(),
            anchor,
            horizon = config.horizon,
            repetitions = config.repetitions,
            "simulated forecast paths"
        );

        Ok(SimulationResult {
            paths,
            timestamps: index_after(series, anchor, config.horizon),
            anchor,
        })
    }

    /// In-sample errors on the transformed scale, matching the error form.
    fn simulation_residuals(&self, error: ErrorType) -> Vec<f64> {
        self.y_transformed()
            .iter()
            .zip(self.fitted_transformed())
            .map(|(y, f)| match error {
                ErrorType::Additive => y - f,
                ErrorType::Multiplicative => y / f - 1.0,
            })
            .collect()
    }

    fn residual_scale(&self, residuals: &[f64]) -> f64 {
        let n = residuals.len();
        let k = self.k();
        let dof = if n > k { n - k } else { n.max(1) };
        (residuals.iter().map(|r| r * r).sum::<f64>() / dof as f64).sqrt()
    }

    fn draw_innovations<R: Rng>(
        &self,
        config: &SimulationConfig,
        residuals: &[f64],
        rng: &mut R,
    ) -> Result<Vec<Vec<f64>>> {
        let (h, reps) = (config.horizon, config.repetitions);
        match &config.random_errors {
            RandomErrors::Gaussian => {
                let sigma = self.residual_scale(residuals);
                draw_normal(0.0, sigma, h, reps, rng)
            }
            RandomErrors::Fitted(DistributionFamily::Normal) => {
                let mu = mean(residuals);
                let sd = (residuals.iter().map(|r| (r - mu) * (r - mu)).sum::<f64>()
                    / residuals.len() as f64)
                    .sqrt();
                draw_normal(mu, sd, h, reps, rng)
            }
            RandomErrors::Fitted(DistributionFamily::Laplace) => {
                let location = median(residuals);
                let scale = mean_absolute_deviation(residuals, location);
                if !(scale > 0.0) {
                    return Ok(vec![vec![location; reps]; h]);
                }
                let laplace = Laplace::new(location, scale)
                    .map_err(|e| ForecastError::ComputationError(e.to_string()))?;
                Ok(fill(h, reps, || laplace.sample(rng)))
            }
            RandomErrors::Frozen(sampler) => {
                let rng: &mut dyn RngCore = rng;
                Ok(fill(h, reps, || sampler.draw(rng)))
            }
            RandomErrors::Given(values) => Ok(values.clone()),
            RandomErrors::Bootstrap => {
                let draws = resample_residuals(residuals, h * reps, rng)?;
                Ok(draws.chunks(reps).map(<[f64]>::to_vec).collect())
            }
        }
    }

    fn propagate(&self, anchor: usize, error: ErrorType, innovations: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let eq = self.spec().variant().equations();
        let kp = self.kernel_params();
        // The trend gain is expressed relative to the level gain.
        let beta = if kp.alpha == 0.0 { 0.0 } else { kp.beta / kp.alpha };
        let weights = Weights {
            alpha: kp.alpha,
            beta,
            gamma: kp.gamma,
            phi: kp.phi,
        };

        let (level0, trend0) = self.state_before(anchor);
        let m = self.period();
        let seasons0: Vec<f64> = (anchor..anchor + m).map(|i| self.seasonal_state(i)).collect();
        let horizon = innovations.len();
        let reps = innovations.first().map_or(0, Vec::len);
        let bias = self.bias();

        let mut paths = vec![vec![0.0; reps]; horizon];
        for r in 0..reps {
            let (mut level, mut trend) = (level0, trend0);
            let mut seasons = seasons0.clone();
            for (t, step) in innovations.iter().enumerate() {
                let slot = t % m;
                let season = seasons[slot];
                let predicted = eq.predict(level, trend, season, weights.phi);
                let y = match error {
                    ErrorType::Additive => predicted + step[r],
                    ErrorType::Multiplicative => predicted * (1.0 + step[r]),
                };
                let next = eq.step(&weights, level, trend, season, y);
                level = next.level;
                trend = next.trend;
                seasons[slot] = next.season;
                paths[t][r] = self.untransform(y) + bias;
            }
        }
        paths
    }
}

fn draw_normal<R: Rng>(
    mu: f64,
    sigma: f64,
    horizon: usize,
    repetitions: usize,
    rng: &mut R,
) -> Result<Vec<Vec<f64>>> {
    if !(sigma > 0.0) {
        return Ok(vec![vec![mu; repetitions]; horizon]);
    }
    let normal =
        Normal::new(mu, sigma).map_err(|e| ForecastError::ComputationError(e.to_string()))?;
    Ok(fill(horizon, repetitions, || normal.sample(rng)))
}

/// Row-major fill: all repetitions of a step before the next step.
fn fill(horizon: usize, repetitions: usize, mut draw: impl FnMut() -> f64) -> Vec<Vec<f64>> {
    (0..horizon)
        .map(|_| (0..repetitions).map(|_| draw()).collect())
        .collect()
}
