//! Parameter estimation for Holt-Winters models.

use super::components::ModelSpec;
use super::kernel::{evaluate_fast, evaluate_reference, KernelWorkspace, MAX_SEEN};
use super::model::ExponentialSmoothing;
use super::params::{
    gather, heuristic_initial_values, scatter, Layout, ALPHA, BETA, GAMMA, LEVEL, PHI, SEASONS,
    SLOPE,
};
use super::results::{EstimationWarning, HoltWintersParams, HoltWintersResults, OptimizationSummary};
use crate::error::{ForecastError, Result};
use crate::transform::{boxcox, boxcox_lambda, is_boxcox_suitable};
use crate::utils::optimization::{
    basin_hopping, brute, minimize, BasinHoppingConfig, NelderMeadConfig, NelderMeadResult,
};
use tracing::{debug, warn};

/// Grid points per smoothing parameter in the brute-force start search.
const BRUTE_POINTS: usize = 20;

/// Box-Cox handling during fitting.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BoxCox {
    /// Fit on the original scale.
    #[default]
    Off,
    /// Estimate lambda jointly with the smoothing parameters.
    Estimate,
    /// Use the given lambda.
    Fixed(f64),
    /// Log transform (lambda = 0).
    Log,
}

impl BoxCox {
    pub fn is_active(&self) -> bool {
        !matches!(self, BoxCox::Off)
    }
}

impl From<bool> for BoxCox {
    fn from(estimate: bool) -> Self {
        if estimate {
            BoxCox::Estimate
        } else {
            BoxCox::Off
        }
    }
}

impl From<f64> for BoxCox {
    fn from(lambda: f64) -> Self {
        BoxCox::Fixed(lambda)
    }
}

/// Local optimizer used after the start search.
#[derive(Debug, Clone)]
pub enum Optimizer {
    /// Restarted Nelder-Mead.
    NelderMead,
    /// Basin hopping around restarted Nelder-Mead.
    ///
    /// Local searches run with the fit's own Nelder-Mead settings; only the
    /// hop count, step size, temperature and seed are read from here.
    BasinHopping(BasinHoppingConfig),
}

/// Fitting options.
///
/// Any smoothing parameter or initial state given here is held fixed; the
/// rest are estimated when `optimized` is set.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub smoothing_level: Option<f64>,
    pub smoothing_slope: Option<f64>,
    pub smoothing_seasonal: Option<f64>,
    pub damping_slope: Option<f64>,
    pub initial_level: Option<f64>,
    pub initial_slope: Option<f64>,
    pub initial_seasons: Option<Vec<f64>>,
    pub optimized: bool,
    pub use_boxcox: BoxCox,
    pub remove_bias: bool,
    pub use_brute: bool,
    /// Starting point for the free parameters, in layout order.
    pub start_params: Option<Vec<f64>>,
    pub optimizer: Optimizer,
    pub max_iter: usize,
    pub tolerance: f64,
    pub max_restarts: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            smoothing_level: None,
            smoothing_slope: None,
            smoothing_seasonal: None,
            damping_slope: None,
            initial_level: None,
            initial_slope: None,
            initial_seasons: None,
            optimized: true,
            use_boxcox: BoxCox::Off,
            remove_bias: false,
            use_brute: true,
            start_params: None,
            optimizer: Optimizer::NelderMead,
            max_iter: 5000,
            tolerance: 1e-10,
            max_restarts: 3,
        }
    }
}

impl FitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_smoothing_level(mut self, alpha: f64) -> Self {
        self.smoothing_level = Some(alpha);
        self
    }

    pub fn with_smoothing_slope(mut self, beta: f64) -> Self {
        self.smoothing_slope = Some(beta);
        self
    }

    pub fn with_smoothing_seasonal(mut self, gamma: f64) -> Self {
        self.smoothing_seasonal = Some(gamma);
        self
    }

    pub fn with_damping_slope(mut self, phi: f64) -> Self {
        self.damping_slope = Some(phi);
        self
    }

    pub fn with_initial_level(mut self, level: f64) -> Self {
        self.initial_level = Some(level);
        self
    }

    pub fn with_initial_slope(mut self, slope: f64) -> Self {
        self.initial_slope = Some(slope);
        self
    }

    pub fn with_initial_seasons(mut self, seasons: Vec<f64>) -> Self {
        self.initial_seasons = Some(seasons);
        self
    }

    pub fn optimized(mut self, optimized: bool) -> Self {
        self.optimized = optimized;
        self
    }

    pub fn with_boxcox(mut self, boxcox: impl Into<BoxCox>) -> Self {
        self.use_boxcox = boxcox.into();
        self
    }

    pub fn remove_bias(mut self, remove: bool) -> Self {
        self.remove_bias = remove;
        self
    }

    pub fn use_brute(mut self, brute: bool) -> Self {
        self.use_brute = brute;
        self
    }

    pub fn with_start_params(mut self, start: Vec<f64>) -> Self {
        self.start_params = Some(start);
        self
    }

    pub fn with_basin_hopping(mut self, config: BasinHoppingConfig) -> Self {
        self.optimizer = Optimizer::BasinHopping(config);
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Check the options against a resolved model specification.
    pub fn validate(&self, spec: &ModelSpec) -> Result<()> {
        let unit = [
            ("smoothing_level", self.smoothing_level),
            ("smoothing_slope", self.smoothing_slope),
            ("smoothing_seasonal", self.smoothing_seasonal),
            ("damping_slope", self.damping_slope),
        ];
        for (name, value) in unit {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(ForecastError::InvalidParameter(format!(
                        "{} must be in [0, 1], got {}",
                        name, v
                    )));
                }
            }
        }

        let absent = [
            ("smoothing_slope", self.smoothing_slope.is_some() && !spec.has_trend()),
            ("initial_slope", self.initial_slope.is_some() && !spec.has_trend()),
            (
                "smoothing_seasonal",
                self.smoothing_seasonal.is_some() && !spec.has_season(),
            ),
            (
                "initial_seasons",
                self.initial_seasons.is_some() && !spec.has_season(),
            ),
            ("damping_slope", self.damping_slope.is_some() && !spec.damped),
        ];
        if let Some((name, _)) = absent.iter().find(|(_, given)| *given) {
            return Err(ForecastError::InvalidSpecification(format!(
                "{} given for a model without that component",
                name
            )));
        }

        if let Some(seasons) = &self.initial_seasons {
            if spec.has_season() {
                let m = spec.seasonal_periods.unwrap_or(0);
                if seasons.len() != m {
                    return Err(ForecastError::DimensionMismatch {
                        expected: m,
                        got: seasons.len(),
                    });
                }
            }
        }

        if let BoxCox::Fixed(lambda) = self.use_boxcox {
            if !lambda.is_finite() {
                return Err(ForecastError::InvalidParameter(format!(
                    "Box-Cox lambda must be finite, got {}",
                    lambda
                )));
            }
        }

        if !self.optimized {
            if self.start_params.is_some() {
                return Err(ForecastError::InvalidSpecification(
                    "start_params requires optimized to be true".to_string(),
                ));
            }
            if matches!(self.optimizer, Optimizer::BasinHopping(_)) {
                return Err(ForecastError::InvalidSpecification(
                    "basin hopping requires optimized to be true".to_string(),
                ));
            }
            let missing = [
                ("smoothing_level", self.smoothing_level.is_none()),
                (
                    "smoothing_slope",
                    spec.has_trend() && self.smoothing_slope.is_none(),
                ),
                (
                    "smoothing_seasonal",
                    spec.has_season() && self.smoothing_seasonal.is_none(),
                ),
                ("damping_slope", spec.damped && self.damping_slope.is_none()),
            ];
            if let Some((name, _)) = missing.iter().find(|(_, absent)| *absent) {
                return Err(ForecastError::InvalidParameter(format!(
                    "{} must be given when optimized is false",
                    name
                )));
            }
        }

        if self.max_iter == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_iter must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn local_config(&self) -> NelderMeadConfig {
        NelderMeadConfig {
            max_iter: self.max_iter,
            tolerance: self.tolerance,
            ..NelderMeadConfig::default()
        }
    }
}

/// Fit `model` according to `config`.
pub(crate) fn fit(model: &ExponentialSmoothing, config: &FitConfig) -> Result<HoltWintersResults> {
    let spec = *model.spec();
    config.validate(&spec)?;

    let data = model.endog();
    if config.use_boxcox.is_active() && !is_boxcox_suitable(data) {
        return Err(ForecastError::NonPositiveData(
            "Box-Cox transform requires strictly positive data".to_string(),
        ));
    }

    let start_lambda = match config.use_boxcox {
        BoxCox::Off => None,
        BoxCox::Log => Some(0.0),
        BoxCox::Fixed(lambda) => Some(lambda),
        BoxCox::Estimate => Some(boxcox_lambda(data)),
    };
    let y: Vec<f64> = match start_lambda {
        Some(lambda) => boxcox(data, lambda),
        None => data.to_vec(),
    };

    let estimate_lambda = config.optimized && config.use_boxcox == BoxCox::Estimate;
    let layout = Layout::new(spec, estimate_lambda);
    let (level0, slope0, seasons0) = heuristic_initial_values(&y, &spec);

    let alpha = config
        .smoothing_level
        .unwrap_or(0.5 / layout.periods.max(1) as f64);
    let mut p = vec![0.0; layout.len()];
    p[ALPHA] = alpha;
    p[BETA] = config.smoothing_slope.unwrap_or(0.1 * alpha);
    p[GAMMA] = config.smoothing_seasonal.unwrap_or(0.05 * (1.0 - alpha));
    p[LEVEL] = config.initial_level.unwrap_or(level0);
    p[SLOPE] = config.initial_slope.unwrap_or(slope0);
    p[PHI] = config.damping_slope.unwrap_or(0.99);
    let seasons = config.initial_seasons.clone().unwrap_or(seasons0);
    p[SEASONS..SEASONS + layout.periods].copy_from_slice(&seasons[..layout.periods]);
    if let (Some(idx), Some(lambda)) = (layout.lambda_index(), start_lambda) {
        p[idx] = lambda;
    }

    let mut free = vec![false; layout.len()];
    if config.optimized {
        free[ALPHA] = config.smoothing_level.is_none();
        free[BETA] = spec.has_trend() && config.smoothing_slope.is_none();
        free[GAMMA] = spec.has_season() && config.smoothing_seasonal.is_none();
        free[LEVEL] = config.initial_level.is_none();
        free[SLOPE] = spec.has_trend() && config.initial_slope.is_none();
        free[PHI] = spec.damped && config.damping_slope.is_none();
        let seasons_free = spec.has_season() && config.initial_seasons.is_none();
        free[SEASONS..SEASONS + layout.periods].fill(seasons_free);
        if let Some(idx) = layout.lambda_index() {
            free[idx] = true;
        }
    }
    let n_free = free.iter().filter(|&&f| f).count();

    let mut warnings = Vec::new();
    let mut summary = None;

    if config.optimized && n_free == 0 {
        warn!(model = %spec, "model has no free parameters to optimize");
        warnings.push(EstimationWarning::NoFreeParameters);
    } else if n_free > 0 {
        if let Some(start) = &config.start_params {
            if start.len() != n_free {
                return Err(ForecastError::DimensionMismatch {
                    expected: n_free,
                    got: start.len(),
                });
            }
        }

        let result = optimize(&layout, &p, &free, data, &y, config);
        debug!(
            model = %spec,
            sse = result.optimal_value,
            iterations = result.iterations,
            converged = result.converged,
            "optimization finished"
        );
        if !result.converged {
            warn!(
                model = %spec,
                iterations = result.iterations,
                "optimization failed to converge, check parameters"
            );
            warnings.push(EstimationWarning::ConvergenceFailure);
        }
        scatter(&mut p, &free, &result.optimal_point);
        summary = Some(OptimizationSummary {
            x: result.optimal_point,
            fun: result.optimal_value,
            iterations: result.iterations,
            converged: result.converged,
        });
    }

    let lambda = match layout.lambda_index() {
        Some(idx) => Some(p[idx]),
        None => start_lambda,
    };
    let y_fit = match lambda {
        Some(l) if Some(l) != start_lambda => boxcox(data, l),
        _ => y,
    };

    let smoothing = layout.smoothing(&p);
    let smoothed = evaluate_reference(spec.variant(), &smoothing, &y_fit);

    let params = HoltWintersParams {
        smoothing_level: p[ALPHA],
        smoothing_slope: if spec.has_trend() { p[BETA] } else { f64::NAN },
        smoothing_seasonal: if spec.has_season() { p[GAMMA] } else { f64::NAN },
        damping_slope: if spec.damped { p[PHI] } else { f64::NAN },
        initial_level: p[LEVEL],
        initial_slope: if spec.has_trend() { p[SLOPE] } else { f64::NAN },
        initial_seasons: smoothing.initial_seasons.clone(),
        use_boxcox: config.use_boxcox,
        lambda,
        remove_bias: config.remove_bias,
    };

    HoltWintersResults::new(
        model.clone(),
        params,
        smoothing,
        smoothed,
        y_fit,
        warnings,
        summary,
    )
}

/// Run the start search and local optimizer over the free entries of `p`.
fn optimize(
    layout: &Layout,
    p: &[f64],
    free: &[bool],
    data: &[f64],
    y: &[f64],
    config: &FitConfig,
) -> NelderMeadResult {
    let variant = layout.spec.variant();
    let lambda_idx = layout.lambda_index();
    let n = data.len() as f64;
    let log_sum: f64 = if lambda_idx.is_some() {
        data.iter().map(|v| v.ln()).sum()
    } else {
        0.0
    };

    let mut workspace = KernelWorkspace::with_capacity(y.len(), layout.periods);
    let mut work = p.to_vec();
    let mut objective = |x: &[f64]| -> f64 {
        scatter(&mut work, free, x);
        if !layout.admissible(&work) {
            return MAX_SEEN;
        }
        let smoothing = layout.smoothing(&work);
        match lambda_idx {
            None => evaluate_fast(variant, &smoothing, y, &mut workspace),
            Some(idx) => {
                let lambda = work[idx];
                let transformed = boxcox(data, lambda);
                let sse = evaluate_fast(variant, &smoothing, &transformed, &mut workspace);
                if sse >= MAX_SEEN || sse <= 0.0 {
                    return MAX_SEEN;
                }
                // Profile likelihood of lambda, including the Jacobian term.
                n * (sse / n).ln() - 2.0 * (lambda - 1.0) * log_sum
            }
        }
    };

    let bounds_full = layout.bounds();
    let bounds = gather(&bounds_full, free);

    // The grid fixes the initial states at their heuristic values, so the
    // default start is searched as well.
    let starts: Vec<Vec<f64>> = match &config.start_params {
        Some(start) => vec![start.clone()],
        None => {
            let x0 = gather(p, free);
            let positions = layout.free_smoothing_positions(free);
            if config.use_brute && !positions.is_empty() {
                let ranges: Vec<(f64, f64)> = positions.iter().map(|_| (0.0, 1.0)).collect();
                let (grid_best, grid_value) = brute(
                    |g: &[f64]| {
                        let mut x = x0.clone();
                        for (&pos, &v) in positions.iter().zip(g) {
                            x[pos] = v;
                        }
                        objective(&x)
                    },
                    &ranges,
                    BRUTE_POINTS,
                );
                debug!(value = grid_value, "brute-force start search finished");
                let mut grid_start = x0.clone();
                for (&pos, &v) in positions.iter().zip(&grid_best) {
                    grid_start[pos] = v;
                }
                vec![x0, grid_start]
            } else {
                vec![x0]
            }
        }
    };

    let mut best: Option<NelderMeadResult> = None;
    let mut iterations = 0;
    for start in &starts {
        let result = match &config.optimizer {
            Optimizer::NelderMead => minimize(
                &mut objective,
                start,
                Some(&bounds),
                &config.local_config(),
                config.max_restarts,
            ),
            Optimizer::BasinHopping(hopping) => {
                // Local searches use the plain fit's settings, so the first one
                // reproduces the Nelder-Mead result.
                let hopping = BasinHoppingConfig {
                    local: config.local_config(),
                    max_restarts: config.max_restarts,
                    ..hopping.clone()
                };
                basin_hopping(&mut objective, start, Some(&bounds), &hopping)
            }
        };
        debug!(
            value = result.optimal_value,
            iterations = result.iterations,
            "local search finished"
        );
        iterations += result.iterations;
        let better = best
            .as_ref()
            .map_or(true, |current| result.optimal_value < current.optimal_value);
        if better {
            best = Some(result);
        }
    }

    // `starts` is never empty.
    let mut best = best.unwrap_or_else(|| NelderMeadResult {
        optimal_point: gather(p, free),
        optimal_value: MAX_SEEN,
        iterations: 0,
        converged: false,
    });
    best.iterations = iterations;
    best
}
