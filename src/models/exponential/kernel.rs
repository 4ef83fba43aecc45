//! Holt-Winters recursion kernel.
//!
//! Two evaluators compute the same recursion:
//!
//! - [`evaluate_reference`] drives the per-variant [`Equations`] table and
//!   materialises every state trajectory. Fitting results are built from it.
//! - [`evaluate_fast`] is monomorphised over the trend and seasonal forms,
//!   reuses a [`KernelWorkspace`] and accumulates the SSE inside the loop.
//!   The optimizer calls it thousands of times per fit.
//!
//! State layout: `level` and `trend` hold `n + 1` values, index 0 being
//! the initial state and index `t + 1` the state after observation `t`.
//! `season` holds `n + m` values; the first `m` are the initial seasonal
//! states and observation `t` reads `season[t]` and writes `season[t + m]`.
//! Non-seasonal variants use `m = 1` with a neutral state of zero.

use super::components::{Equations, ModelVariant, Weights};

/// Objective value reported when any state or the SSE leaves the finite
/// range.
pub const MAX_SEEN: f64 = f64::MAX;

#[inline]
fn is_bounded(value: f64) -> bool {
    value.abs() <= MAX_SEEN
}

/// Smoothing weights and initial states for one kernel evaluation.
///
/// `beta`, `gamma` and `initial_trend` are ignored for variants without the
/// matching component. `phi` is 1.0 for undamped models.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub phi: f64,
    pub initial_level: f64,
    pub initial_trend: f64,
    pub initial_seasons: Vec<f64>,
}

impl SmoothingParams {
    pub(crate) fn weights(&self) -> Weights {
        Weights {
            alpha: self.alpha,
            beta: self.beta,
            gamma: self.gamma,
            phi: self.phi,
        }
    }

    fn period(&self, variant: ModelVariant) -> usize {
        if variant.has_season() {
            self.initial_seasons.len().max(1)
        } else {
            1
        }
    }
}

/// State trajectories, one-step fitted values and SSE of a reference run.
#[derive(Debug, Clone, PartialEq)]
pub struct Smoothed {
    pub level: Vec<f64>,
    pub trend: Vec<f64>,
    pub season: Vec<f64>,
    pub fitted: Vec<f64>,
    pub sse: f64,
    pub period: usize,
}

/// Reference evaluation: full trajectories, then a separate SSE pass.
///
/// `sse` is [`MAX_SEEN`] if any state or the SSE is non-finite.
pub fn evaluate_reference(variant: ModelVariant, params: &SmoothingParams, y: &[f64]) -> Smoothed {
    let eq: Equations = variant.equations();
    let w = params.weights();
    let n = y.len();
    let m = params.period(variant);

    let mut level = vec![0.0; n + 1];
    let mut trend = vec![0.0; n + 1];
    let mut season = vec![0.0; n + m];

    level[0] = params.initial_level;
    if eq.has_trend {
        trend[0] = params.initial_trend;
    }
    if eq.has_season {
        season[..m].copy_from_slice(&params.initial_seasons[..m]);
    }

    for (t, &obs) in y.iter().enumerate() {
        let next = eq.step(&w, level[t], trend[t], season[t], obs);
        level[t + 1] = next.level;
        trend[t + 1] = next.trend;
        season[t + m] = next.season;
    }

    let fitted: Vec<f64> = (0..n)
        .map(|t| eq.predict(level[t], trend[t], season[t], w.phi))
        .collect();
    let sse: f64 = y
        .iter()
        .zip(&fitted)
        .map(|(obs, fit)| (obs - fit) * (obs - fit))
        .sum();

    let overflow = !is_bounded(sse)
        || level
            .iter()
            .chain(&trend)
            .chain(&season)
            .any(|&v| !is_bounded(v));

    Smoothed {
        level,
        trend,
        season,
        fitted,
        sse: if overflow { MAX_SEEN } else { sse },
        period: m,
    }
}

/// Reusable state buffers for [`evaluate_fast`].
#[derive(Debug, Clone, Default)]
pub struct KernelWorkspace {
    level: Vec<f64>,
    trend: Vec<f64>,
    season: Vec<f64>,
}

impl KernelWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Workspace pre-sized for `n` observations and period `m`.
    pub fn with_capacity(n: usize, m: usize) -> Self {
        Self {
            level: Vec::with_capacity(n + 1),
            trend: Vec::with_capacity(n + 1),
            season: Vec::with_capacity(n + m.max(1)),
        }
    }

    fn reset(&mut self, n: usize, m: usize) {
        self.level.clear();
        self.level.resize(n + 1, 0.0);
        self.trend.clear();
        self.trend.resize(n + 1, 0.0);
        self.season.clear();
        self.season.resize(n + m, 0.0);
    }

    /// Level trajectory of the last evaluation.
    ///
    /// Only meaningful when that evaluation did not return [`MAX_SEEN`].
    pub fn level(&self) -> &[f64] {
        &self.level
    }

    pub fn trend(&self) -> &[f64] {
        &self.trend
    }

    pub fn season(&self) -> &[f64] {
        &self.season
    }
}

trait TrendForm {
    const ACTIVE: bool;
    fn carry(level: f64, damped: f64) -> f64;
    fn damp(trend: f64, phi: f64) -> f64;
    fn growth(level: f64, previous: f64) -> f64;
}

trait SeasonForm {
    const ACTIVE: bool;
    fn apply(base: f64, season: f64) -> f64;
    fn remove(value: f64, season: f64) -> f64;
}

struct NoTrend;
struct AddTrend;
struct MulTrend;
struct NoSeason;
struct AddSeason;
struct MulSeason;

impl TrendForm for NoTrend {
    const ACTIVE: bool = false;
    #[inline(always)]
    fn carry(level: f64, _: f64) -> f64 {
        level
    }
    #[inline(always)]
    fn damp(_: f64, _: f64) -> f64 {
        0.0
    }
    #[inline(always)]
    fn growth(_: f64, _: f64) -> f64 {
        0.0
    }
}

impl TrendForm for AddTrend {
    const ACTIVE: bool = true;
    #[inline(always)]
    fn carry(level: f64, damped: f64) -> f64 {
        level + damped
    }
    #[inline(always)]
    fn damp(trend: f64, phi: f64) -> f64 {
        phi * trend
    }
    #[inline(always)]
    fn growth(level: f64, previous: f64) -> f64 {
        level - previous
    }
}

impl TrendForm for MulTrend {
    const ACTIVE: bool = true;
    #[inline(always)]
    fn carry(level: f64, damped: f64) -> f64 {
        level * damped
    }
    #[inline(always)]
    fn damp(trend: f64, phi: f64) -> f64 {
        trend.powf(phi)
    }
    #[inline(always)]
    fn growth(level: f64, previous: f64) -> f64 {
        level / previous
    }
}

impl SeasonForm for NoSeason {
    const ACTIVE: bool = false;
    #[inline(always)]
    fn apply(base: f64, _: f64) -> f64 {
        base
    }
    #[inline(always)]
    fn remove(value: f64, _: f64) -> f64 {
        value
    }
}

impl SeasonForm for AddSeason {
    const ACTIVE: bool = true;
    #[inline(always)]
    fn apply(base: f64, season: f64) -> f64 {
        base + season
    }
    #[inline(always)]
    fn remove(value: f64, season: f64) -> f64 {
        value - season
    }
}

impl SeasonForm for MulSeason {
    const ACTIVE: bool = true;
    #[inline(always)]
    fn apply(base: f64, season: f64) -> f64 {
        base * season
    }
    #[inline(always)]
    fn remove(value: f64, season: f64) -> f64 {
        value / season
    }
}

/// Fast evaluation returning only the SSE.
///
/// Agrees with [`evaluate_reference`] on the SSE, including the
/// [`MAX_SEEN`] sentinel. The workspace holds the trajectories afterwards
/// unless the run was cut short by a non-finite state.
pub fn evaluate_fast(
    variant: ModelVariant,
    params: &SmoothingParams,
    y: &[f64],
    workspace: &mut KernelWorkspace,
) -> f64 {
    match variant {
        ModelVariant::NoneNone => run::<NoTrend, NoSeason>(params, y, workspace),
        ModelVariant::NoneAdd => run::<NoTrend, AddSeason>(params, y, workspace),
        ModelVariant::NoneMul => run::<NoTrend, MulSeason>(params, y, workspace),
        ModelVariant::AddNone => run::<AddTrend, NoSeason>(params, y, workspace),
        ModelVariant::AddAdd => run::<AddTrend, AddSeason>(params, y, workspace),
        ModelVariant::AddMul => run::<AddTrend, MulSeason>(params, y, workspace),
        ModelVariant::MulNone => run::<MulTrend, NoSeason>(params, y, workspace),
        ModelVariant::MulAdd => run::<MulTrend, AddSeason>(params, y, workspace),
        ModelVariant::MulMul => run::<MulTrend, MulSeason>(params, y, workspace),
    }
}

fn run<T: TrendForm, S: SeasonForm>(
    params: &SmoothingParams,
    y: &[f64],
    ws: &mut KernelWorkspace,
) -> f64 {
    let n = y.len();
    let m = if S::ACTIVE {
        params.initial_seasons.len().max(1)
    } else {
        1
    };
    ws.reset(n, m);

    let alpha = params.alpha;
    let alphac = 1.0 - alpha;
    let beta = params.beta;
    let betac = 1.0 - beta;
    let gamma = params.gamma;
    let gammac = 1.0 - gamma;
    let phi = params.phi;

    ws.level[0] = params.initial_level;
    if T::ACTIVE {
        ws.trend[0] = params.initial_trend;
    }
    if S::ACTIVE {
        ws.season[..m].copy_from_slice(&params.initial_seasons[..m]);
    }
    if !is_bounded(ws.level[0]) || !is_bounded(ws.trend[0]) {
        return MAX_SEEN;
    }
    if ws.season[..m].iter().any(|&s| !is_bounded(s)) {
        return MAX_SEEN;
    }

    let mut sse = 0.0;
    for (t, &obs) in y.iter().enumerate() {
        let level = ws.level[t];
        let trend = ws.trend[t];
        let season = ws.season[t];

        let damped = T::damp(trend, phi);
        let carried = T::carry(level, damped);
        let err = obs - S::apply(carried, season);
        sse += err * err;

        let new_level = alpha * S::remove(obs, season) + alphac * carried;
        if !is_bounded(new_level) {
            return MAX_SEEN;
        }
        ws.level[t + 1] = new_level;

        ws.trend[t + 1] = if T::ACTIVE {
            let new_trend = beta * T::growth(new_level, level) + betac * damped;
            if !is_bounded(new_trend) {
                return MAX_SEEN;
            }
            new_trend
        } else {
            trend
        };

        ws.season[t + m] = if S::ACTIVE {
            let new_season = gamma * S::remove(obs, carried) + gammac * season;
            if !is_bounded(new_season) {
                return MAX_SEEN;
            }
            new_season
        } else {
            season
        };
    }

    if is_bounded(sse) {
        sse
    } else {
        MAX_SEEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exponential::components::{SeasonalType, TrendType};
    use approx::assert_relative_eq;

    fn quarterly() -> Vec<f64> {
        vec![
            30.05, 19.15, 25.32, 27.59, 32.08, 23.87, 28.05, 29.96, 33.71, 24.19, 29.27, 32.10,
            35.47, 26.30, 30.12, 34.12, 37.15, 27.84, 32.35, 35.96,
        ]
    }

    fn params(variant: ModelVariant) -> SmoothingParams {
        let seasons = match variant.seasonal() {
            SeasonalType::Multiplicative => vec![1.1, 0.8, 0.95, 1.05],
            _ => vec![3.0, -6.0, 0.0, 2.0],
        };
        let trend = match variant.trend() {
            TrendType::Multiplicative => 1.01,
            _ => 0.3,
        };
        SmoothingParams {
            alpha: 0.4,
            beta: 0.1,
            gamma: 0.2,
            phi: 0.95,
            initial_level: 27.0,
            initial_trend: trend,
            initial_seasons: seasons,
        }
    }

    #[test]
    fn fast_and_reference_agree_for_every_variant() {
        let y = quarterly();
        let mut ws = KernelWorkspace::new();
        for variant in ModelVariant::ALL {
            let p = params(variant);
            let reference = evaluate_reference(variant, &p, &y);
            let fast = evaluate_fast(variant, &p, &y, &mut ws);
            assert_relative_eq!(reference.sse, fast, max_relative = 1e-12);
            assert_eq!(reference.level, ws.level());
            assert_eq!(reference.season, ws.season());
        }
    }

    #[test]
    fn simple_smoothing_matches_hand_recursion() {
        let y = [10.0, 12.0, 11.0];
        let p = SmoothingParams {
            alpha: 0.5,
            beta: 0.0,
            gamma: 0.0,
            phi: 1.0,
            initial_level: 10.0,
            initial_trend: 0.0,
            initial_seasons: vec![],
        };
        let out = evaluate_reference(ModelVariant::NoneNone, &p, &y);

        assert_eq!(out.level, vec![10.0, 10.0, 11.0, 11.0]);
        assert_eq!(out.fitted, vec![10.0, 10.0, 11.0]);
        assert_relative_eq!(out.sse, 4.0, epsilon = 1e-12);
        assert_eq!(out.season.len(), 4);
        assert!(out.trend.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn seasonal_layout_has_n_plus_m_states() {
        let y = quarterly();
        let variant = ModelVariant::AddAdd;
        let out = evaluate_reference(variant, &params(variant), &y);
        assert_eq!(out.level.len(), y.len() + 1);
        assert_eq!(out.season.len(), y.len() + 4);
        assert_eq!(&out.season[..4], &[3.0, -6.0, 0.0, 2.0]);
        assert_eq!(out.period, 4);
    }

    #[test]
    fn overflow_reports_sentinel_on_both_paths() {
        let y = [1.0, 1e300, 1e308, 1e308];
        let p = SmoothingParams {
            alpha: 1.0,
            beta: 1.0,
            gamma: 0.0,
            phi: 1.0,
            initial_level: 1.0,
            initial_trend: 1e308,
            initial_seasons: vec![],
        };
        let mut ws = KernelWorkspace::new();
        assert_eq!(evaluate_reference(ModelVariant::AddNone, &p, &y).sse, MAX_SEEN);
        assert_eq!(evaluate_fast(ModelVariant::AddNone, &p, &y, &mut ws), MAX_SEEN);
    }

    #[test]
    fn nan_from_negative_growth_is_sentinel() {
        let y = [5.0, 6.0, 7.0];
        let p = SmoothingParams {
            alpha: 0.5,
            beta: 0.5,
            gamma: 0.0,
            phi: 0.5,
            initial_level: 5.0,
            initial_trend: -1.0,
            initial_seasons: vec![],
        };
        let mut ws = KernelWorkspace::new();
        assert_eq!(evaluate_reference(ModelVariant::MulNone, &p, &y).sse, MAX_SEEN);
        assert_eq!(evaluate_fast(ModelVariant::MulNone, &p, &y, &mut ws), MAX_SEEN);
    }

    #[test]
    fn workspace_is_reusable_across_shapes() {
        let y = quarterly();
        let mut ws = KernelWorkspace::with_capacity(4, 1);
        let seasonal = evaluate_fast(ModelVariant::AddAdd, &params(ModelVariant::AddAdd), &y, &mut ws);
        let plain = evaluate_fast(
            ModelVariant::NoneNone,
            &params(ModelVariant::NoneNone),
            &y[..5],
            &mut ws,
        );
        assert!(seasonal.is_finite());
        assert!(plain.is_finite());
        assert_eq!(ws.level().len(), 6);
    }
}
