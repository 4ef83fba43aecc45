//! Parameter vector layout, start values and bounds used during estimation.
//!
//! The full vector is `[alpha, beta, gamma, l0, b0, phi, s0 .. s(m-1), lambda]`,
//! where the trailing lambda is present only when the Box-Cox parameter is
//! estimated jointly. A boolean mask marks the entries the optimizer moves.

use super::components::{ModelSpec, SeasonalType, TrendType};
use super::kernel::SmoothingParams;

pub(crate) const ALPHA: usize = 0;
pub(crate) const BETA: usize = 1;
pub(crate) const GAMMA: usize = 2;
pub(crate) const LEVEL: usize = 3;
pub(crate) const SLOPE: usize = 4;
pub(crate) const PHI: usize = 5;
pub(crate) const SEASONS: usize = 6;

/// Search range for a jointly estimated Box-Cox lambda.
pub(crate) const LAMBDA_BOUNDS: (f64, f64) = (-1.0, 2.0);

/// Smallest value accepted for strictly positive states.
const POSITIVE_FLOOR: f64 = 1e-8;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Layout {
    pub spec: ModelSpec,
    pub periods: usize,
    pub with_lambda: bool,
}

impl Layout {
    pub fn new(spec: ModelSpec, with_lambda: bool) -> Self {
        let periods = if spec.has_season() {
            spec.seasonal_periods.unwrap_or(0)
        } else {
            0
        };
        Self {
            spec,
            periods,
            with_lambda,
        }
    }

    pub fn len(&self) -> usize {
        SEASONS + self.periods + usize::from(self.with_lambda)
    }

    pub fn lambda_index(&self) -> Option<usize> {
        self.with_lambda.then(|| SEASONS + self.periods)
    }

    /// Kernel parameters read from a full vector.
    pub fn smoothing(&self, p: &[f64]) -> SmoothingParams {
        SmoothingParams {
            alpha: p[ALPHA],
            beta: if self.spec.has_trend() { p[BETA] } else { 0.0 },
            gamma: if self.spec.has_season() { p[GAMMA] } else { 0.0 },
            phi: if self.spec.damped { p[PHI] } else { 1.0 },
            initial_level: p[LEVEL],
            initial_trend: if self.spec.has_trend() { p[SLOPE] } else { 0.0 },
            initial_seasons: p[SEASONS..SEASONS + self.periods].to_vec(),
        }
    }

    /// Box constraints for every entry of the full vector.
    pub fn bounds(&self) -> Vec<(f64, f64)> {
        let unit = (0.0, 1.0);
        let free = (f64::NEG_INFINITY, f64::INFINITY);
        let positive = (POSITIVE_FLOOR, f64::INFINITY);

        let level = if self.spec.is_multiplicative() {
            positive
        } else {
            free
        };
        let slope = match self.spec.trend {
            TrendType::Multiplicative => positive,
            _ => free,
        };
        let season = match self.spec.seasonal {
            SeasonalType::Multiplicative => positive,
            _ => free,
        };

        let mut bounds = vec![unit, unit, unit, level, slope, unit];
        bounds.extend(std::iter::repeat(season).take(self.periods));
        if self.with_lambda {
            bounds.push(LAMBDA_BOUNDS);
        }
        bounds
    }

    /// Indices of the smoothing parameters among the free entries, in the
    /// order they appear in the compressed vector.
    pub fn free_smoothing_positions(&self, free: &[bool]) -> Vec<usize> {
        let mut positions = Vec::new();
        let mut compressed = 0;
        for (i, &is_free) in free.iter().enumerate() {
            if !is_free {
                continue;
            }
            if matches!(i, ALPHA | BETA | GAMMA | PHI) {
                positions.push(compressed);
            }
            compressed += 1;
        }
        positions
    }

    /// Whether the smoothing weights lie in the admissible region.
    ///
    /// Outside it the objective reports the overflow sentinel.
    pub fn admissible(&self, p: &[f64]) -> bool {
        let alpha = p[ALPHA];
        if self.spec.has_trend() && (alpha == 0.0 || p[BETA] > alpha) {
            return false;
        }
        if self.spec.has_season() && (alpha == 0.0 || p[GAMMA] > 1.0 - alpha) {
            return false;
        }
        true
    }
}

/// Write the compressed free vector `x` into the full vector `p`.
pub(crate) fn scatter(p: &mut [f64], free: &[bool], x: &[f64]) {
    let mut values = x.iter();
    for (slot, &is_free) in p.iter_mut().zip(free) {
        if is_free {
            if let Some(&v) = values.next() {
                *slot = v;
            }
        }
    }
}

/// Free entries of `p`, in order.
pub(crate) fn gather<T: Copy>(p: &[T], free: &[bool]) -> Vec<T> {
    p.iter()
        .zip(free)
        .filter(|(_, &is_free)| is_free)
        .map(|(&v, _)| v)
        .collect()
}

/// Heuristic initial states `(l0, b0, s0)` from the leading observations.
///
/// Seasonal models average the first observation of every cycle for the
/// level, take the mean per-period change between the first two periods
/// for the slope and express the first period relative to the level for
/// the seasons. Other
/// models start from the first observation and, if trending, the first
/// difference (or ratio).
pub(crate) fn heuristic_initial_values(y: &[f64], spec: &ModelSpec) -> (f64, f64, Vec<f64>) {
    let m = if spec.has_season() {
        spec.seasonal_periods.unwrap_or(0)
    } else {
        0
    };

    if m > 0 && y.len() >= m {
        let first: Vec<f64> = y.iter().step_by(m).copied().collect();
        let level = mean(&first);

        let slope = if spec.has_trend() && y.len() >= 2 * m {
            let lead = &y[m..2 * m];
            let lag = &y[..m];
            match spec.trend {
                TrendType::Multiplicative => ((mean(lead).ln() - mean(lag).ln()) / m as f64).exp(),
                _ => lead
                    .iter()
                    .zip(lag)
                    .map(|(a, b)| (a - b) / m as f64)
                    .sum::<f64>()
                    / m as f64,
            }
        } else {
            neutral_slope(spec.trend)
        };

        let seasons = match spec.seasonal {
            SeasonalType::Multiplicative => y[..m].iter().map(|v| v / level).collect(),
            _ => y[..m].iter().map(|v| v - level).collect(),
        };
        return (level, slope, seasons);
    }

    let level = y.first().copied().unwrap_or(0.0);
    let slope = match (spec.trend, y.get(1)) {
        (TrendType::Additive, Some(&second)) => second - level,
        (TrendType::Multiplicative, Some(&second)) => second / level,
        _ => neutral_slope(spec.trend),
    };
    (level, slope, Vec::new())
}

fn neutral_slope(trend: TrendType) -> f64 {
    match trend {
        TrendType::Multiplicative => 1.0,
        _ => 0.0,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
