//! Optimization utilities for parameter estimation.
//!
//! All routines minimise a black-box objective over box constraints:
//! [`nelder_mead`] for a single local search, [`minimize`] for a local
//! search restarted until it stops improving, [`brute`] for a grid
//! pre-search and [`basin_hopping`] for a randomised global search built on
//! top of [`minimize`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance.
    pub tolerance: f64,
    /// Reflection coefficient (default: 1.0).
    pub alpha: f64,
    /// Expansion coefficient (default: 2.0).
    pub gamma: f64,
    /// Contraction coefficient (default: 0.5).
    pub rho: f64,
    /// Shrinkage coefficient (default: 0.5).
    pub sigma: f64,
    /// Initial simplex step size (default: 0.05).
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Perform Nelder-Mead simplex optimization.
///
/// Points leaving the box are clamped back onto it.
///
/// # Example
/// ```
/// use anofox_holtwinters::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// // Minimize (x-2)^2 + (y-3)^2
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    mut objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: FnMut(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let start = apply_bounds(initial, bounds);
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(start.clone());

    for i in 0..n {
        let mut vertex = start.clone();
        let step = if start[i].abs() > 1e-10 {
            config.initial_step * start[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        // Step inwards when the forward step is swallowed by an upper bound.
        let mut clamped = apply_bounds(&vertex, bounds);
        if clamped[i] == start[i] {
            vertex[i] = start[i] - step;
            clamped = apply_bounds(&vertex, bounds);
        }
        simplex.push(clamped);
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut indices: Vec<usize> = (0..=n).collect();
        indices.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let best_idx = indices[0];
        let worst_idx = indices[n];
        let second_worst_idx = indices[n - 1];

        // Relative spread of objective values across the simplex
        let range = values[worst_idx] - values[best_idx];
        if range <= config.tolerance * (1.0 + values[best_idx].abs()) {
            converged = true;
            break;
        }

        let centroid = compute_centroid(&simplex, worst_idx);
        let max_dist = simplex
            .iter()
            .map(|v| euclidean_distance(v, &centroid))
            .fold(0.0, f64::max);
        if max_dist < config.tolerance {
            converged = true;
            break;
        }

        let reflected = apply_bounds(&reflect(&simplex[worst_idx], &centroid, config.alpha), bounds);
        let reflected_value = objective(&reflected);

        if reflected_value < values[second_worst_idx] && reflected_value >= values[best_idx] {
            simplex[worst_idx] = reflected;
            values[worst_idx] = reflected_value;
            continue;
        }

        if reflected_value < values[best_idx] {
            let expanded = apply_bounds(&expand(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = objective(&expanded);

            if expanded_value < reflected_value {
                simplex[worst_idx] = expanded;
                values[worst_idx] = expanded_value;
            } else {
                simplex[worst_idx] = reflected;
                values[worst_idx] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[worst_idx] {
            // Outside contraction
            let contracted = apply_bounds(&contract(&centroid, &reflected, config.rho), bounds);
            let contracted_value = objective(&contracted);

            if contracted_value <= reflected_value {
                simplex[worst_idx] = contracted;
                values[worst_idx] = contracted_value;
                continue;
            }
        } else {
            // Inside contraction
            let contracted =
                apply_bounds(&contract(&centroid, &simplex[worst_idx], config.rho), bounds);
            let contracted_value = objective(&contracted);

            if contracted_value < values[worst_idx] {
                simplex[worst_idx] = contracted;
                values[worst_idx] = contracted_value;
                continue;
            }
        }

        // Shrink towards the best vertex
        let best = simplex[best_idx].clone();
        for i in 0..=n {
            if i != best_idx {
                for j in 0..n {
                    simplex[i][j] = best[j] + config.sigma * (simplex[i][j] - best[j]);
                }
                simplex[i] = apply_bounds(&simplex[i], bounds);
                values[i] = objective(&simplex[i]);
            }
        }
    }

    let best_idx = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: simplex[best_idx].clone(),
        optimal_value: values[best_idx],
        iterations,
        converged,
    }
}

/// Nelder-Mead restarted from its own optimum until it stops improving.
///
/// Each restart builds a fresh simplex around the previous optimum. The
/// returned value is never worse than the objective at `initial`.
pub fn minimize<F>(
    mut objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
    max_restarts: usize,
) -> NelderMeadResult
where
    F: FnMut(&[f64]) -> f64,
{
    let mut best = nelder_mead(&mut objective, initial, bounds, config.clone());
    let mut iterations = best.iterations;

    for _ in 0..max_restarts {
        if best.optimal_point.is_empty() {
            break;
        }
        let next = nelder_mead(&mut objective, &best.optimal_point, bounds, config.clone());
        iterations += next.iterations;

        let threshold = config.tolerance * (1.0 + best.optimal_value.abs());
        let improved = next.optimal_value < best.optimal_value - threshold;
        if next.optimal_value < best.optimal_value {
            best = next;
        }
        if !improved {
            break;
        }
    }

    best.iterations = iterations;
    best
}

/// Exhaustive grid search.
///
/// Each axis is sampled at `points` evenly spaced values spanning its range
/// inclusively. Returns the best grid point and its objective value.
pub fn brute<F>(mut objective: F, ranges: &[(f64, f64)], points: usize) -> (Vec<f64>, f64)
where
    F: FnMut(&[f64]) -> f64,
{
    let dims = ranges.len();
    if dims == 0 || points == 0 {
        let value = objective(&[]);
        return (vec![], value);
    }

    let axis = |d: usize, k: usize| -> f64 {
        let (lo, hi) = ranges[d];
        if points == 1 {
            lo
        } else {
            lo + (hi - lo) * k as f64 / (points - 1) as f64
        }
    };

    let mut counter = vec![0usize; dims];
    let mut point: Vec<f64> = (0..dims).map(|d| axis(d, 0)).collect();
    let mut best_point = point.clone();
    let mut best_value = f64::INFINITY;

    loop {
        let value = objective(&point);
        if value < best_value {
            best_value = value;
            best_point.copy_from_slice(&point);
        }

        // Odometer increment over the grid
        let mut d = 0;
        loop {
            if d == dims {
                return (best_point, best_value);
            }
            counter[d] += 1;
            if counter[d] < points {
                point[d] = axis(d, counter[d]);
                break;
            }
            counter[d] = 0;
            point[d] = axis(d, 0);
            d += 1;
        }
    }
}

/// Configuration for basin hopping.
#[derive(Debug, Clone)]
pub struct BasinHoppingConfig {
    /// Number of perturbation rounds.
    pub niter: usize,
    /// Half-width of the uniform perturbation applied to each coordinate.
    pub step_size: f64,
    /// Metropolis temperature for accepting uphill moves.
    pub temperature: f64,
    /// Random seed (None for entropy).
    pub seed: Option<u64>,
    /// Settings for each local search.
    pub local: NelderMeadConfig,
    /// Restarts per local search.
    pub max_restarts: usize,
}

impl Default for BasinHoppingConfig {
    fn default() -> Self {
        Self {
            niter: 100,
            step_size: 0.01,
            temperature: 1.0,
            seed: None,
            local: NelderMeadConfig::default(),
            max_restarts: 3,
        }
    }
}

impl BasinHoppingConfig {
    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_local(mut self, local: NelderMeadConfig) -> Self {
        self.local = local;
        self
    }
}

/// Global minimisation by repeated perturbation and local search.
///
/// The first local search starts at `initial` exactly as [`minimize`]
/// would, and only improvements replace the best point, so the result is
/// never worse than a plain local search from the same start.
pub fn basin_hopping<F>(
    mut objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &BasinHoppingConfig,
) -> NelderMeadResult
where
    F: FnMut(&[f64]) -> f64,
{
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut current = minimize(
        &mut objective,
        initial,
        bounds,
        &config.local,
        config.max_restarts,
    );
    let mut best = current.clone();
    let mut iterations = current.iterations;

    if initial.is_empty() || config.step_size <= 0.0 {
        return best;
    }

    for _ in 0..config.niter {
        let trial: Vec<f64> = current
            .optimal_point
            .iter()
            .map(|&x| x + rng.gen_range(-config.step_size..=config.step_size))
            .collect();
        let trial = apply_bounds(&trial, bounds);

        let candidate = minimize(
            &mut objective,
            &trial,
            bounds,
            &config.local,
            config.max_restarts,
        );
        iterations += candidate.iterations;

        if candidate.optimal_value < best.optimal_value {
            best = candidate.clone();
        }

        let delta = candidate.optimal_value - current.optimal_value;
        let accept = delta < 0.0
            || (config.temperature > 0.0
                && rng.gen::<f64>() < (-delta / config.temperature).exp());
        if accept {
            current = candidate;
        }
    }

    best.iterations = iterations;
    best
}

/// Compute centroid of simplex excluding the worst vertex.
fn compute_centroid(simplex: &[Vec<f64>], exclude_idx: usize) -> Vec<f64> {
    let n = simplex[0].len();
    let count = simplex.len() - 1;
    let mut centroid = vec![0.0; n];

    for (i, vertex) in simplex.iter().enumerate() {
        if i != exclude_idx {
            for j in 0..n {
                centroid[j] += vertex[j];
            }
        }
    }

    for c in &mut centroid {
        *c /= count as f64;
    }

    centroid
}

fn reflect(point: &[f64], centroid: &[f64], alpha: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point.iter())
        .map(|(c, p)| c + alpha * (c - p))
        .collect()
}

fn expand(centroid: &[f64], reflected: &[f64], gamma: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(reflected.iter())
        .map(|(c, r)| c + gamma * (r - c))
        .collect()
}

fn contract(centroid: &[f64], point: &[f64], rho: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point.iter())
        .map(|(c, p)| c + rho * (p - c))
        .collect()
}

/// Clamp a point into the box. Bounds may be infinite.
fn apply_bounds(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point.to_vec(),
        Some(b) => point
            .iter()
            .enumerate()
            .map(|(i, &x)| match b.get(i) {
                Some(&(lo, hi)) => x.max(lo).min(hi),
                None => x,
            })
            .collect(),
    }
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
