//! Utility functions for fitting and simulation.

pub mod bootstrap;
pub mod optimization;
pub mod stats;

pub use bootstrap::{percentile_bounds, resample_residuals};
pub use optimization::{
    basin_hopping, brute, minimize, nelder_mead, BasinHoppingConfig, NelderMeadConfig,
    NelderMeadResult,
};
pub use stats::{mean, median, quantile};
