//! Holt-Winters exponential smoothing.
//!
//! - [`components`]: trend and seasonal forms and their update equations
//! - [`kernel`]: the smoothing recursion, in a reference and a fast form
//! - [`ExponentialSmoothing`]: a specification bound to a series, and
//!   [`FitConfig`] to estimate it
//! - [`HoltWintersResults`]: fitted states, forecasts and path simulation
//! - [`HoltWinters`]: the model behind the [`Forecaster`](crate::models::Forecaster) interface

pub mod components;
mod estimator;
mod holt_winters;
pub mod kernel;
mod model;
mod params;
mod results;
mod simulate;

pub use components::{ErrorType, ModelSpec, ModelVariant, SeasonalType, TrendType};
pub use estimator::{BoxCox, FitConfig, Optimizer};
pub use holt_winters::HoltWinters;
pub use kernel::{evaluate_fast, evaluate_reference, KernelWorkspace, SmoothingParams, MAX_SEEN};
pub use model::ExponentialSmoothing;
pub use results::{EstimationWarning, HoltWintersParams, HoltWintersResults, OptimizationSummary};
pub use simulate::{
    DistributionFamily, InnovationSampler, RandomErrors, SimulationConfig, SimulationResult,
};
