//! # anofox-holtwinters
//!
//! Holt-Winters exponential smoothing: parameter estimation, point
//! forecasts and Monte-Carlo simulation of future paths.
//!
//! All nine trend × seasonal combinations (none, additive, multiplicative)
//! are supported, with optional damping and Box-Cox transformation.
//!
//! ```
//! use anofox_holtwinters::prelude::*;
//!
//! let values = vec![446.7, 454.5, 455.7, 423.6, 456.3, 440.6, 425.3, 485.1, 506.0, 526.8];
//! let model = ExponentialSmoothing::holt(&TimeSeries::from_values(values), false, true).unwrap();
//! let fit = model.fit(&FitConfig::default()).unwrap();
//!
//! let forecast = fit.forecast(3).unwrap();
//! let paths = fit
//!     .simulate(&SimulationConfig::new(3).with_repetitions(100).with_seed(0))
//!     .unwrap();
//! assert_eq!(forecast.len(), 3);
//! assert_eq!(paths.repetitions(), 100);
//! ```

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod models;
pub mod transform;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, Frequency, Location, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::exponential::{
        BoxCox, ErrorType, ExponentialSmoothing, FitConfig, HoltWinters, HoltWintersResults,
        ModelSpec, RandomErrors, SeasonalType, SimulationConfig, TrendType,
    };
    pub use crate::models::Forecaster;
}
