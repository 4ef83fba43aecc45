//! Data transformations for time series.
//!
//! # Example
//!
//! ```
//! use anofox_holtwinters::transform::{boxcox, boxcox_lambda, inv_boxcox};
//!
//! let series = vec![1.0, 2.0, 4.0, 8.0, 16.0];
//! let lambda = boxcox_lambda(&series);
//! let restored = inv_boxcox(&boxcox(&series, lambda), lambda);
//! assert!((restored[4] - 16.0).abs() < 1e-8);
//! ```

pub mod boxcox;

pub use boxcox::{
    boxcox, boxcox_lambda, boxcox_value, inv_boxcox, inv_boxcox_value, is_boxcox_suitable,
};
