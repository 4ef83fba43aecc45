//! Core data structures for time series forecasting.

mod forecast;
mod location;
mod time_series;

pub use forecast::Forecast;
pub use location::Location;
pub use time_series::{Frequency, TimeSeries, ValueLayout};
