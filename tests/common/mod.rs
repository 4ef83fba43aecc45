//! Shared datasets for integration tests.

#![allow(dead_code)]

use anofox_holtwinters::core::{Frequency, TimeSeries};
use chrono::{TimeZone, Utc};

/// Series with a calendar index starting at `year-month-day`.
pub fn dated(values: &[f64], year: i32, month: u32, day: u32, frequency: Frequency) -> TimeSeries {
    let start = Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap();
    let timestamps = (0..values.len())
        .map(|i| frequency.advance(start, i as i64).unwrap())
        .collect();
    TimeSeries::univariate(timestamps, values.to_vec()).unwrap()
}

/// Annual oil production, 1996-2007.
pub fn oil() -> TimeSeries {
    let values = [
        446.6565229, 454.4733065, 455.662974, 423.6322388, 456.2713279, 440.5880501,
        425.3325201, 485.1494479, 506.0481621, 526.7919833, 514.268889, 494.2110193,
    ];
    dated(&values, 1996, 12, 31, Frequency::Monthly { months: 12, month_end: true })
}

/// Annual air passengers, 1990-2004.
pub fn air() -> TimeSeries {
    let values = [
        17.5534, 21.8601, 23.8866, 26.9293, 26.8885, 28.8314, 30.0751, 30.9535, 30.1857,
        31.5797, 32.577569, 33.477398, 39.021581, 41.386432, 41.596552,
    ];
    dated(&values, 1990, 12, 31, Frequency::Monthly { months: 12, month_end: true })
}

/// Annual livestock counts, 1970-2000.
pub fn livestock() -> TimeSeries {
    let values = [
        263.917747, 268.307222, 260.662556, 266.639419, 277.515778, 283.834045, 290.309028,
        292.474198, 300.830694, 309.286657, 318.331081, 329.37239, 338.883998, 339.244126,
        328.600632, 314.255385, 314.459695, 321.413779, 329.789292, 346.385165, 352.297882,
        348.370515, 417.562922, 417.12357, 417.749459, 412.233904, 411.946817, 394.697075,
        401.49927, 408.270468, 414.2428,
    ];
    dated(&values, 1970, 12, 31, Frequency::Monthly { months: 12, month_end: true })
}

pub const AUST: [f64; 24] = [
    41.727458, 24.04185, 32.328103, 37.328708, 46.213153, 29.346326, 36.48291, 42.977719,
    48.901525, 31.180221, 37.717881, 40.420211, 51.206863, 31.887228, 40.978263, 43.772491,
    55.558567, 33.850915, 42.076383, 45.642292, 59.76678, 35.191877, 44.319737, 47.913736,
];

/// Quarterly visitor nights, 2005Q1-2010Q4.
pub fn aust() -> TimeSeries {
    dated(&AUST, 2005, 3, 1, Frequency::quarterly())
}

/// Quarterly international tourist nights in Australia, 1999Q1-2015Q4.
pub fn austourists() -> TimeSeries {
    let values = [
        30.05251, 19.14850, 25.31769, 27.59144, 32.07646, 23.48796, 28.47594, 35.12375,
        36.83848, 25.00702, 30.72223, 28.69376, 36.64099, 23.82461, 29.31168, 31.77031,
        35.17788, 19.77524, 29.60175, 34.53884, 41.27360, 26.65586, 28.27986, 35.19115,
        42.20566, 24.64917, 32.66734, 37.25735, 45.24246, 29.35048, 36.34421, 41.78208,
        49.27660, 31.27540, 37.85063, 38.83704, 51.23690, 31.83855, 41.32342, 42.79900,
        55.70836, 33.40714, 42.31664, 45.15712, 59.57608, 34.83733, 44.84168, 46.97125,
        60.01903, 38.37118, 46.97586, 50.73380, 61.64687, 39.29957, 52.67121, 54.33232,
        66.83436, 40.87119, 51.82854, 57.49191, 65.25147, 43.06121, 54.76076, 59.83447,
        73.25703, 47.69662, 61.09777, 66.05576,
    ];
    dated(&values, 1999, 3, 1, Frequency::quarterly())
}
