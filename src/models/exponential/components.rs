//! Model taxonomy and the state-update equations shared by every variant.

use std::fmt;

/// Error component type, used when simulating forecast paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorType {
    /// `y = ŷ + ε`
    #[default]
    Additive,
    /// `y = ŷ (1 + ε)`
    Multiplicative,
}

/// Trend component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendType {
    /// No trend
    #[default]
    None,
    /// Additive trend: level + slope
    Additive,
    /// Multiplicative (exponential) trend: level * growth
    Multiplicative,
}

/// Seasonal component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonalType {
    /// No seasonality
    #[default]
    None,
    /// Additive seasonality
    Additive,
    /// Multiplicative seasonality
    Multiplicative,
}

/// Holt-Winters model specification.
///
/// Damping requires a trend and seasonal models need a period of at
/// least two; both are checked when a model is built from a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelSpec {
    pub trend: TrendType,
    pub seasonal: SeasonalType,
    pub damped: bool,
    /// Period length `m`; inferred from the series frequency when absent.
    pub seasonal_periods: Option<usize>,
}

impl ModelSpec {
    pub fn new(trend: TrendType, seasonal: SeasonalType) -> Self {
        Self {
            trend,
            seasonal,
            damped: false,
            seasonal_periods: None,
        }
    }

    /// Simple exponential smoothing.
    pub fn simple() -> Self {
        Self::new(TrendType::None, SeasonalType::None)
    }

    /// Holt's linear (or exponential, for a multiplicative trend) method.
    pub fn holt(trend: TrendType) -> Self {
        Self::new(trend, SeasonalType::None)
    }

    pub fn damped(mut self, damped: bool) -> Self {
        self.damped = damped;
        self
    }

    pub fn with_seasonal_periods(mut self, periods: usize) -> Self {
        self.seasonal_periods = Some(periods);
        self
    }

    pub fn has_trend(&self) -> bool {
        self.trend != TrendType::None
    }

    pub fn has_season(&self) -> bool {
        self.seasonal != SeasonalType::None
    }

    /// Whether any component requires strictly positive data.
    pub fn is_multiplicative(&self) -> bool {
        self.trend == TrendType::Multiplicative || self.seasonal == SeasonalType::Multiplicative
    }

    pub fn variant(&self) -> ModelVariant {
        ModelVariant::new(self.trend, self.seasonal)
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = match (self.trend, self.damped) {
            (TrendType::None, _) => "N",
            (TrendType::Additive, false) => "A",
            (TrendType::Additive, true) => "Ad",
            (TrendType::Multiplicative, false) => "M",
            (TrendType::Multiplicative, true) => "Md",
        };
        let s = match self.seasonal {
            SeasonalType::None => "N",
            SeasonalType::Additive => "A",
            SeasonalType::Multiplicative => "M",
        };
        match self.seasonal_periods.filter(|_| self.has_season()) {
            Some(m) => write!(f, "HoltWinters({},{},{})", t, s, m),
            None => write!(f, "HoltWinters({},{})", t, s),
        }
    }
}

/// The nine trend × seasonal combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelVariant {
    NoneNone,
    NoneAdd,
    NoneMul,
    AddNone,
    AddAdd,
    AddMul,
    MulNone,
    MulAdd,
    MulMul,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 9] = [
        ModelVariant::NoneNone,
        ModelVariant::NoneAdd,
        ModelVariant::NoneMul,
        ModelVariant::AddNone,
        ModelVariant::AddAdd,
        ModelVariant::AddMul,
        ModelVariant::MulNone,
        ModelVariant::MulAdd,
        ModelVariant::MulMul,
    ];

    pub fn new(trend: TrendType, seasonal: SeasonalType) -> Self {
        use SeasonalType as S;
        use TrendType as T;
        match (trend, seasonal) {
            (T::None, S::None) => ModelVariant::NoneNone,
            (T::None, S::Additive) => ModelVariant::NoneAdd,
            (T::None, S::Multiplicative) => ModelVariant::NoneMul,
            (T::Additive, S::None) => ModelVariant::AddNone,
            (T::Additive, S::Additive) => ModelVariant::AddAdd,
            (T::Additive, S::Multiplicative) => ModelVariant::AddMul,
            (T::Multiplicative, S::None) => ModelVariant::MulNone,
            (T::Multiplicative, S::Additive) => ModelVariant::MulAdd,
            (T::Multiplicative, S::Multiplicative) => ModelVariant::MulMul,
        }
    }

    pub fn trend(self) -> TrendType {
        use ModelVariant::*;
        match self {
            NoneNone | NoneAdd | NoneMul => TrendType::None,
            AddNone | AddAdd | AddMul => TrendType::Additive,
            MulNone | MulAdd | MulMul => TrendType::Multiplicative,
        }
    }

    pub fn seasonal(self) -> SeasonalType {
        use ModelVariant::*;
        match self {
            NoneNone | AddNone | MulNone => SeasonalType::None,
            NoneAdd | AddAdd | MulAdd => SeasonalType::Additive,
            NoneMul | AddMul | MulMul => SeasonalType::Multiplicative,
        }
    }

    pub fn has_trend(self) -> bool {
        self.trend() != TrendType::None
    }

    pub fn has_season(self) -> bool {
        self.seasonal() != SeasonalType::None
    }

    /// Update-equation set for this variant.
    pub fn equations(self) -> Equations {
        let (trended, dampen, detrend): (Binary, Binary, Binary) = match self.trend() {
            TrendType::None => (|l, _| l, |_, _| 0.0, |_, _| 0.0),
            TrendType::Additive => (|l, b| l + b, |b, phi| phi * b, |l, prev| l - prev),
            TrendType::Multiplicative => (|l, b| l * b, |b, phi| b.powf(phi), |l, prev| l / prev),
        };
        let (seasoned, deseason): (Binary, Binary) = match self.seasonal() {
            SeasonalType::None => (|x, _| x, |y, _| y),
            SeasonalType::Additive => (|x, s| x + s, |y, s| y - s),
            SeasonalType::Multiplicative => (|x, s| x * s, |y, s| y / s),
        };
        Equations {
            trended,
            dampen,
            detrend,
            seasoned,
            deseason,
            has_trend: self.has_trend(),
            has_season: self.has_season(),
        }
    }
}

type Binary = fn(f64, f64) -> f64;

/// Smoothing weights applied in one recursion step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub phi: f64,
}

/// Level, trend and season after one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepState {
    pub level: f64,
    pub trend: f64,
    pub season: f64,
}

/// Component operations for one variant, as plain function pointers.
///
/// `trended(l, dampen(b, phi))` is the level carried forward one period,
/// `seasoned(x, s)` the one-step prediction. Absent components use
/// neutral operations and their states are carried unchanged.
#[derive(Clone, Copy)]
pub struct Equations {
    pub trended: fn(f64, f64) -> f64,
    pub dampen: fn(f64, f64) -> f64,
    pub detrend: fn(f64, f64) -> f64,
    pub seasoned: fn(f64, f64) -> f64,
    pub deseason: fn(f64, f64) -> f64,
    pub has_trend: bool,
    pub has_season: bool,
}

impl fmt::Debug for Equations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Equations")
            .field("has_trend", &self.has_trend)
            .field("has_season", &self.has_season)
            .finish()
    }
}

impl Equations {
    /// One-step prediction from the state before an observation.
    #[inline]
    pub fn predict(&self, level: f64, trend: f64, season: f64, phi: f64) -> f64 {
        (self.seasoned)((self.trended)(level, (self.dampen)(trend, phi)), season)
    }

    /// Advance the state by one observation `y`.
    ///
    /// `season` is the seasonal state from one full period earlier; the
    /// returned season replaces it.
    pub fn step(&self, w: &Weights, level: f64, trend: f64, season: f64, y: f64) -> StepState {
        let damped = (self.dampen)(trend, w.phi);
        let carried = (self.trended)(level, damped);

        let new_level = w.alpha * (self.deseason)(y, season) + (1.0 - w.alpha) * carried;
        let new_trend = if self.has_trend {
            w.beta * (self.detrend)(new_level, level) + (1.0 - w.beta) * damped
        } else {
            trend
        };
        let new_season = if self.has_season {
            w.gamma * (self.deseason)(y, carried) + (1.0 - w.gamma) * season
        } else {
            season
        };

        StepState {
            level: new_level,
            trend: new_trend,
            season: new_season,
        }
    }
}
