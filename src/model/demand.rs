//! Water consumption profiles over the day.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Polynomial in hour-of-day with coefficients in ascending powers.
///
/// `[c0, c1, c2]` evaluates to `c0 + c1*t + c2*t^2`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Creates a polynomial from ascending-power coefficients.
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    /// Evaluates the polynomial at `t` using Horner's rule.
    pub fn eval(&self, t: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc.mul_add(t, c))
    }

    /// Highest power with a stored coefficient (0 for a constant or empty polynomial).
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

/// Worst-case assumption for the uncertain secondary consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemandCurve {
    /// High-consumption envelope.
    Max,
    /// Low-consumption envelope.
    Min,
}

impl DemandCurve {
    pub const ALL: [DemandCurve; 2] = [DemandCurve::Max, DemandCurve::Min];
}

impl fmt::Display for DemandCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemandCurve::Max => f.write_str("max"),
            DemandCurve::Min => f.write_str("min"),
        }
    }
}

impl FromStr for DemandCurve {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(DemandCurve::Max),
            "min" => Ok(DemandCurve::Min),
            other => Err(format!("unknown demand curve \"{other}\", expected \"max\" or \"min\"")),
        }
    }
}

/// Base consumption plus the two envelopes of the secondary consumption (m³/h).
#[derive(Debug, Clone, PartialEq)]
pub struct DemandProfile {
    base: Polynomial,
    high: Polynomial,
    low: Polynomial,
}

impl DemandProfile {
    pub fn new(base: Polynomial, high: Polynomial, low: Polynomial) -> Self {
        Self { base, high, low }
    }

    /// Base consumption drawn between the pump and the tank (m³/h).
    pub fn base_m3h(&self, t: f64) -> f64 {
        self.base.eval(t)
    }

    /// Secondary consumption under the selected envelope (m³/h).
    pub fn secondary_m3h(&self, curve: DemandCurve, t: f64) -> f64 {
        match curve {
            DemandCurve::Max => self.high.eval(t),
            DemandCurve::Min => self.low.eval(t),
        }
    }

    /// Total draw on the system at `t` (m³/h).
    pub fn total_m3h(&self, curve: DemandCurve, t: f64) -> f64 {
        self.base_m3h(t) + self.secondary_m3h(curve, t)
    }
}

/// Cubic base consumption, ascending powers.
pub const BASE_COEFFICIENTS: [f64; 4] = [20.0, 0.1335, 0.09, -0.004];

/// Degree-7 high envelope, ascending powers.
pub const HIGH_COEFFICIENTS: [f64; 8] = [
    75.393,
    -1.0124,
    -3.8645,
    1.03965,
    -0.09621,
    3.733e-3,
    -4.90754e-5,
    -1.19333e-7,
];

/// Degree-7 low envelope, ascending powers.
pub const LOW_COEFFICIENTS: [f64; 8] = [
    75.393,
    -1.32657,
    -3.85966,
    1.05575,
    -0.100585,
    4.1432e-3,
    -6.54846e-5,
    1.19333e-7,
];

impl Default for DemandProfile {
    fn default() -> Self {
        Self::new(
            Polynomial::new(BASE_COEFFICIENTS.to_vec()),
            Polynomial::new(HIGH_COEFFICIENTS.to_vec()),
            Polynomial::new(LOW_COEFFICIENTS.to_vec()),
        )
    }
}
