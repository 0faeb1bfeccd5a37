//! Pump operating point from the hydraulic energy balance.
//!
//! With the pump running, the head it delivers must equal the tank level plus
//! the friction losses in both mains plus the velocity head of the moving tank
//! surface:
//!
//! ```text
//! a1 + a2 Q^2 = z + k1 Q^2 + k2 (Q - Q_R)^2 + (Q - Q_R - Q_D)^2 / (2 g A^2)
//! ```
//!
//! which rearranges into `A Q^2 + B Q + C = 0`.

use std::fmt;

use super::error::SimError;
use crate::model::{DemandCurve, PhysicalModel};

/// Leading coefficients smaller than this are treated as zero.
pub const LEADING_TOLERANCE: f64 = 1e-12;
/// Imaginary parts smaller than this are rounding noise on a double root.
pub const IMAGINARY_TOLERANCE: f64 = 1e-9;

/// Roots of a polynomial of degree at most two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Roots {
    /// Two real roots (equal for a double root).
    Real(f64, f64),
    /// The leading coefficient vanished; one root of the linear remainder.
    Linear(f64),
    /// Complex-conjugate pair `re ± i·im`.
    Complex { re: f64, im: f64 },
    /// Constant equation; no isolated root.
    Degenerate,
}

impl Roots {
    /// Strictly positive real roots.
    pub fn positive(&self) -> Vec<f64> {
        match *self {
            Roots::Real(r1, r2) if r1 == r2 => [r1].into_iter().filter(|r| *r > 0.0).collect(),
            Roots::Real(r1, r2) => [r1, r2].into_iter().filter(|r| *r > 0.0).collect(),
            Roots::Linear(r) if r > 0.0 => vec![r],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Roots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Roots::Real(r1, r2) => write!(f, "real roots {r1:.6}, {r2:.6}"),
            Roots::Linear(r) => write!(f, "linear root {r:.6}"),
            Roots::Complex { re, im } => write!(f, "complex roots {re:.6} ± {im:.6}i"),
            Roots::Degenerate => f.write_str("degenerate equation"),
        }
    }
}

/// Solves `a x^2 + b x + c = 0` in closed form.
///
/// Uses the cancellation-free form `q = -(b + sgn(b) sqrt(disc)) / 2`,
/// `x1 = q / a`, `x2 = c / q`.
///
/// # Examples
///
/// ```
/// use pump_sched::sim::solver::{solve_quadratic, Roots};
///
/// // (x - 2)(x + 3) = x^2 + x - 6
/// let Roots::Real(r1, r2) = solve_quadratic(1.0, 1.0, -6.0) else { panic!() };
/// let (lo, hi) = (r1.min(r2), r1.max(r2));
/// assert!((lo + 3.0).abs() < 1e-12 && (hi - 2.0).abs() < 1e-12);
/// ```
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Roots {
    if a.abs() < LEADING_TOLERANCE {
        if b.abs() < LEADING_TOLERANCE {
            return Roots::Degenerate;
        }
        return Roots::Linear(-c / b);
    }

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        let re = -b / (2.0 * a);
        let im = (-disc).sqrt() / (2.0 * a.abs());
        if im < IMAGINARY_TOLERANCE {
            return Roots::Real(re, re);
        }
        return Roots::Complex { re, im };
    }

    let q = -0.5 * (b + b.signum() * disc.sqrt());
    if q == 0.0 {
        // b == 0 and disc == 0, hence c == 0
        return Roots::Real(0.0, 0.0);
    }
    Roots::Real(q / a, c / q)
}

/// Coefficients of the energy balance at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyBalance {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl EnergyBalance {
    /// Builds the balance for hour `t`, tank level `level_m`, and the selected demand envelope.
    pub fn at(model: &PhysicalModel, t: f64, level_m: f64, curve: DemandCurve) -> Self {
        let pump = model.pump();
        let k = model.losses();
        let g = model.gravity_m_h2();
        let area = model.tank().area_m2;
        let base = model.demand().base_m3h(t);
        let draw = base + model.demand().secondary_m3h(curve, t);
        let surface = g * area * area;

        Self {
            a: pump.a2 - k.k1 - k.k2 - 1.0 / (2.0 * surface),
            b: 2.0 * k.k2 * base + draw / surface,
            c: pump.a1 - level_m - k.k2 * base * base - draw * draw / (2.0 * surface),
        }
    }

    /// Left-hand side `A Q^2 + B Q + C`; zero at the operating point.
    pub fn residual(&self, flow_m3h: f64) -> f64 {
        (self.a * flow_m3h + self.b) * flow_m3h + self.c
    }

    pub fn roots(&self) -> Roots {
        solve_quadratic(self.a, self.b, self.c)
    }
}

/// Pump flow (m³/h) at hour `t` for tank level `level_m`.
///
/// # Errors
///
/// Returns [`SimError::InfeasiblePumpOperation`] unless the balance has exactly
/// one strictly positive real root.
pub fn pump_flow(
    model: &PhysicalModel,
    t: f64,
    level_m: f64,
    curve: DemandCurve,
) -> Result<f64, SimError> {
    let roots = EnergyBalance::at(model, t, level_m, curve).roots();
    match roots.positive().as_slice() {
        [flow] => Ok(*flow),
        _ => Err(SimError::InfeasiblePumpOperation {
            time_h: t,
            level_m,
            roots,
        }),
    }
}
