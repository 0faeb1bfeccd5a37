//! Failure taxonomy of a simulation run.

use thiserror::Error;

use super::solver::Roots;

/// Errors returned by [`crate::sim::engine::simulate`] and the input constructors.
///
/// Structural problems (`MalformedDecisionVector`, `DegenerateTimeGrid`) are
/// detected before any simulation work. `InfeasiblePumpOperation` aborts a run
/// that was already under way; no partial trace is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// The energy balance has no unique positive real flow.
    #[error("no physical pump operating point at t={time_h:.4} h, z={level_m:.3} m ({roots})")]
    InfeasiblePumpOperation {
        time_h: f64,
        level_m: f64,
        roots: Roots,
    },

    #[error("malformed decision vector: {0}")]
    MalformedDecisionVector(#[from] ScheduleDefect),

    #[error("degenerate time grid: {0}")]
    DegenerateTimeGrid(#[from] GridDefect),
}

impl SimError {
    /// Returns `true` for failures of the physics rather than of the inputs.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, SimError::InfeasiblePumpOperation { .. })
    }
}

/// Why a decision vector was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleDefect {
    #[error("odd length {0}, expected on-times followed by durations")]
    OddLength(usize),

    #[error("{on_times} on-times but {durations} durations")]
    LengthMismatch { on_times: usize, durations: usize },

    #[error("entry {index} is negative ({value})")]
    Negative { index: usize, value: f64 },

    #[error("entry {index} is not finite")]
    NonFinite { index: usize },
}

/// Why a time grid was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridDefect {
    #[error("{0} samples, at least 2 required")]
    TooFewSamples(usize),

    #[error("sample {index} is not finite")]
    NonFinite { index: usize },

    #[error("sample {index} does not increase")]
    NonMonotonic { index: usize },

    #[error("sample {index} breaks the uniform spacing")]
    NonUniform { index: usize },

    #[error("sample {index} ({value} h) lies outside the 0-24 h horizon")]
    OutsideHorizon { index: usize, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_is_distinguishable_from_structural() {
        let crashed = SimError::InfeasiblePumpOperation {
            time_h: 3.0,
            level_m: 170.0,
            roots: Roots::Complex { re: 1.0, im: 2.0 },
        };
        let malformed = SimError::from(ScheduleDefect::OddLength(3));
        assert!(crashed.is_infeasible());
        assert!(!malformed.is_infeasible());
    }

    #[test]
    fn messages_name_the_defect() {
        let e = SimError::from(GridDefect::TooFewSamples(1));
        assert_eq!(
            e.to_string(),
            "degenerate time grid: 1 samples, at least 2 required"
        );
        let e = SimError::from(ScheduleDefect::Negative {
            index: 2,
            value: -0.5,
        });
        assert!(e.to_string().contains("entry 2 is negative"));
    }
}
