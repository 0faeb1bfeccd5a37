//! API request and response types.
//!
//! Trace rows use the same field names as the CSV export.

use serde::{Deserialize, Serialize};

use crate::model::tariff::BLOCKS;
use crate::model::{DemandCurve, LevelBounds, PhysicalModel};
use crate::problem::{Evaluation, LevelLimits};
use crate::sim::error::SimError;
use crate::sim::kpi::TraceReport;
use crate::sim::types::{PumpSwitch, TraceSample};

/// Plant parameters as seen by the simulator.
#[derive(Debug, Serialize)]
pub struct ModelResponse {
    /// Pump shut-off head (m).
    pub shutoff_head_m: f64,
    /// Quadratic pump-curve coefficient.
    pub curve_coefficient: f64,
    pub efficiency: f64,
    /// Friction loss coefficient of the pump main.
    pub k1: f64,
    /// Friction loss coefficient of the tank main.
    pub k2: f64,
    pub tank_area_m2: f64,
    pub initial_level_m: f64,
    pub operational: LevelBounds,
    pub absolute: LevelBounds,
    pub density_kg_m3: f64,
    /// Gravity in m/h².
    pub gravity_m_h2: f64,
    /// Price per kWh of each two-hour block.
    pub tariff: [f64; BLOCKS],
}

impl From<&PhysicalModel> for ModelResponse {
    fn from(m: &PhysicalModel) -> Self {
        Self {
            shutoff_head_m: m.pump().a1,
            curve_coefficient: m.pump().a2,
            efficiency: m.pump().efficiency,
            k1: m.losses().k1,
            k2: m.losses().k2,
            tank_area_m2: m.tank().area_m2,
            initial_level_m: m.tank().initial_level_m,
            operational: m.tank().operational,
            absolute: m.tank().absolute,
            density_kg_m3: m.density_kg_m3(),
            gravity_m_h2: m.gravity_m_h2(),
            tariff: *m.tariff().rates(),
        }
    }
}

/// Body of `POST /simulate`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SimulateRequest {
    /// Decision vector `[on_0.., dur_0..]`.
    pub x: Vec<f64>,
    /// Consumption envelope, `"max"` when absent.
    pub demand: Option<DemandCurve>,
    /// Grid size, the server default when absent.
    pub samples: Option<usize>,
    /// Return every `stride`-th trace row (default 1).
    pub stride: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    pub report: TraceReport,
    pub switches: Vec<PumpSwitch>,
    pub trace: Vec<TraceSample>,
}

/// Body of `POST /evaluate`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluateRequest {
    pub x: Vec<f64>,
    pub demand: Option<DemandCurve>,
    /// Level limits, `"operational"` when absent.
    pub limits: Option<LevelLimits>,
    pub samples: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    /// `"feasible"` or `"violating"`.
    pub status: &'static str,
    /// Cost at the end of the day.
    pub objective: f64,
    /// Largest single constraint violation, zero when feasible.
    pub violation: f64,
    /// Ordering constraints followed by the horizon constraint.
    pub schedule_constraints: Vec<f64>,
}

impl EvaluateResponse {
    /// Builds a response for a completed run.
    ///
    /// # Errors
    ///
    /// Returns the run's error for [`Evaluation::Crashed`].
    pub fn from_evaluation(
        eval: Evaluation,
        schedule_constraints: Vec<f64>,
    ) -> Result<Self, SimError> {
        let (status, objective, violation) = match eval {
            Evaluation::Feasible { objective } => ("feasible", objective, 0.0),
            Evaluation::Violating {
                objective,
                violation,
            } => ("violating", objective, violation),
            Evaluation::Crashed(e) => return Err(e),
        };
        Ok(Self {
            status,
            objective,
            violation,
            schedule_constraints,
        })
    }
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
