//! Optimization-facing view of the simulator.
//!
//! A [`ScheduleProblem`] fixes the model, the time grid, the demand envelope,
//! and the level limits, and exposes the cost objective and the constraint
//! vectors of a decision vector `x = [on_0..on_{n-1}, dur_0..dur_{n-1}]`.
//! Any NLP solver can drive it; none is bundled.

pub mod constraints;
pub mod gradient;

use std::fmt;
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{DemandCurve, LevelBounds, PhysicalModel};
use crate::sim::error::SimError;
use crate::sim::Simulator;
use crate::sim::types::{DutySchedule, SimulationTrace, TimeGrid};

pub use gradient::{DEFAULT_STEP_H, objective_gradient};

/// Which pair of tank limits the level constraints enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelLimits {
    /// Narrow band used for the nominal schedule.
    #[default]
    Operational,
    /// Wide band used for the robust schedule pair.
    Absolute,
}

impl LevelLimits {
    /// Resolves the limits against a model's tank.
    pub fn bounds(self, model: &PhysicalModel) -> LevelBounds {
        match self {
            LevelLimits::Operational => model.tank().operational,
            LevelLimits::Absolute => model.tank().absolute,
        }
    }
}

impl fmt::Display for LevelLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelLimits::Operational => write!(f, "operational"),
            LevelLimits::Absolute => write!(f, "absolute"),
        }
    }
}

/// Outcome of evaluating one decision vector.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// All constraints hold.
    Feasible { objective: f64 },
    /// The run completed but at least one constraint is violated by
    /// `violation` (the largest single violation).
    Violating { objective: f64, violation: f64 },
    /// The pump had no operating point; no objective exists.
    Crashed(SimError),
}

impl Evaluation {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Evaluation::Feasible { .. })
    }

    pub fn objective(&self) -> Option<f64> {
        match self {
            Evaluation::Feasible { objective } | Evaluation::Violating { objective, .. } => {
                Some(*objective)
            }
            Evaluation::Crashed(_) => None,
        }
    }

    /// Objective plus `weight` times the violation; crashed points score
    /// `+inf` so a derivative-free search never prefers them.
    pub fn penalized(&self, weight: f64) -> f64 {
        match self {
            Evaluation::Feasible { objective } => *objective,
            Evaluation::Violating {
                objective,
                violation,
            } => objective + weight * violation,
            Evaluation::Crashed(_) => f64::INFINITY,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Feasible { objective } => write!(f, "feasible, cost {objective:.4}"),
            Evaluation::Violating {
                objective,
                violation,
            } => write!(f, "violating by {violation:.4}, cost {objective:.4}"),
            Evaluation::Crashed(e) => write!(f, "crashed: {e}"),
        }
    }
}

/// One scheduling problem instance over a fixed grid.
#[derive(Debug, Clone)]
pub struct ScheduleProblem<'a> {
    simulator: Simulator<'a>,
    grid: TimeGrid,
    curve: DemandCurve,
    limits: LevelLimits,
}

impl<'a> ScheduleProblem<'a> {
    pub fn new(
        model: &'a PhysicalModel,
        grid: TimeGrid,
        curve: DemandCurve,
        limits: LevelLimits,
    ) -> Self {
        Self {
            simulator: Simulator::new(model),
            grid,
            curve,
            limits,
        }
    }

    /// Maximum consumption against the operational limits.
    pub fn nominal(model: &'a PhysicalModel, grid: TimeGrid) -> Self {
        Self::new(model, grid, DemandCurve::Max, LevelLimits::Operational)
    }

    pub fn model(&self) -> &'a PhysicalModel {
        self.simulator.model()
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn curve(&self) -> DemandCurve {
        self.curve
    }

    pub fn limits(&self) -> LevelLimits {
        self.limits
    }

    pub fn level_bounds(&self) -> LevelBounds {
        self.limits.bounds(self.model())
    }

    /// Box bounds for a schedule of `cycles` duty cycles.
    pub fn bounds(&self, cycles: usize) -> Vec<(f64, f64)> {
        constraints::bounds(cycles)
    }

    /// Runs the simulation for `x`.
    ///
    /// # Errors
    ///
    /// Propagates [`SimError`] from decoding or from the run.
    pub fn simulate(&self, x: &[f64]) -> Result<SimulationTrace, SimError> {
        let schedule = DutySchedule::from_decision_vector(x)?;
        self.simulator.run(&schedule, &self.grid, self.curve)
    }

    /// Cumulative electricity cost at the end of the day.
    ///
    /// # Errors
    ///
    /// Propagates [`SimError`] from [`ScheduleProblem::simulate`].
    pub fn objective(&self, x: &[f64]) -> Result<f64, SimError> {
        Ok(self.simulate(x)?.final_cost())
    }

    /// Ordering and horizon constraints. Needs no simulation.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MalformedDecisionVector`] for a malformed `x`.
    pub fn schedule_constraints(&self, x: &[f64]) -> Result<Vec<f64>, SimError> {
        let schedule = DutySchedule::from_decision_vector(x)?;
        Ok(constraints::schedule_constraints(&schedule))
    }

    /// Level constraints over every sampled tank level.
    ///
    /// # Errors
    ///
    /// Propagates [`SimError`] from [`ScheduleProblem::simulate`].
    pub fn level_constraints(&self, x: &[f64]) -> Result<Vec<f64>, SimError> {
        let trace = self.simulate(x)?;
        Ok(constraints::level_constraints(
            &trace.level_m,
            &self.level_bounds(),
        ))
    }

    /// Classifies `x` as feasible, violating, or crashed.
    ///
    /// Schedule-order defects and box-bound excursions are reported as
    /// violations rather than errors; the simulator still runs them.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MalformedDecisionVector`] when `x` cannot be decoded.
    /// An infeasible pump operation is not an error here; it yields
    /// [`Evaluation::Crashed`].
    pub fn evaluate(&self, x: &[f64]) -> Result<Evaluation, SimError> {
        let schedule = DutySchedule::from_decision_vector(x)?;
        let structural = constraints::max_violation(&constraints::schedule_constraints(&schedule))
            .max(constraints::bound_violation(&schedule));

        let trace = match self.simulator.run(&schedule, &self.grid, self.curve) {
            Ok(trace) => trace,
            Err(e) if e.is_infeasible() => return Ok(Evaluation::Crashed(e)),
            Err(e) => return Err(e),
        };

        let levels = constraints::level_constraints(&trace.level_m, &self.level_bounds());
        let violation = structural.max(constraints::max_violation(&levels));
        let objective = trace.final_cost();
        debug!(
            cycles = schedule.cycles(),
            curve = %self.curve,
            objective,
            violation,
            "evaluated schedule"
        );

        if violation > 0.0 {
            Ok(Evaluation::Violating {
                objective,
                violation,
            })
        } else {
            Ok(Evaluation::Feasible { objective })
        }
    }

    /// Forward-difference gradient of [`ScheduleProblem::objective`].
    ///
    /// # Errors
    ///
    /// See [`objective_gradient`].
    pub fn gradient(&self, x: &[f64], step_h: f64) -> Result<Vec<f64>, SimError> {
        objective_gradient(self, x, step_h)
    }
}

/// Two independent schedules, one per consumption envelope, each held to the
/// absolute limits.
///
/// The pair is robust when both members are feasible: the high schedule keeps
/// the tank up under maximum consumption and the low one keeps it from
/// overflowing under minimum consumption.
#[derive(Debug, Clone)]
pub struct RobustPair<'a> {
    pub high: ScheduleProblem<'a>,
    pub low: ScheduleProblem<'a>,
}

/// Evaluations of both members of a [`RobustPair`].
#[derive(Debug, Clone, PartialEq)]
pub struct RobustEvaluation {
    pub high: Evaluation,
    pub low: Evaluation,
}

impl RobustEvaluation {
    pub fn is_feasible(&self) -> bool {
        self.high.is_feasible() && self.low.is_feasible()
    }

    /// Sum of both penalized objectives.
    pub fn penalized(&self, weight: f64) -> f64 {
        self.high.penalized(weight) + self.low.penalized(weight)
    }
}

impl<'a> RobustPair<'a> {
    pub fn new(model: &'a PhysicalModel, grid: TimeGrid) -> Self {
        Self {
            high: ScheduleProblem::new(
                model,
                grid.clone(),
                DemandCurve::Max,
                LevelLimits::Absolute,
            ),
            low: ScheduleProblem::new(model, grid, DemandCurve::Min, LevelLimits::Absolute),
        }
    }

    /// Evaluates `x_high` under maximum and `x_low` under minimum consumption
    /// on two threads.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MalformedDecisionVector`] if either vector is
    /// malformed.
    pub fn evaluate(&self, x_high: &[f64], x_low: &[f64]) -> Result<RobustEvaluation, SimError> {
        let (high, low) = thread::scope(|scope| {
            let low = scope.spawn(|| self.low.evaluate(x_low));
            let high = self.high.evaluate(x_high);
            let low = match low.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            };
            (high, low)
        });
        Ok(RobustEvaluation {
            high: high?,
            low: low?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LevelBounds, Tank};
    use crate::sim::error::ScheduleDefect;

    fn grid() -> TimeGrid {
        TimeGrid::day(4_001).unwrap()
    }

    #[test]
    fn objective_is_final_cost() {
        let model = PhysicalModel::reference();
        let problem = ScheduleProblem::nominal(&model, grid());
        let x = [1.0, 5.0, 10.0, 16.0, 2.0, 3.0, 3.0, 3.0];
        let trace = problem.simulate(&x).unwrap();
        assert_eq!(problem.objective(&x).unwrap(), trace.final_cost());
    }

    #[test]
    fn idle_day_costs_nothing_but_violates_levels() {
        let model = PhysicalModel::reference();
        let problem = ScheduleProblem::nominal(&model, grid());
        let eval = problem.evaluate(&[]).unwrap();
        match eval {
            Evaluation::Violating {
                objective,
                violation,
            } => {
                assert_eq!(objective, 0.0);
                assert!(violation > 10.0, "violation = {violation}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn overlap_is_flagged_without_aborting() {
        let model = PhysicalModel::reference();
        let problem = ScheduleProblem::nominal(&model, grid());
        let x = [1.0, 4.0, 5.0, 1.0];
        let eval = problem.evaluate(&x).unwrap();
        assert!(!eval.is_feasible());
        assert!(eval.objective().is_some());
        assert!(problem.schedule_constraints(&x).unwrap()[0] < 0.0);
    }

    #[test]
    fn malformed_vector_is_an_error() {
        let model = PhysicalModel::reference();
        let problem = ScheduleProblem::nominal(&model, grid());
        assert_eq!(
            problem.evaluate(&[1.0]),
            Err(SimError::MalformedDecisionVector(ScheduleDefect::OddLength(1)))
        );
    }

    #[test]
    fn infeasible_run_is_crashed_not_error() {
        let reference = PhysicalModel::reference();
        let tank = Tank::new(
            185.0,
            300.0,
            LevelBounds::new(290.0, 310.0),
            LevelBounds::new(280.0, 320.0),
        );
        let model = PhysicalModel::new(
            *reference.pump(),
            reference.demand().clone(),
            *reference.pipes(),
            tank,
            *reference.tariff(),
            reference.density_kg_m3(),
            9.81,
        );
        let problem = ScheduleProblem::nominal(&model, grid());
        let eval = problem.evaluate(&[1.0, 1.0]).unwrap();
        assert!(matches!(eval, Evaluation::Crashed(_)));
        assert_eq!(eval.penalized(1e3), f64::INFINITY);
        assert_eq!(eval.objective(), None);
    }

    #[test]
    fn penalty_adds_weighted_violation() {
        let eval = Evaluation::Violating {
            objective: 10.0,
            violation: 0.5,
        };
        assert_eq!(eval.penalized(100.0), 60.0);
        assert_eq!(Evaluation::Feasible { objective: 3.0 }.penalized(100.0), 3.0);
    }

    #[test]
    fn robust_pair_uses_both_envelopes() {
        let model = PhysicalModel::reference();
        let pair = RobustPair::new(&model, TimeGrid::day(6_001).unwrap());
        assert_eq!(pair.high.curve(), DemandCurve::Max);
        assert_eq!(pair.low.curve(), DemandCurve::Min);
        assert_eq!(pair.high.limits(), LevelLimits::Absolute);

        let x = [0.1, 7.352, 14.925, 4.0, 4.077, 2.073];
        let eval = pair.evaluate(&x, &x).unwrap();
        assert!(eval.is_feasible(), "{eval:?}");
        assert!(eval.high.objective().unwrap() > 0.0);
    }

    #[test]
    fn level_limits_resolve_against_tank() {
        let model = PhysicalModel::reference();
        assert_eq!(
            LevelLimits::Operational.bounds(&model),
            model.tank().operational
        );
        assert_eq!(LevelLimits::Absolute.bounds(&model), model.tank().absolute);
        assert_eq!(LevelLimits::Absolute.to_string(), "absolute");
    }
}
