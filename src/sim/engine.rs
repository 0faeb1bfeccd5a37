//! Simulation engine: duty-cycle state machine, tank integration, and cost accounting.

use tracing::{debug, trace};

use super::cursor::{PumpCycleCursor, Transition};
use super::error::SimError;
use super::solver::pump_flow;
use super::types::{DutySchedule, PumpSwitch, SimulationTrace, TimeGrid};
use crate::model::{DemandCurve, PhysicalModel};

/// Full-day simulator bound to one physical model.
///
/// Holds only a shared reference to the immutable model; every run owns its
/// own tank level and cycle cursor, so one `Simulator` (or many) can be used
/// from several threads at once.
#[derive(Debug, Clone, Copy)]
pub struct Simulator<'a> {
    model: &'a PhysicalModel,
}

impl<'a> Simulator<'a> {
    pub fn new(model: &'a PhysicalModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &'a PhysicalModel {
        self.model
    }

    /// Simulates one day of the given schedule.
    ///
    /// Each sample first advances the duty-cycle cursor, then, if the pump is
    /// ON, solves for the pump flow and books power, energy, and cost at the
    /// tariff of the sample's two-hour block. The tank level is integrated with
    /// a forward Euler step of `Δt`, using the consumption at the sample time.
    ///
    /// # Arguments
    ///
    /// * `schedule` - Duty cycles to apply
    /// * `grid` - Sample times
    /// * `curve` - Secondary consumption envelope for the whole run
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InfeasiblePumpOperation`] at the first sample where
    /// the pump has no physical operating point. No partial trace is returned.
    pub fn run(
        &self,
        schedule: &DutySchedule,
        grid: &TimeGrid,
        curve: DemandCurve,
    ) -> Result<SimulationTrace, SimError> {
        let model = self.model;
        let dt = grid.step_h();
        let mut trace = SimulationTrace::with_capacity(grid.len());
        let mut cursor = PumpCycleCursor::new(schedule);
        let mut level_m = model.tank().initial_level_m;
        let mut energy_kwh = 0.0;
        let mut cost = 0.0;

        for (k, &t) in grid.samples().iter().enumerate() {
            match cursor.advance(t) {
                Transition::Unchanged => {}
                Transition::SwitchedOn(cycle) => {
                    trace!(cycle, time_h = t, level_m, "pump on");
                    trace.switches.push(PumpSwitch {
                        sample: k,
                        time_h: t,
                        cycle,
                        on: true,
                    });
                }
                Transition::SwitchedOff(cycle) => {
                    trace!(cycle, time_h = t, level_m, "pump off");
                    trace.switches.push(PumpSwitch {
                        sample: k,
                        time_h: t,
                        cycle,
                        on: false,
                    });
                }
            }

            let (flow_m3h, power_kw) = if cursor.is_active() {
                let flow = pump_flow(model, t, level_m, curve).inspect_err(|e| {
                    debug!(sample = k, error = %e, "simulation aborted");
                })?;
                let power = model.pump_power_kw(flow);
                let step_energy = power * dt;
                energy_kwh += step_energy;
                cost += step_energy * model.tariff().rate_at(t);
                (flow, power)
            } else {
                (0.0, 0.0)
            };

            level_m += dt * model.level_rate_m_h(flow_m3h, curve, t);

            trace.flow_m3h.push(flow_m3h);
            trace.level_m.push(level_m);
            trace.power_kw.push(power_kw);
            trace.energy_kwh.push(energy_kwh);
            trace.cost.push(cost);
        }

        debug!(
            cycles = schedule.cycles(),
            samples = grid.len(),
            %curve,
            cost,
            energy_kwh,
            min_level_m = trace.min_level_m(),
            max_level_m = trace.max_level_m(),
            "simulation complete"
        );
        Ok(trace)
    }
}

/// Decodes `x` and simulates it on `grid` with the reference entry point used
/// by the optimization layer.
///
/// # Errors
///
/// Returns [`SimError::MalformedDecisionVector`] before any work if `x` is not a
/// valid decision vector, and [`SimError::InfeasiblePumpOperation`] if the run
/// aborts.
pub fn simulate(
    model: &PhysicalModel,
    x: &[f64],
    grid: &TimeGrid,
    curve: DemandCurve,
) -> Result<SimulationTrace, SimError> {
    let schedule = DutySchedule::from_decision_vector(x)?;
    Simulator::new(model).run(&schedule, grid, curve)
}
