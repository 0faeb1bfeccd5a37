//! Post-hoc KPI computation from a simulation trace.

use std::fmt;

use serde::Serialize;

use super::types::{SimulationTrace, TimeGrid};
use crate::model::Tank;

/// Aggregate indicators of one simulated day.
///
/// Computed from the trace after the run so the reported figures always agree
/// with the per-sample data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceReport {
    /// Cumulative electricity cost at the end of the day.
    pub total_cost: f64,
    /// Cumulative electrical energy (kWh).
    pub total_energy_kwh: f64,
    /// Time spent pumping (h).
    pub pump_hours: f64,
    /// Number of duty cycles that switched on.
    pub cycles_started: usize,
    /// Highest electrical power (kW).
    pub peak_power_kw: f64,
    /// Mean flow while pumping (m³/h), zero if the pump never ran.
    pub mean_pumping_flow_m3h: f64,
    /// Lowest tank level (m).
    pub min_level_m: f64,
    /// Highest tank level (m).
    pub max_level_m: f64,
    /// Level after the last sample (m).
    pub final_level_m: f64,
    /// Samples outside the operational level limits.
    pub operational_violations: usize,
    /// Samples outside the absolute level limits.
    pub absolute_violations: usize,
}

impl TraceReport {
    /// Summarizes `trace` against the tank's level limits.
    ///
    /// # Arguments
    ///
    /// * `trace` - Complete simulation trace
    /// * `grid` - Grid the trace was produced on
    /// * `tank` - Tank whose limits are checked
    pub fn from_trace(trace: &SimulationTrace, grid: &TimeGrid, tank: &Tank) -> Self {
        let dt = grid.step_h();
        let mut pumping_samples = 0_usize;
        let mut flow_sum = 0.0;
        let mut peak_power_kw = 0.0_f64;

        for (&flow, &power) in trace.flow_m3h.iter().zip(&trace.power_kw) {
            if flow > 0.0 {
                pumping_samples += 1;
                flow_sum += flow;
            }
            peak_power_kw = peak_power_kw.max(power);
        }

        let operational_violations = trace
            .level_m
            .iter()
            .filter(|&&z| !tank.operational.contains(z))
            .count();
        let absolute_violations = trace
            .level_m
            .iter()
            .filter(|&&z| !tank.absolute.contains(z))
            .count();

        let mean_pumping_flow_m3h = if pumping_samples > 0 {
            flow_sum / pumping_samples as f64
        } else {
            0.0
        };

        Self {
            total_cost: trace.final_cost(),
            total_energy_kwh: trace.final_energy_kwh(),
            pump_hours: pumping_samples as f64 * dt,
            cycles_started: trace.switches.iter().filter(|s| s.on).count(),
            peak_power_kw,
            mean_pumping_flow_m3h,
            min_level_m: if trace.is_empty() {
                tank.initial_level_m
            } else {
                trace.min_level_m()
            },
            max_level_m: if trace.is_empty() {
                tank.initial_level_m
            } else {
                trace.max_level_m()
            },
            final_level_m: trace
                .level_m
                .last()
                .copied()
                .unwrap_or(tank.initial_level_m),
            operational_violations,
            absolute_violations,
        }
    }

    /// Whether every sample stayed within the absolute limits.
    pub fn is_safe(&self) -> bool {
        self.absolute_violations == 0
    }
}

impl fmt::Display for TraceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Schedule Report ---")?;
        writeln!(f, "Total cost:            {:.2}", self.total_cost)?;
        writeln!(f, "Electrical energy:     {:.1} kWh", self.total_energy_kwh)?;
        writeln!(
            f,
            "Pumping:               {:.2} h in {} cycles (mean {:.1} m3/h)",
            self.pump_hours, self.cycles_started, self.mean_pumping_flow_m3h
        )?;
        writeln!(f, "Peak power:            {:.1} kW", self.peak_power_kw)?;
        writeln!(
            f,
            "Tank level:            {:.3} .. {:.3} m (final {:.3} m)",
            self.min_level_m, self.max_level_m, self.final_level_m
        )?;
        write!(
            f,
            "Level violations:      {} operational, {} absolute",
            self.operational_violations, self.absolute_violations
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::PumpSwitch;

    fn make_trace(flows: &[f64], levels: &[f64]) -> SimulationTrace {
        let mut trace = SimulationTrace::with_capacity(flows.len());
        let mut energy = 0.0;
        for (&q, &z) in flows.iter().zip(levels) {
            let p = if q > 0.0 { 100.0 } else { 0.0 };
            energy += p;
            trace.flow_m3h.push(q);
            trace.level_m.push(z);
            trace.power_kw.push(p);
            trace.energy_kwh.push(energy);
            trace.cost.push(energy * 0.1);
        }
        trace
    }

    #[test]
    fn counts_pumping_time_and_cycles() {
        let grid = TimeGrid::day(5).unwrap();
        let mut trace = make_trace(
            &[0.0, 180.0, 170.0, 0.0, 0.0],
            &[154.0, 155.0, 156.0, 155.5, 155.0],
        );
        trace.switches.push(PumpSwitch {
            sample: 1,
            time_h: 6.0,
            cycle: 0,
            on: true,
        });
        trace.switches.push(PumpSwitch {
            sample: 3,
            time_h: 18.0,
            cycle: 0,
            on: false,
        });
        let report = TraceReport::from_trace(&trace, &grid, &Tank::default());
        assert_eq!(report.pump_hours, 12.0);
        assert_eq!(report.cycles_started, 1);
        assert_eq!(report.mean_pumping_flow_m3h, 175.0);
        assert_eq!(report.peak_power_kw, 100.0);
        assert!((report.total_cost - 20.0).abs() < 1e-12);
        assert_eq!(report.final_level_m, 155.0);
    }

    #[test]
    fn counts_level_violations_per_bound() {
        let grid = TimeGrid::day(4).unwrap();
        // operational [152, 157], absolute [150, 159]
        let trace = make_trace(&[0.0; 4], &[151.0, 149.0, 158.0, 154.0]);
        let report = TraceReport::from_trace(&trace, &grid, &Tank::default());
        assert_eq!(report.operational_violations, 3);
        assert_eq!(report.absolute_violations, 1);
        assert!(!report.is_safe());
        assert_eq!(report.min_level_m, 149.0);
        assert_eq!(report.max_level_m, 158.0);
    }

    #[test]
    fn display_does_not_panic() {
        let grid = TimeGrid::day(2).unwrap();
        let trace = make_trace(&[0.0, 0.0], &[154.0, 153.0]);
        let s = TraceReport::from_trace(&trace, &grid, &Tank::default()).to_string();
        assert!(s.starts_with("--- Schedule Report ---"));
    }
}
