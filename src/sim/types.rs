//! Core simulation types: decision vector, time grid, and trace.

use std::fmt;

use serde::Serialize;

use super::error::{GridDefect, ScheduleDefect, SimError};

/// Length of the scheduling horizon (h).
pub const HORIZON_HOURS: f64 = 24.0;

/// Relative tolerance on the spacing of a uniform grid.
const SPACING_TOLERANCE: f64 = 1e-9;

/// Pump duty cycles decoded from a decision vector.
///
/// A decision vector of length `2n` holds `n` ON-times (h) followed by `n`
/// ON-durations (h). Entries must be finite and non-negative. Whether the cycles
/// overlap is a constraint of the optimization problem, not a property checked
/// here: overlapping schedules still simulate.
///
/// # Examples
///
/// ```
/// use pump_sched::sim::types::DutySchedule;
///
/// let schedule = DutySchedule::from_decision_vector(&[1.0, 10.0, 5.0, 3.0]).unwrap();
/// assert_eq!(schedule.cycles(), 2);
/// assert_eq!(schedule.off_time(0), 6.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DutySchedule {
    on_times: Vec<f64>,
    durations: Vec<f64>,
}

impl DutySchedule {
    /// Decodes `[on_0, .., on_{n-1}, dur_0, .., dur_{n-1}]`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MalformedDecisionVector`] for an odd length or a
    /// negative or non-finite entry.
    pub fn from_decision_vector(x: &[f64]) -> Result<Self, SimError> {
        if x.len() % 2 != 0 {
            return Err(ScheduleDefect::OddLength(x.len()).into());
        }
        let (on_times, durations) = x.split_at(x.len() / 2);
        Self::new(on_times.to_vec(), durations.to_vec())
    }

    /// Builds a schedule from separate ON-time and duration lists.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MalformedDecisionVector`] if the lists differ in
    /// length or contain a negative or non-finite entry. Indices in the error
    /// refer to the flattened decision vector.
    pub fn new(on_times: Vec<f64>, durations: Vec<f64>) -> Result<Self, SimError> {
        if on_times.len() != durations.len() {
            return Err(ScheduleDefect::LengthMismatch {
                on_times: on_times.len(),
                durations: durations.len(),
            }
            .into());
        }
        for (index, &value) in on_times.iter().chain(durations.iter()).enumerate() {
            if !value.is_finite() {
                return Err(ScheduleDefect::NonFinite { index }.into());
            }
            if value < 0.0 {
                return Err(ScheduleDefect::Negative { index, value }.into());
            }
        }
        Ok(Self {
            on_times,
            durations,
        })
    }

    /// A schedule that never switches the pump on.
    pub fn idle() -> Self {
        Self {
            on_times: Vec::new(),
            durations: Vec::new(),
        }
    }

    /// Number of duty cycles `n`.
    pub fn cycles(&self) -> usize {
        self.on_times.len()
    }

    pub fn on_time(&self, cycle: usize) -> f64 {
        self.on_times[cycle]
    }

    pub fn duration(&self, cycle: usize) -> f64 {
        self.durations[cycle]
    }

    /// Hour at which `cycle` is scheduled to end.
    pub fn off_time(&self, cycle: usize) -> f64 {
        self.on_times[cycle] + self.durations[cycle]
    }

    pub fn on_times(&self) -> &[f64] {
        &self.on_times
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    /// Total scheduled pumping time (h).
    pub fn scheduled_hours(&self) -> f64 {
        self.durations.iter().sum()
    }

    /// Flattens back into the `2n` decision vector layout.
    pub fn to_decision_vector(&self) -> Vec<f64> {
        let mut x = Vec::with_capacity(2 * self.cycles());
        x.extend_from_slice(&self.on_times);
        x.extend_from_slice(&self.durations);
        x
    }
}

impl fmt::Display for DutySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.on_times.is_empty() {
            return f.write_str("(pump idle)");
        }
        for cycle in 0..self.cycles() {
            if cycle > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{:.3}h-{:.3}h",
                self.on_time(cycle),
                self.off_time(cycle)
            )?;
        }
        Ok(())
    }
}

/// Equally spaced sample times within the day.
///
/// # Examples
///
/// ```
/// use pump_sched::sim::types::TimeGrid;
///
/// let grid = TimeGrid::day(25).unwrap();
/// assert_eq!(grid.len(), 25);
/// assert_eq!(grid.step_h(), 1.0);
/// assert_eq!(grid.samples()[24], 24.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    samples: Vec<f64>,
    step_h: f64,
}

impl TimeGrid {
    /// `count` evenly spaced samples over the full day, both ends included.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DegenerateTimeGrid`] if `count < 2`.
    pub fn day(count: usize) -> Result<Self, SimError> {
        Self::linspace(0.0, HORIZON_HOURS, count)
    }

    /// `count` evenly spaced samples over `[start_h, end_h]`, both ends included.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DegenerateTimeGrid`] if `count < 2` or the interval is
    /// empty or leaves the day.
    pub fn linspace(start_h: f64, end_h: f64, count: usize) -> Result<Self, SimError> {
        if count < 2 {
            return Err(GridDefect::TooFewSamples(count).into());
        }
        let step = (end_h - start_h) / (count - 1) as f64;
        let samples = (0..count)
            .map(|k| {
                if k == count - 1 {
                    end_h
                } else {
                    start_h + k as f64 * step
                }
            })
            .collect();
        Self::from_samples(samples)
    }

    /// Validates caller-supplied samples.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DegenerateTimeGrid`] if there are fewer than two
    /// samples, or any sample is non-finite, outside `[0, 24]`, not strictly
    /// increasing, or off the uniform spacing set by the first two samples.
    pub fn from_samples(samples: Vec<f64>) -> Result<Self, SimError> {
        if samples.len() < 2 {
            return Err(GridDefect::TooFewSamples(samples.len()).into());
        }
        for (index, &value) in samples.iter().enumerate() {
            if !value.is_finite() {
                return Err(GridDefect::NonFinite { index }.into());
            }
            if !(0.0..=HORIZON_HOURS).contains(&value) {
                return Err(GridDefect::OutsideHorizon { index, value }.into());
            }
        }

        let step_h = samples[1] - samples[0];
        for (index, pair) in samples.windows(2).enumerate() {
            let delta = pair[1] - pair[0];
            if delta <= 0.0 {
                return Err(GridDefect::NonMonotonic { index: index + 1 }.into());
            }
            if (delta - step_h).abs() > SPACING_TOLERANCE * step_h.max(1.0) {
                return Err(GridDefect::NonUniform { index: index + 1 }.into());
            }
        }

        Ok(Self { samples, step_h })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; a valid grid holds at least two samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample spacing `Δt` (h).
    pub fn step_h(&self) -> f64 {
        self.step_h
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}

/// A pump switch recorded while simulating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PumpSwitch {
    /// Grid index of the sample on which the switch happened.
    pub sample: usize,
    /// Hour of that sample.
    pub time_h: f64,
    /// Duty cycle that opened or closed.
    pub cycle: usize,
    /// `true` for ON, `false` for OFF.
    pub on: bool,
}

/// Result of one simulation run, index-aligned with the time grid.
///
/// `level_m[k]` is the tank level after integrating sample `k`. Energy and
/// cost are cumulative and never decrease.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationTrace {
    /// Pump flow (m³/h).
    pub flow_m3h: Vec<f64>,
    /// Tank level (m).
    pub level_m: Vec<f64>,
    /// Electrical pump power (kW).
    pub power_kw: Vec<f64>,
    /// Cumulative electrical energy (kWh).
    pub energy_kwh: Vec<f64>,
    /// Cumulative electricity cost (tariff currency).
    pub cost: Vec<f64>,
    /// Every ON/OFF transition in order.
    pub switches: Vec<PumpSwitch>,
}

impl SimulationTrace {
    pub fn with_capacity(samples: usize) -> Self {
        Self {
            flow_m3h: Vec::with_capacity(samples),
            level_m: Vec::with_capacity(samples),
            power_kw: Vec::with_capacity(samples),
            energy_kwh: Vec::with_capacity(samples),
            cost: Vec::with_capacity(samples),
            switches: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.level_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.level_m.is_empty()
    }

    /// Cumulative cost at the last sample; the optimization objective.
    pub fn final_cost(&self) -> f64 {
        self.cost.last().copied().unwrap_or(0.0)
    }

    pub fn final_energy_kwh(&self) -> f64 {
        self.energy_kwh.last().copied().unwrap_or(0.0)
    }

    pub fn min_level_m(&self) -> f64 {
        self.level_m.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_level_m(&self) -> f64 {
        self.level_m.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// The values at grid index `k`, if present.
    pub fn sample(&self, grid: &TimeGrid, k: usize) -> Option<TraceSample> {
        Some(TraceSample {
            index: k,
            time_h: *grid.samples().get(k)?,
            flow_m3h: *self.flow_m3h.get(k)?,
            level_m: *self.level_m.get(k)?,
            power_kw: *self.power_kw.get(k)?,
            energy_kwh: *self.energy_kwh.get(k)?,
            cost: *self.cost.get(k)?,
        })
    }
}

/// One row of a [`SimulationTrace`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraceSample {
    pub index: usize,
    pub time_h: f64,
    pub flow_m3h: f64,
    pub level_m: f64,
    pub power_kw: f64,
    pub energy_kwh: f64,
    pub cost: f64,
}

impl fmt::Display for TraceSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>6.2}h | Q={:>7.2} m3/h  z={:>7.3} m | P={:>7.2} kW  \
             E={:>8.2} kWh  cost={:>7.2}",
            self.time_h, self.flow_m3h, self.level_m, self.power_kw, self.energy_kwh, self.cost,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_vector_round_trip_layout() {
        let x = [1.0, 5.0, 10.0, 2.0, 3.0, 3.0];
        let schedule = DutySchedule::from_decision_vector(&x).unwrap();
        assert_eq!(schedule.on_times(), &[1.0, 5.0, 10.0]);
        assert_eq!(schedule.durations(), &[2.0, 3.0, 3.0]);
        assert_eq!(schedule.to_decision_vector(), x.to_vec());
        assert_eq!(schedule.scheduled_hours(), 8.0);
    }

    #[test]
    fn odd_vector_is_malformed() {
        let err = DutySchedule::from_decision_vector(&[1.0, 2.0, 3.0]);
        assert_eq!(
            err,
            Err(SimError::MalformedDecisionVector(ScheduleDefect::OddLength(3)))
        );
    }

    #[test]
    fn negative_entry_is_malformed() {
        let err = DutySchedule::from_decision_vector(&[1.0, 4.0, 2.0, -0.5]);
        assert_eq!(
            err,
            Err(SimError::MalformedDecisionVector(ScheduleDefect::Negative {
                index: 3,
                value: -0.5
            }))
        );
    }

    #[test]
    fn nan_entry_is_malformed() {
        let err = DutySchedule::from_decision_vector(&[f64::NAN, 1.0]);
        assert!(matches!(
            err,
            Err(SimError::MalformedDecisionVector(ScheduleDefect::NonFinite { index: 0 }))
        ));
    }

    #[test]
    fn empty_vector_is_idle() {
        let schedule = DutySchedule::from_decision_vector(&[]).unwrap();
        assert_eq!(schedule, DutySchedule::idle());
        assert_eq!(schedule.to_string(), "(pump idle)");
    }

    #[test]
    fn mismatched_lists_are_malformed() {
        let err = DutySchedule::new(vec![1.0, 2.0], vec![1.0]);
        assert!(matches!(
            err,
            Err(SimError::MalformedDecisionVector(ScheduleDefect::LengthMismatch { .. }))
        ));
    }

    #[test]
    fn day_grid_spans_horizon() {
        let grid = TimeGrid::day(10_000).unwrap();
        assert_eq!(grid.len(), 10_000);
        assert_eq!(grid.samples()[0], 0.0);
        assert_eq!(grid.samples()[9_999], HORIZON_HOURS);
        assert!((grid.step_h() - 24.0 / 9_999.0).abs() < 1e-15);
    }

    #[test]
    fn single_sample_grid_is_degenerate() {
        assert_eq!(
            TimeGrid::day(1),
            Err(SimError::DegenerateTimeGrid(GridDefect::TooFewSamples(1)))
        );
        assert!(TimeGrid::from_samples(Vec::new()).is_err());
    }

    #[test]
    fn decreasing_samples_are_degenerate() {
        let err = TimeGrid::from_samples(vec![0.0, 1.0, 0.5]);
        assert_eq!(
            err,
            Err(SimError::DegenerateTimeGrid(GridDefect::NonMonotonic { index: 2 }))
        );
    }

    #[test]
    fn repeated_sample_is_degenerate() {
        let err = TimeGrid::from_samples(vec![0.0, 0.0, 1.0]);
        assert_eq!(
            err,
            Err(SimError::DegenerateTimeGrid(GridDefect::NonMonotonic { index: 1 }))
        );
    }

    #[test]
    fn uneven_samples_are_degenerate() {
        let err = TimeGrid::from_samples(vec![0.0, 1.0, 2.0, 4.0]);
        assert_eq!(
            err,
            Err(SimError::DegenerateTimeGrid(GridDefect::NonUniform { index: 3 }))
        );
    }

    #[test]
    fn samples_past_midnight_are_rejected() {
        let err = TimeGrid::from_samples(vec![23.0, 24.0, 25.0]);
        assert!(matches!(
            err,
            Err(SimError::DegenerateTimeGrid(GridDefect::OutsideHorizon { index: 2, .. }))
        ));
    }

    #[test]
    fn trace_sample_display_does_not_panic() {
        let grid = TimeGrid::day(2).unwrap();
        let trace = SimulationTrace {
            flow_m3h: vec![0.0, 178.0],
            level_m: vec![154.0, 154.1],
            power_kw: vec![0.0, 146.0],
            energy_kwh: vec![0.0, 10.0],
            cost: vec![0.0, 0.7],
            switches: Vec::new(),
        };
        let s = trace.sample(&grid, 1).map(|row| row.to_string());
        assert!(s.is_some_and(|s| !s.is_empty()));
        assert!(trace.sample(&grid, 2).is_none());
        assert_eq!(trace.final_cost(), 0.7);
    }
}
