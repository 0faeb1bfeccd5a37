//! Constraint functions in the `c(x) >= 0` convention.
//!
//! Every function returns one value per constraint; a negative value is a
//! violation of that size.

use crate::model::LevelBounds;
use crate::sim::types::{DutySchedule, HORIZON_HOURS};

/// Box bounds `0 <= x_i <= 24` for a schedule of `cycles` duty cycles.
pub fn bounds(cycles: usize) -> Vec<(f64, f64)> {
    vec![(0.0, HORIZON_HOURS); 2 * cycles]
}

/// Largest amount by which any decision component leaves `[0, 24]`.
pub fn bound_violation(schedule: &DutySchedule) -> f64 {
    schedule
        .on_times()
        .iter()
        .chain(schedule.durations())
        .map(|&v| (-v).max(v - HORIZON_HOURS))
        .fold(0.0, f64::max)
}

/// Non-overlap constraints `on[i+1] - on[i] - dur[i]` for consecutive cycles.
pub fn ordering(schedule: &DutySchedule) -> Vec<f64> {
    (0..schedule.cycles().saturating_sub(1))
        .map(|i| schedule.on_time(i + 1) - schedule.off_time(i))
        .collect()
}

/// Last cycle must end by midnight: `24 - on[n-1] - dur[n-1]`.
pub fn horizon(schedule: &DutySchedule) -> Option<f64> {
    let last = schedule.cycles().checked_sub(1)?;
    Some(HORIZON_HOURS - schedule.off_time(last))
}

/// Ordering constraints followed by the horizon constraint.
pub fn schedule_constraints(schedule: &DutySchedule) -> Vec<f64> {
    let mut values = ordering(schedule);
    values.extend(horizon(schedule));
    values
}

/// Level constraints `z_k - low` for every sample followed by `high - z_k`.
pub fn level_constraints(levels: &[f64], limits: &LevelBounds) -> Vec<f64> {
    let mut values = Vec::with_capacity(2 * levels.len());
    values.extend(levels.iter().map(|z| z - limits.low_m));
    values.extend(levels.iter().map(|z| limits.high_m - z));
    values
}

/// Size of the worst violation among `values`, zero when all are satisfied.
pub fn max_violation(values: &[f64]) -> f64 {
    values.iter().map(|&c| -c).fold(0.0, f64::max)
}
