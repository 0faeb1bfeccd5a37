//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use rand::Rng;
use rand::rngs::StdRng;

use pump_sched::model::PhysicalModel;
use pump_sched::sim::TimeGrid;

/// Reference plant (260 m pump, 185 m² tank, reference tariff).
pub fn reference_model() -> PhysicalModel {
    PhysicalModel::reference()
}

/// Uniform grid over `[0, 24]` h with `samples` points.
pub fn day_grid(samples: usize) -> TimeGrid {
    TimeGrid::day(samples).expect("day grid should be valid")
}

/// One five-hour cycle starting at 1 h.
pub fn single_cycle() -> Vec<f64> {
    vec![1.0, 5.0]
}

/// Four cycles at 1, 5, 10, and 16 h.
pub fn reference_vector() -> Vec<f64> {
    vec![1.0, 5.0, 10.0, 16.0, 2.0, 3.0, 3.0, 3.0]
}

/// Three-cycle starting point of the robust pair.
pub fn robust_vector() -> Vec<f64> {
    vec![0.1, 7.352, 14.925, 4.0, 4.077, 2.073]
}

/// Random ordered schedule with 1 to 5 cycles.
///
/// The day is split into equal slots and each cycle starts and ends inside
/// its own slot, so cycles are separated by at least a tenth of a slot and
/// the last one ends well before midnight.
pub fn random_ordered_vector(rng: &mut StdRng) -> Vec<f64> {
    let cycles: usize = rng.random_range(1..=5);
    let slot = 24.0 / cycles as f64;
    let mut on_times = Vec::with_capacity(cycles);
    let mut durations = Vec::with_capacity(cycles);
    for i in 0..cycles {
        on_times.push(i as f64 * slot + rng.random_range(0.1 * slot..0.4 * slot));
        durations.push(rng.random_range(0.2..0.5 * slot));
    }
    on_times.extend(durations);
    on_times
}
