use std::num::NonZeroUsize;
use std::thread;

use super::ScheduleProblem;
use crate::sim::error::SimError;

/// Finite-difference step (h) used by the reference optimizer setup.
pub const DEFAULT_STEP_H: f64 = 1e-4;

/// Forward-difference gradient of the objective at `x`.
///
/// Perturbed points are simulated on scoped worker threads. Runs share nothing
/// but the read-only problem, so the result equals a sequential evaluation.
///
/// # Errors
///
/// Returns the first error of the base point or of any perturbed point; an
/// infeasible perturbation makes the gradient undefined.
pub fn objective_gradient(
    problem: &ScheduleProblem<'_>,
    x: &[f64],
    step_h: f64,
) -> Result<Vec<f64>, SimError> {
    let base = problem.objective(x)?;
    let workers = thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(x.len())
        .max(1);
    let chunk = x.len().div_ceil(workers).max(1);
    let indices: Vec<usize> = (0..x.len()).collect();

    thread::scope(|scope| {
        let handles: Vec<_> = indices
            .chunks(chunk)
            .map(|part| {
                scope.spawn(move || {
                    part.iter()
                        .map(|&i| {
                            let mut shifted = x.to_vec();
                            shifted[i] += step_h;
                            problem.objective(&shifted).map(|f| (f - base) / step_h)
                        })
                        .collect::<Result<Vec<f64>, SimError>>()
                })
            })
            .collect();

        let mut gradient = Vec::with_capacity(x.len());
        for handle in handles {
            match handle.join() {
                Ok(part) => gradient.extend(part?),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        Ok(gradient)
    })
}
