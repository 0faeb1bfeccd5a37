/// Duty-cycle state machine.
pub mod cursor;
pub mod engine;
pub mod error;
pub mod kpi;
/// Closed-form pump flow solver.
pub mod solver;
pub mod types;

pub use engine::{Simulator, simulate};
pub use error::{GridDefect, ScheduleDefect, SimError};
pub use kpi::TraceReport;
pub use types::{DutySchedule, SimulationTrace, TimeGrid};
