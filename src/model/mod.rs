//! Physical description of the pump, consumption, pipes, tank, and tariff.

/// Base and worst-case consumption curves.
pub mod demand;
pub mod physical;
/// Pipe geometry and friction losses.
pub mod pipes;
/// Pump head-flow curve.
pub mod pump;
pub mod tank;
/// Day-ahead time-of-use prices.
pub mod tariff;

pub use demand::{DemandCurve, DemandProfile, Polynomial};
pub use physical::PhysicalModel;
pub use pipes::{LossCoefficients, PipeNetwork};
pub use pump::PumpCurve;
pub use tank::{LevelBounds, Tank};
pub use tariff::TariffTable;
