//! Pump scheduling simulator for a single-pump, single-tank water supply.
//!
//! Given on-times and durations of the pump's duty cycles, the simulator
//! integrates the tank level over one day, solving the network's energy
//! balance for the pump flow at every sample and accumulating electrical
//! energy and time-of-use cost. The [`problem`] layer turns that into an
//! objective and constraints for an external optimizer.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod io;
/// Pump, demand, pipe, tank, and tariff description.
pub mod model;
pub mod problem;
/// Flow solver, duty-cycle cursor, and the day simulation.
pub mod sim;
