//! Immutable bundle of every physical constant the simulator reads.

use super::demand::{DemandCurve, DemandProfile};
use super::pipes::{LossCoefficients, PipeNetwork};
use super::pump::PumpCurve;
use super::tank::Tank;
use super::tariff::TariffTable;

/// Seconds in one hour; the model works in hours throughout.
pub const SECONDS_PER_HOUR: f64 = 3600.0;
/// Standard gravity (m/s²).
pub const STANDARD_GRAVITY_M_S2: f64 = 9.81;
/// Density of water (kg/m³).
pub const WATER_DENSITY_KG_M3: f64 = 1000.0;

/// Pump, consumption, pipes, tank, and tariff of a single pump/single tank system.
///
/// Built once and only read afterwards, so one instance can back any number of
/// concurrent simulation runs. Friction-loss coefficients are derived from the
/// pipe geometry at construction.
///
/// Units: flow m³/h, head and level m, time h, power kW.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalModel {
    pump: PumpCurve,
    demand: DemandProfile,
    pipes: PipeNetwork,
    losses: LossCoefficients,
    tank: Tank,
    tariff: TariffTable,
    density_kg_m3: f64,
    gravity_m_h2: f64,
}

impl PhysicalModel {
    /// Creates a model and derives the pipe loss coefficients.
    ///
    /// # Arguments
    ///
    /// * `pump` - Head-flow curve and efficiency
    /// * `demand` - Base and secondary consumption curves
    /// * `pipes` - Pipe geometry and friction factor
    /// * `tank` - Tank geometry and level limits
    /// * `tariff` - Day-ahead electricity prices
    /// * `density_kg_m3` - Water density (must be > 0)
    /// * `gravity_m_s2` - Gravitational acceleration in SI units (must be > 0)
    ///
    /// # Panics
    ///
    /// Panics if `density_kg_m3` or `gravity_m_s2` is not positive.
    pub fn new(
        pump: PumpCurve,
        demand: DemandProfile,
        pipes: PipeNetwork,
        tank: Tank,
        tariff: TariffTable,
        density_kg_m3: f64,
        gravity_m_s2: f64,
    ) -> Self {
        assert!(density_kg_m3 > 0.0, "density must be > 0");
        assert!(gravity_m_s2 > 0.0, "gravity must be > 0");
        let gravity_m_h2 = gravity_m_s2 * SECONDS_PER_HOUR * SECONDS_PER_HOUR;
        Self {
            pump,
            demand,
            pipes,
            losses: pipes.loss_coefficients(gravity_m_h2),
            tank,
            tariff,
            density_kg_m3,
            gravity_m_h2,
        }
    }

    /// The reference plant: 260 m pump, 185 m² tank, 2.5 km + 5 km mains.
    pub fn reference() -> Self {
        Self::new(
            PumpCurve::default(),
            DemandProfile::default(),
            PipeNetwork::default(),
            Tank::default(),
            TariffTable::default(),
            WATER_DENSITY_KG_M3,
            STANDARD_GRAVITY_M_S2,
        )
    }

    pub fn pump(&self) -> &PumpCurve {
        &self.pump
    }

    pub fn demand(&self) -> &DemandProfile {
        &self.demand
    }

    pub fn pipes(&self) -> &PipeNetwork {
        &self.pipes
    }

    pub fn losses(&self) -> &LossCoefficients {
        &self.losses
    }

    pub fn tank(&self) -> &Tank {
        &self.tank
    }

    pub fn tariff(&self) -> &TariffTable {
        &self.tariff
    }

    pub fn density_kg_m3(&self) -> f64 {
        self.density_kg_m3
    }

    /// Gravity in m/h², matching the hour-based flow units.
    pub fn gravity_m_h2(&self) -> f64 {
        self.gravity_m_h2
    }

    /// Electrical power drawn by the pump at `flow_m3h` (kW).
    ///
    /// `P = rho * g * Q * h(Q) / eta`, normalized from kg·m²/h³ to kW.
    pub fn pump_power_kw(&self, flow_m3h: f64) -> f64 {
        let hydraulic =
            self.density_kg_m3 * self.gravity_m_h2 * flow_m3h * self.pump.head_m(flow_m3h);
        hydraulic / self.pump.efficiency / (1000.0 * SECONDS_PER_HOUR.powi(3))
    }

    /// Tank level rate of change for a given pump flow at hour `t` (m/h).
    pub fn level_rate_m_h(&self, flow_m3h: f64, curve: DemandCurve, t: f64) -> f64 {
        self.tank.level_rate_m_h(flow_m3h - self.demand.total_m3h(curve, t))
    }
}

impl Default for PhysicalModel {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn power_matches_si_formula() {
        let model = PhysicalModel::reference();
        let q = 178.0;
        // rho * g[m/s2] * Q[m3/s] * h / eta, in kW
        let expected = 1000.0 * 9.81 * (q / 3600.0) * model.pump().head_m(q) / 0.65 / 1000.0;
        assert_relative_eq!(model.pump_power_kw(q), expected, max_relative = 1e-12);
    }

    #[test]
    fn power_is_zero_without_flow() {
        assert_eq!(PhysicalModel::reference().pump_power_kw(0.0), 0.0);
    }

    #[test]
    fn level_falls_with_pump_off() {
        let model = PhysicalModel::reference();
        // 95.393 m3/h drawn at midnight over 185 m2
        assert_relative_eq!(
            model.level_rate_m_h(0.0, DemandCurve::Max, 0.0),
            -95.393 / 185.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn model_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PhysicalModel>();
    }
}
