//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::model::demand::{BASE_COEFFICIENTS, HIGH_COEFFICIENTS, LOW_COEFFICIENTS};
use crate::model::physical::{STANDARD_GRAVITY_M_S2, WATER_DENSITY_KG_M3};
use crate::model::tariff::{BLOCKS, REFERENCE_RATES};
use crate::model::{
    DemandCurve, DemandProfile, LevelBounds, PhysicalModel, PipeNetwork, Polynomial, PumpCurve,
    Tank, TariffTable,
};
use crate::problem::{LevelLimits, ScheduleProblem};
use crate::sim::error::SimError;
use crate::sim::types::{DutySchedule, TimeGrid};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the reference plant and schedule. Load
/// from TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::reference`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Time grid, demand envelope, and level limits.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Duty cycles to simulate.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Pump head curve and efficiency.
    #[serde(default)]
    pub pump: PumpConfig,
    /// Fluid and gravity constants.
    #[serde(default)]
    pub fluid: FluidConfig,
    /// Pipe geometry.
    #[serde(default)]
    pub pipes: PipesConfig,
    /// Tank geometry and level limits.
    #[serde(default)]
    pub tank: TankConfig,
    /// Consumption polynomials.
    #[serde(default)]
    pub demand: DemandConfig,
    /// Two-hour electricity prices.
    #[serde(default)]
    pub tariff: TariffConfig,
}

/// Time grid and evaluation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Samples over `[0, 24]` h, endpoints included (must be >= 2).
    pub samples: usize,
    /// Secondary consumption envelope: `"max"` or `"min"`.
    pub demand: DemandCurve,
    /// Level limits checked by evaluation: `"operational"` or `"absolute"`.
    pub limits: LevelLimits,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            samples: 40_000,
            demand: DemandCurve::Max,
            limits: LevelLimits::Operational,
        }
    }
}

/// Duty cycles as parallel start-time and duration lists (h).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    pub on_times: Vec<f64>,
    pub durations: Vec<f64>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            on_times: vec![1.0, 5.0, 10.0, 16.0],
            durations: vec![2.0, 3.0, 3.0, 3.0],
        }
    }
}

/// Pump curve `h(Q) = shutoff_head_m + curve_coefficient * Q^2`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PumpConfig {
    /// Head at zero flow (m).
    pub shutoff_head_m: f64,
    /// Quadratic coefficient (m per (m³/h)²).
    pub curve_coefficient: f64,
    /// Pump efficiency in `(0, 1]`.
    pub efficiency: f64,
}

impl Default for PumpConfig {
    fn default() -> Self {
        let pump = PumpCurve::default();
        Self {
            shutoff_head_m: pump.a1,
            curve_coefficient: pump.a2,
            efficiency: pump.efficiency,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FluidConfig {
    /// Water density (kg/m³).
    pub density_kg_m3: f64,
    /// Gravitational acceleration (m/s²).
    pub gravity_m_s2: f64,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            density_kg_m3: WATER_DENSITY_KG_M3,
            gravity_m_s2: STANDARD_GRAVITY_M_S2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipesConfig {
    /// Main from the pump to the junction (m).
    pub pump_main_length_m: f64,
    /// Main from the junction to the tank (m).
    pub tank_main_length_m: f64,
    /// Inner diameter of both mains (m).
    pub diameter_m: f64,
    /// Darcy friction factor.
    pub friction_factor: f64,
}

impl Default for PipesConfig {
    fn default() -> Self {
        let pipes = PipeNetwork::default();
        Self {
            pump_main_length_m: pipes.pump_main_length_m,
            tank_main_length_m: pipes.tank_main_length_m,
            diameter_m: pipes.diameter_m,
            friction_factor: pipes.friction_factor,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TankConfig {
    /// Free-surface area (m²).
    pub area_m2: f64,
    /// Level at midnight (m).
    pub initial_level_m: f64,
    pub operational_low_m: f64,
    pub operational_high_m: f64,
    pub absolute_low_m: f64,
    pub absolute_high_m: f64,
}

impl Default for TankConfig {
    fn default() -> Self {
        let tank = Tank::default();
        Self {
            area_m2: tank.area_m2,
            initial_level_m: tank.initial_level_m,
            operational_low_m: tank.operational.low_m,
            operational_high_m: tank.operational.high_m,
            absolute_low_m: tank.absolute.low_m,
            absolute_high_m: tank.absolute.high_m,
        }
    }
}

/// Consumption polynomials in ascending powers of `t` (m³/h).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemandConfig {
    pub base: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            base: BASE_COEFFICIENTS.to_vec(),
            high: HIGH_COEFFICIENTS.to_vec(),
            low: LOW_COEFFICIENTS.to_vec(),
        }
    }
}

/// Twelve prices per kWh, one per two-hour block starting at midnight.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    pub rates: Vec<f64>,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            rates: REFERENCE_RATES.to_vec(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.samples"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the reference scenario: four cycles at 1, 5, 10, and 16 h.
    pub fn reference() -> Self {
        Self::default()
    }

    /// Returns the six-cycle nominal starting point on a 30 000-sample grid.
    pub fn six_cycle() -> Self {
        Self {
            simulation: SimulationConfig {
                samples: 30_000,
                ..SimulationConfig::default()
            },
            schedule: ScheduleConfig {
                on_times: vec![1.105, 5.4, 12.35, 17.6, 19.8, 23.0],
                durations: vec![4.2, 2.4, 2.35, 1.5, 0.5, 0.7],
            },
            ..Self::default()
        }
    }

    /// Returns the three-cycle robust starting point under maximum
    /// consumption, checked against the absolute limits.
    pub fn robust_max() -> Self {
        Self {
            simulation: SimulationConfig {
                samples: 30_000,
                demand: DemandCurve::Max,
                limits: LevelLimits::Absolute,
            },
            schedule: Self::robust_schedule(),
            ..Self::default()
        }
    }

    /// Same schedule as [`ScenarioConfig::robust_max`] under minimum consumption.
    pub fn robust_min() -> Self {
        Self {
            simulation: SimulationConfig {
                samples: 30_000,
                demand: DemandCurve::Min,
                limits: LevelLimits::Absolute,
            },
            schedule: Self::robust_schedule(),
            ..Self::default()
        }
    }

    fn robust_schedule() -> ScheduleConfig {
        ScheduleConfig {
            on_times: vec![0.1, 7.352, 14.925],
            durations: vec![4.0, 4.077, 2.073],
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["reference", "six_cycle", "robust_max", "robust_min"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "reference" => Ok(Self::reference()),
            "six_cycle" => Ok(Self::six_cycle()),
            "robust_max" => Ok(Self::robust_max()),
            "robust_min" => Ok(Self::robust_min()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid. A valid
    /// configuration never panics in [`ScenarioConfig::to_model`].
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut positive = |field: &str, value: f64| {
            if !(value.is_finite() && value > 0.0) {
                errors.push(ConfigError::new(field, "must be finite and > 0"));
            }
        };

        positive("pump.shutoff_head_m", self.pump.shutoff_head_m);
        positive("fluid.density_kg_m3", self.fluid.density_kg_m3);
        positive("fluid.gravity_m_s2", self.fluid.gravity_m_s2);
        positive("pipes.pump_main_length_m", self.pipes.pump_main_length_m);
        positive("pipes.tank_main_length_m", self.pipes.tank_main_length_m);
        positive("pipes.diameter_m", self.pipes.diameter_m);
        positive("pipes.friction_factor", self.pipes.friction_factor);
        positive("tank.area_m2", self.tank.area_m2);

        if self.simulation.samples < 2 {
            errors.push(ConfigError::new("simulation.samples", "must be >= 2"));
        }

        let p = &self.pump;
        if !(p.efficiency > 0.0 && p.efficiency <= 1.0) {
            errors.push(ConfigError::new("pump.efficiency", "must be in (0.0, 1.0]"));
        }
        if !p.curve_coefficient.is_finite() || p.curve_coefficient >= 0.0 {
            errors.push(ConfigError::new(
                "pump.curve_coefficient",
                "must be finite and < 0",
            ));
        }

        let t = &self.tank;
        if !t.initial_level_m.is_finite() {
            errors.push(ConfigError::new("tank.initial_level_m", "must be finite"));
        }
        if !(t.operational_low_m <= t.operational_high_m) {
            errors.push(ConfigError::new(
                "tank.operational_low_m",
                "must be <= tank.operational_high_m",
            ));
        }
        if !(t.absolute_low_m <= t.absolute_high_m) {
            errors.push(ConfigError::new(
                "tank.absolute_low_m",
                "must be <= tank.absolute_high_m",
            ));
        }
        if t.operational_low_m < t.absolute_low_m || t.operational_high_m > t.absolute_high_m {
            errors.push(ConfigError::new(
                "tank.operational_low_m",
                "operational limits must lie within absolute limits",
            ));
        }

        for (field, coefficients) in [
            ("demand.base", &self.demand.base),
            ("demand.high", &self.demand.high),
            ("demand.low", &self.demand.low),
        ] {
            if coefficients.iter().any(|c| !c.is_finite()) {
                errors.push(ConfigError::new(field, "coefficients must be finite"));
            }
        }

        let rates = &self.tariff.rates;
        if rates.len() != BLOCKS {
            errors.push(ConfigError::new(
                "tariff.rates",
                format!("must have {BLOCKS} entries, got {}", rates.len()),
            ));
        }
        if rates.iter().any(|r| !r.is_finite() || *r < 0.0) {
            errors.push(ConfigError::new("tariff.rates", "must be finite and >= 0"));
        }

        if let Err(e) = self.schedule() {
            errors.push(ConfigError::new("schedule", e.to_string()));
        }

        errors
    }

    /// Builds the physical model.
    ///
    /// # Panics
    ///
    /// Panics if [`ScenarioConfig::validate`] reports errors.
    pub fn to_model(&self) -> PhysicalModel {
        let mut rates = [0.0; BLOCKS];
        for (slot, rate) in rates.iter_mut().zip(&self.tariff.rates) {
            *slot = *rate;
        }
        let t = &self.tank;

        PhysicalModel::new(
            PumpCurve::new(
                self.pump.shutoff_head_m,
                self.pump.curve_coefficient,
                self.pump.efficiency,
            ),
            DemandProfile::new(
                Polynomial::new(self.demand.base.clone()),
                Polynomial::new(self.demand.high.clone()),
                Polynomial::new(self.demand.low.clone()),
            ),
            PipeNetwork::new(
                self.pipes.pump_main_length_m,
                self.pipes.tank_main_length_m,
                self.pipes.diameter_m,
                self.pipes.friction_factor,
            ),
            Tank::new(
                t.area_m2,
                t.initial_level_m,
                LevelBounds::new(t.operational_low_m, t.operational_high_m),
                LevelBounds::new(t.absolute_low_m, t.absolute_high_m),
            ),
            TariffTable::new(rates),
            self.fluid.density_kg_m3,
            self.fluid.gravity_m_s2,
        )
    }

    /// The configured duty cycles.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MalformedDecisionVector`] for mismatched, negative,
    /// or non-finite entries.
    pub fn schedule(&self) -> Result<DutySchedule, SimError> {
        DutySchedule::new(
            self.schedule.on_times.clone(),
            self.schedule.durations.clone(),
        )
    }

    /// Uniform day grid with [`SimulationConfig::samples`] points.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::DegenerateTimeGrid`] for fewer than two samples.
    pub fn grid(&self) -> Result<TimeGrid, SimError> {
        TimeGrid::day(self.simulation.samples)
    }

    /// Problem instance for `model`, which should come from
    /// [`ScenarioConfig::to_model`].
    ///
    /// # Errors
    ///
    /// See [`ScenarioConfig::grid`].
    pub fn problem<'a>(&self, model: &'a PhysicalModel) -> Result<ScheduleProblem<'a>, SimError> {
        Ok(ScheduleProblem::new(
            model,
            self.grid()?,
            self.simulation.demand,
            self.simulation.limits,
        ))
    }
}
