use std::f64::consts::PI;

/// Two-pipe network between the pump and the tank.
///
/// The pump main carries the full pump flow up to the base-consumption
/// tap-off; the tank main carries what is left of it into the tank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipeNetwork {
    /// Length of the pipe carrying the full pump flow (m).
    pub pump_main_length_m: f64,
    /// Length of the pipe carrying pump flow net of base consumption (m).
    pub tank_main_length_m: f64,
    /// Inner diameter shared by both pipes (m).
    pub diameter_m: f64,
    /// Fanning friction factor (dimensionless).
    pub friction_factor: f64,
}

/// Friction-loss coefficients `k` in `h_L = k * Q^2` (m per (m³/h)²).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossCoefficients {
    /// Pump main.
    pub k1: f64,
    /// Tank main.
    pub k2: f64,
}

impl PipeNetwork {
    /// Creates a pipe network.
    ///
    /// # Panics
    ///
    /// Panics if any length, the diameter, or the friction factor is not positive.
    pub fn new(
        pump_main_length_m: f64,
        tank_main_length_m: f64,
        diameter_m: f64,
        friction_factor: f64,
    ) -> Self {
        assert!(pump_main_length_m > 0.0 && tank_main_length_m > 0.0);
        assert!(diameter_m > 0.0);
        assert!(friction_factor > 0.0);
        Self {
            pump_main_length_m,
            tank_main_length_m,
            diameter_m,
            friction_factor,
        }
    }

    /// Derives the loss coefficients for gravity expressed in m/h².
    ///
    /// `k = 32 f L / (d^5 g pi^2)`
    pub fn loss_coefficients(&self, gravity_m_h2: f64) -> LossCoefficients {
        let denom = self.diameter_m.powi(5) * gravity_m_h2 * PI * PI;
        let per_length = 32.0 * self.friction_factor / denom;
        LossCoefficients {
            k1: per_length * self.pump_main_length_m,
            k2: per_length * self.tank_main_length_m,
        }
    }
}

impl Default for PipeNetwork {
    fn default() -> Self {
        Self::new(2500.0, 5000.0, 0.3, 0.02)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn coefficients_scale_with_length() {
        let k = PipeNetwork::default().loss_coefficients(9.81 * 3600.0 * 3600.0);
        assert_relative_eq!(k.k2, 2.0 * k.k1, max_relative = 1e-12);
    }

    #[test]
    fn reference_coefficient_magnitude() {
        let k = PipeNetwork::default().loss_coefficients(9.81 * 3600.0 * 3600.0);
        // 1600 / (0.3^5 * 9.81 * 3600^2 * pi^2)
        assert_relative_eq!(k.k1, 5.2473e-4, max_relative = 1e-3);
    }
}
