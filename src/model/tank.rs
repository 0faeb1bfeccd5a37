use serde::Serialize;

/// Closed interval of admissible water levels (m).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelBounds {
    pub low_m: f64,
    pub high_m: f64,
}

impl LevelBounds {
    /// Creates a level interval.
    ///
    /// # Panics
    ///
    /// Panics if `low_m > high_m`.
    pub fn new(low_m: f64, high_m: f64) -> Self {
        assert!(low_m <= high_m, "level bounds must satisfy low <= high");
        Self { low_m, high_m }
    }

    pub fn contains(&self, level_m: f64) -> bool {
        (self.low_m..=self.high_m).contains(&level_m)
    }

    /// Distance outside the interval, zero when inside.
    pub fn violation(&self, level_m: f64) -> f64 {
        (self.low_m - level_m).max(level_m - self.high_m).max(0.0)
    }

    /// Returns `true` if `inner` lies entirely within `self`.
    pub fn encloses(&self, inner: &LevelBounds) -> bool {
        self.low_m <= inner.low_m && inner.high_m <= self.high_m
    }
}

/// Storage tank with a constant cross-section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tank {
    /// Free-surface area (m²).
    pub area_m2: f64,
    /// Level at the start of every simulated day (m).
    pub initial_level_m: f64,
    /// Soft limits for normal operation.
    pub operational: LevelBounds,
    /// Hard safety limits; always enclose `operational`.
    pub absolute: LevelBounds,
}

impl Tank {
    /// Creates a tank.
    ///
    /// # Panics
    ///
    /// Panics if the area is not positive or the operational bounds are not
    /// nested inside the absolute bounds.
    pub fn new(
        area_m2: f64,
        initial_level_m: f64,
        operational: LevelBounds,
        absolute: LevelBounds,
    ) -> Self {
        assert!(area_m2 > 0.0, "tank area must be > 0");
        assert!(
            absolute.encloses(&operational),
            "operational bounds must lie within absolute bounds"
        );
        Self {
            area_m2,
            initial_level_m,
            operational,
            absolute,
        }
    }

    /// Rate of level change for a net inflow (m/h).
    pub fn level_rate_m_h(&self, net_inflow_m3h: f64) -> f64 {
        net_inflow_m3h / self.area_m2
    }
}

impl Default for Tank {
    fn default() -> Self {
        Self::new(
            185.0,
            154.0,
            LevelBounds::new(152.0, 157.0),
            LevelBounds::new(150.0, 159.0),
        )
    }
}
