/// Quadratic head-flow characteristic of a centrifugal pump.
///
/// The delivered head follows `h(Q) = a1 + a2 * Q^2` with flow in m³/h and head
/// in meters. With `a2 < 0` the curve falls from the shut-off head `a1` to zero
/// at [`PumpCurve::runout_flow_m3h`]; beyond that point the curve has no
/// physical meaning.
///
/// # Examples
///
/// ```
/// use pump_sched::model::pump::PumpCurve;
///
/// let pump = PumpCurve::default();
/// assert_eq!(pump.head_m(0.0), 260.0);
/// assert!(pump.head_m(100.0) < pump.head_m(50.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PumpCurve {
    /// Shut-off head (m).
    pub a1: f64,
    /// Quadratic head coefficient (m per (m³/h)²).
    pub a2: f64,
    /// Wire-to-water efficiency (0..1.0).
    pub efficiency: f64,
}

impl PumpCurve {
    /// Creates a pump curve.
    ///
    /// # Panics
    ///
    /// Panics if `efficiency` is outside `(0, 1]` or `a1` is not positive.
    pub fn new(a1: f64, a2: f64, efficiency: f64) -> Self {
        assert!(a1 > 0.0, "shut-off head must be > 0");
        assert!(efficiency > 0.0 && efficiency <= 1.0);
        Self { a1, a2, efficiency }
    }

    /// Head delivered at `flow_m3h` (m).
    pub fn head_m(&self, flow_m3h: f64) -> f64 {
        self.a1 + self.a2 * flow_m3h * flow_m3h
    }

    /// Flow at which the head drops to zero, or infinity for a non-falling curve.
    pub fn runout_flow_m3h(&self) -> f64 {
        if self.a2 < 0.0 {
            (-self.a1 / self.a2).sqrt()
        } else {
            f64::INFINITY
        }
    }
}

impl Default for PumpCurve {
    fn default() -> Self {
        Self::new(260.0, -0.002, 0.65)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutoff_head_is_a1() {
        assert_eq!(PumpCurve::default().head_m(0.0), 260.0);
    }

    #[test]
    fn head_strictly_decreasing_for_positive_flow() {
        let pump = PumpCurve::default();
        let mut prev = pump.head_m(0.0);
        for i in 1..=360 {
            let h = pump.head_m(f64::from(i));
            assert!(h < prev, "head not decreasing at Q={i}");
            prev = h;
        }
    }

    #[test]
    fn runout_flow_zeroes_head() {
        let pump = PumpCurve::default();
        let q = pump.runout_flow_m3h();
        assert!(pump.head_m(q).abs() < 1e-9);
    }

    #[test]
    #[should_panic]
    fn zero_efficiency_panics() {
        PumpCurve::new(260.0, -0.002, 0.0);
    }
}
