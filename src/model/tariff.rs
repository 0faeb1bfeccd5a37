/// Number of pricing blocks in a day.
pub const BLOCKS: usize = 12;
/// Length of one pricing block (h).
pub const BLOCK_HOURS: f64 = 2.0;

/// Day-ahead electricity price per two-hour block (currency/kWh).
///
/// Block `b` covers `[2b, 2b + 2)` hours. The end of the day, `t = 24`, belongs
/// to the last block.
///
/// # Examples
///
/// ```
/// use pump_sched::model::tariff::TariffTable;
///
/// let tariff = TariffTable::default();
/// assert_eq!(tariff.block_index(0.0), 0);
/// assert_eq!(tariff.block_index(3.9), 1);
/// assert_eq!(tariff.block_index(24.0), 11);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TariffTable {
    rates: [f64; BLOCKS],
}

impl TariffTable {
    pub fn new(rates: [f64; BLOCKS]) -> Self {
        Self { rates }
    }

    /// Block covering hour `t`, clamped into `0..BLOCKS`.
    pub fn block_index(&self, t: f64) -> usize {
        let block = (t / BLOCK_HOURS).floor();
        if block <= 0.0 {
            0
        } else {
            (block as usize).min(BLOCKS - 1)
        }
    }

    /// Price in effect at hour `t`.
    pub fn rate_at(&self, t: f64) -> f64 {
        self.rates[self.block_index(t)]
    }

    /// Lowest price of the day.
    pub fn cheapest(&self) -> f64 {
        self.rates.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn rates(&self) -> &[f64; BLOCKS] {
        &self.rates
    }
}

/// Reference day-ahead prices (EUR/kWh).
pub const REFERENCE_RATES: [f64; BLOCKS] = [
    0.0713, 0.0651, 0.0593, 0.0778, 0.0851, 0.0923, 0.0968, 0.10094, 0.10132, 0.10230, 0.10189,
    0.10132,
];

impl Default for TariffTable {
    fn default() -> Self {
        Self::new(REFERENCE_RATES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_two_hours_wide() {
        let t = TariffTable::default();
        assert_eq!(t.rate_at(0.0), 0.0713);
        assert_eq!(t.rate_at(1.999), 0.0713);
        assert_eq!(t.rate_at(2.0), 0.0651);
        assert_eq!(t.rate_at(23.5), 0.10132);
    }

    #[test]
    fn end_of_day_uses_last_block() {
        let t = TariffTable::default();
        assert_eq!(t.block_index(24.0), BLOCKS - 1);
        assert_eq!(t.rate_at(24.0), REFERENCE_RATES[BLOCKS - 1]);
        // past the horizon still clamps
        assert_eq!(t.block_index(24.0 + 1e-9), BLOCKS - 1);
    }

    #[test]
    fn negative_time_uses_first_block() {
        let t = TariffTable::default();
        assert_eq!(t.block_index(-1e-12), 0);
    }

    #[test]
    fn cheapest_rate() {
        assert_eq!(TariffTable::default().cheapest(), 0.0593);
    }
}
