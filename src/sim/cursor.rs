use super::types::DutySchedule;

/// Outcome of advancing the cursor to a new sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// The given cycle switched the pump on.
    SwitchedOn(usize),
    /// The given cycle ended and the pump switched off.
    SwitchedOff(usize),
}

/// ON/OFF state machine walking the duty cycles of a schedule.
///
/// At most one transition fires per sample, and closing the current cycle is
/// checked before opening the next, so a cycle always ends before its
/// successor begins. Once every cycle has closed the cursor is exhausted and
/// never switches again.
///
/// # Examples
///
/// ```
/// use pump_sched::sim::cursor::{PumpCycleCursor, Transition};
/// use pump_sched::sim::types::DutySchedule;
///
/// let schedule = DutySchedule::new(vec![1.0], vec![2.0]).unwrap();
/// let mut cursor = PumpCycleCursor::new(&schedule);
/// assert_eq!(cursor.advance(0.5), Transition::Unchanged);
/// assert_eq!(cursor.advance(1.0), Transition::SwitchedOn(0));
/// assert_eq!(cursor.advance(3.0), Transition::SwitchedOff(0));
/// assert!(cursor.is_exhausted());
/// ```
#[derive(Debug, Clone)]
pub struct PumpCycleCursor<'a> {
    schedule: &'a DutySchedule,
    cycle: usize,
    active: bool,
}

impl<'a> PumpCycleCursor<'a> {
    pub fn new(schedule: &'a DutySchedule) -> Self {
        Self {
            schedule,
            cycle: 0,
            active: false,
        }
    }

    /// Applies the transition rule for a sample at hour `t`.
    pub fn advance(&mut self, t: f64) -> Transition {
        if self.active {
            if t >= self.schedule.off_time(self.cycle) {
                let closed = self.cycle;
                self.active = false;
                self.cycle += 1;
                return Transition::SwitchedOff(closed);
            }
        } else if self.cycle < self.schedule.cycles() && t >= self.schedule.on_time(self.cycle) {
            self.active = true;
            return Transition::SwitchedOn(self.cycle);
        }
        Transition::Unchanged
    }

    /// Whether the pump is currently ON.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Index of the current (or next) duty cycle; equals `n` once exhausted.
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// No further cycles will open.
    pub fn is_exhausted(&self) -> bool {
        self.cycle >= self.schedule.cycles()
    }
}
