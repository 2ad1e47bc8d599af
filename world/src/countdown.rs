//! Stage countdown driven by simulation ticks.

use std::time::Duration;

use ferry_crossing_core::COUNTDOWN_PERIOD;

/// Countdown measured in whole tenths of a second.
///
/// Time accumulates only while the countdown is running; each full
/// [`COUNTDOWN_PERIOD`] removes one tenth, saturating at zero.
#[derive(Clone, Debug, Default)]
pub(crate) struct Countdown {
    ceiling: u32,
    remaining: u32,
    accumulator: Duration,
    running: bool,
}

impl Countdown {
    /// Re-arms the countdown at `ceiling` tenths and starts it, discarding any partial period.
    pub(crate) fn arm(&mut self, ceiling: u32) {
        self.ceiling = ceiling;
        self.remaining = ceiling;
        self.accumulator = Duration::ZERO;
        self.running = true;
    }

    /// Stops the countdown, keeping the remaining value visible.
    pub(crate) fn freeze(&mut self) {
        self.accumulator = Duration::ZERO;
        self.running = false;
    }

    /// Accumulates `dt`, returning the new remaining value if it changed.
    pub(crate) fn advance(&mut self, dt: Duration) -> Option<u32> {
        if !self.running {
            return None;
        }

        let accumulated = self.accumulator.saturating_add(dt).as_nanos();
        let period = COUNTDOWN_PERIOD.as_nanos();
        let elapsed = u32::try_from(accumulated / period).unwrap_or(u32::MAX);
        let carry = u64::try_from(accumulated % period).unwrap_or(0);
        self.accumulator = Duration::from_nanos(carry);

        let before = self.remaining;
        self.remaining = self.remaining.saturating_sub(elapsed);

        (self.remaining != before).then_some(self.remaining)
    }

    /// Tenths consumed since the countdown was last armed.
    pub(crate) fn consumed(&self) -> u32 {
        self.ceiling.saturating_sub(self.remaining)
    }

    pub(crate) fn remaining(&self) -> u32 {
        self.remaining
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }
}
