use std::time::Duration;

/// Pacing of the simulated analysis screen shown between the last answer and
/// the result. Progress climbs by `step` percent every `step_interval`, then
/// holds at 100 for `settle` before the result is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadingTimer {
    step: u8,
    step_interval: Duration,
    settle: Duration,
}

impl LoadingTimer {
    pub fn new(step: u8, step_interval: Duration, settle: Duration) -> Self {
        Self {
            step: step.clamp(1, 100),
            step_interval,
            settle,
        }
    }

    /// +2% every 50 ms, then a 500 ms pause at 100%.
    pub fn standard() -> Self {
        Self::new(2, Duration::from_millis(50), Duration::from_millis(500))
    }

    /// Same climb as [`LoadingTimer::standard`], stretched or squeezed to `total`.
    pub fn fixed(total: Duration) -> Self {
        let base = Self::standard();
        let step_interval = total / base.steps();
        let settle = total.saturating_sub(step_interval * base.steps());
        Self::new(base.step, step_interval, settle)
    }

    pub fn steps(&self) -> u32 {
        let step = u32::from(self.step);
        (100 + step - 1) / step
    }

    pub fn duration(&self) -> Duration {
        self.step_interval * self.steps() + self.settle
    }

    pub fn progress_at(&self, elapsed: Duration) -> u8 {
        if self.step_interval.is_zero() {
            return 100;
        }
        let ticks = elapsed.as_nanos() / self.step_interval.as_nanos();
        let progress = ticks.saturating_mul(u128::from(self.step)).min(100);
        progress as u8
    }

    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.duration().saturating_sub(elapsed)
    }
}

impl Default for LoadingTimer {
    fn default() -> Self {
        Self::standard()
    }
}
