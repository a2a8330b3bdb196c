use std::time::{Duration, Instant};

pub struct Time {
    start: Instant,
    last: Instant,
    pub delta: Duration,
}
impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now, delta: Duration::from_secs_f32(0.0) }
    }
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last;
        self.last = now;
    }
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
    pub fn elapsed_seconds(&self) -> f32 {
        self.last.duration_since(self.start).as_secs_f32()
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

/// Fires at a fixed period from accumulated frame deltas. The visibility
/// re-check runs off one of these rather than every frame.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    period: f32,
    accumulated: f32,
}

impl IntervalTimer {
    pub fn new(period: f32) -> Self {
        Self { period: period.max(1e-3), accumulated: 0.0 }
    }

    /// Returns true when at least one period has elapsed. Multiple missed
    /// periods collapse into a single firing; the check is idempotent.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.accumulated += dt.max(0.0);
        if self.accumulated >= self.period {
            self.accumulated %= self.period;
            true
        } else {
            false
        }
    }
}
