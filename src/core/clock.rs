//! Frame timing.

use std::time::{Duration, Instant};

/// A clock for measuring elapsed time and delta time.
#[derive(Debug, Default)]
pub struct Clock {
    start: Option<Instant>,
    last: Option<Instant>,
    elapsed_time: f64,
}

impl Clock {
    /// Create a new clock (not started).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and start a new clock.
    pub fn start_new() -> Self {
        let mut clock = Self::new();
        clock.start();
        clock
    }

    /// Start (or restart) the clock.
    pub fn start(&mut self) {
        let now = Instant::now();
        self.start = Some(now);
        self.last = Some(now);
        self.elapsed_time = 0.0;
    }

    /// Seconds since the previous call. Starts the clock and returns 0 if stopped.
    pub fn get_delta(&mut self) -> f64 {
        let Some(last) = self.last else {
            self.start();
            return 0.0;
        };
        let now = Instant::now();
        let diff = now.duration_since(last).as_secs_f64();
        self.last = Some(now);
        self.elapsed_time += diff;
        diff
    }

    /// Total seconds accumulated through [`Clock::get_delta`].
    #[inline]
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// Check if the clock is running.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.start.is_some()
    }
}

/// Caps the frame rate by sleeping off the unused part of each frame budget.
#[derive(Debug, Clone, Copy)]
pub struct FrameLimiter {
    budget: Duration,
}

impl FrameLimiter {
    /// Limiter for a target rate. Non-positive rates disable limiting.
    pub fn new(target_fps: f64) -> Self {
        let budget = if target_fps > 0.0 && target_fps.is_finite() {
            Duration::from_secs_f64(1.0 / target_fps)
        } else {
            Duration::ZERO
        };
        Self { budget }
    }

    /// Time allowed per frame.
    #[inline]
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Budget left after a frame that took `spent`.
    #[inline]
    pub fn remaining(&self, spent: Duration) -> Duration {
        self.budget.saturating_sub(spent)
    }

    /// Sleep until the frame that began at `frame_start` has used its budget.
    pub fn wait(&self, frame_start: Instant) {
        let left = self.remaining(frame_start.elapsed());
        if !left.is_zero() {
            std::thread::sleep(left);
        }
    }
}
