//! Tick timing
//!
//! Measures the real time between ticks and caps the loop to the target
//! tick rate by sleeping out the rest of each period.

use std::time::{Duration, Instant};

use crate::consts::MAX_FRAME_DT;

/// Frame clock with a rate cap
#[derive(Debug, Clone)]
pub struct Clock {
    previous: Instant,
    period: Duration,
    /// Deltas of the last second, for the FPS readout
    frame_times: [f32; 60],
    frame_index: usize,
}

impl Clock {
    /// Clock targeting `tick_rate` ticks per second (0 disables the cap)
    pub fn new(tick_rate: u32) -> Self {
        Self::starting_at(Instant::now(), tick_rate)
    }

    pub fn starting_at(start: Instant, tick_rate: u32) -> Self {
        let period = if tick_rate == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(1_000_000_000 / tick_rate as u64)
        };
        Self {
            previous: start,
            period,
            frame_times: [0.0; 60],
            frame_index: 0,
        }
    }

    /// Seconds elapsed since the previous tick at `now`, clamped to
    /// `MAX_FRAME_DT`. Records `now` as the new tick start.
    pub fn delta(&mut self, now: Instant) -> f32 {
        let dt = now
            .saturating_duration_since(self.previous)
            .as_secs_f32()
            .min(MAX_FRAME_DT);
        self.previous = now;

        self.frame_times[self.frame_index] = dt;
        self.frame_index = (self.frame_index + 1) % self.frame_times.len();
        dt
    }

    /// Delta since the previous tick, measured now
    pub fn tick(&mut self) -> f32 {
        self.delta(Instant::now())
    }

    /// Time left in the current tick period at `now`
    pub fn remaining(&self, now: Instant) -> Duration {
        (self.previous + self.period).saturating_duration_since(now)
    }

    /// Sleep until the next tick is due
    pub fn wait(&self) {
        let remaining = self.remaining(Instant::now());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Average frames per second over the recorded window
    pub fn fps(&self) -> u32 {
        let recorded: Vec<f32> = self.frame_times.iter().copied().filter(|dt| *dt > 0.0).collect();
        if recorded.is_empty() {
            return 0;
        }
        let avg = recorded.iter().sum::<f32>() / recorded.len() as f32;
        (1.0 / avg).round() as u32
    }
}

/// Seed derived from the wall clock, for runs without a fixed seed
pub fn time_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
