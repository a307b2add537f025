//! Timestamp sources for ingested samples.

use std::time::Instant;

/// Supplies the timestamp of each sample, in seconds since acquisition start.
pub trait Clock {
    /// Timestamp for the sample being ingested now.
    fn now(&mut self) -> f64;
}

/// Wall-clock timestamps relative to construction.
///
/// Samples are stamped when their line is parsed, so serial buffering jitter
/// shows up in the timestamps; the rate estimator averages it out.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Starts the clock at zero.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&mut self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Synthetic timestamps `i / rate`, for replaying files and for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedRateClock {
    rate: f64,
    index: u64,
}

impl FixedRateClock {
    /// Clock ticking at `rate` Hz, starting at zero.
    pub fn new(rate: f64) -> Self {
        Self { rate, index: 0 }
    }

    /// Samples stamped so far.
    pub fn ticks(&self) -> u64 {
        self.index
    }
}

impl Clock for FixedRateClock {
    fn now(&mut self) -> f64 {
        let t = self.index as f64 / self.rate;
        self.index += 1;
        t
    }
}
