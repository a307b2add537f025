//! Causal boxcar smoothing and rectification.
//!
//! Used by the batch path to turn a band-limited oscillation into an
//! amplitude envelope: rectify, then average over a fixed window.

use alloc::vec;
use alloc::vec::Vec;

/// Streaming causal moving average over the last `window` inputs.
///
/// Equivalent to the FIR filter `y[n] = (1/L) * sum(x[n-k], k = 0..L)` with
/// zero initial history, so the first `L - 1` outputs ramp up from zero.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    history: Vec<f64>,
    pos: usize,
    sum: f64,
    scale: f64,
}

impl MovingAverage {
    /// Creates a filter over `window` samples. A window of zero is treated as one.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            history: vec![0.0; window],
            pos: 0,
            sum: 0.0,
            scale: 1.0 / window as f64,
        }
    }

    /// Window length in samples.
    pub fn window(&self) -> usize {
        self.history.len()
    }

    /// Pushes one sample and returns the current average.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        self.sum += input - self.history[self.pos];
        self.history[self.pos] = input;
        self.pos = (self.pos + 1) % self.history.len();
        self.sum * self.scale
    }

    /// Zeroes the history.
    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.pos = 0;
        self.sum = 0.0;
    }
}

/// Smooths `samples` with a causal moving average of `window` samples.
///
/// Output length equals input length.
pub fn apply_moving_average(window: usize, samples: &[f64]) -> Vec<f64> {
    let mut ma = MovingAverage::new(window);
    samples.iter().map(|&x| ma.process(x)).collect()
}

/// Absolute value of every sample.
pub fn rectify(samples: &[f64]) -> Vec<f64> {
    samples.iter().map(|x| x.abs()).collect()
}
