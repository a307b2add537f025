//! FFT wrapper for real sample windows

use rustfft::{FftPlanner, num_complex::Complex};
use std::sync::Arc;

/// Forward FFT processor with plan caching.
///
/// The analysis window length changes whenever the sampling-rate estimate
/// does, so the plan is rebuilt lazily on size change rather than fixed at
/// construction.
pub struct Fft {
    planner: FftPlanner<f64>,
    fft: Arc<dyn rustfft::Fft<f64>>,
    size: usize,
}

impl Fft {
    /// Plans a forward transform of `size` points.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self { planner, fft, size }
    }

    /// Transform length in points.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Replans for a new length; a no-op if unchanged.
    pub fn resize(&mut self, size: usize) {
        if size != self.size {
            self.fft = self.planner.plan_fft_forward(size);
            self.size = size;
        }
    }

    /// Perform forward FFT on real input.
    ///
    /// Input is zero-padded or truncated to the FFT size. Returns the
    /// positive-frequency half, `size / 2 + 1` bins.
    pub fn forward(&self, input: &[f64]) -> Vec<Complex<f64>> {
        let mut buffer: Vec<Complex<f64>> = input.iter().map(|&x| Complex::new(x, 0.0)).collect();
        buffer.resize(self.size, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        buffer.truncate(self.size / 2 + 1);
        buffer
    }

    /// Magnitudes `|X[k]|` of the positive-frequency bins, unnormalized.
    pub fn magnitudes(&self, input: &[f64]) -> Vec<f64> {
        self.forward(input).iter().map(|c| c.norm()).collect()
    }
}
