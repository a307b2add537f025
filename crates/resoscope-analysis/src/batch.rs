//! One-shot analysis of a recorded series.
//!
//! Answers "what is the dominant low-frequency content of this recording"
//! without the resonance model or the adaptive band-pass:
//!
//! 1. Trim a fixed fraction of samples from each end (startup and shutdown
//!    transients of the recording).
//! 2. Estimate the sampling rate on what remains.
//! 3. High-pass to strip the sensor bias and drift, rectify, and smooth into
//!    an amplitude envelope.
//! 4. Independently, FFT the *raw* trimmed values and search with the
//!    offline policy.

use resoscope_core::{Sample, apply_moving_average, apply_sos, design_highpass, rectify};

use crate::error::{AnalysisError, Result};
use crate::rate::estimate_sampling_rate;
use crate::spectrum::{SearchPolicy, SpectralAnalyzer, SpectrumResult};

/// Tunables of the batch pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchSettings {
    /// Fraction of the sample count dropped from each end.
    pub trim_fraction: f64,
    /// High-pass corner in Hz.
    pub highpass_cutoff_hz: f64,
    /// High-pass order.
    pub highpass_order: usize,
    /// Envelope moving-average length in samples.
    pub envelope_window: usize,
    /// Peak search policy for the raw spectrum.
    pub policy: SearchPolicy,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            trim_fraction: 0.05,
            highpass_cutoff_hz: 0.1,
            highpass_order: 8,
            envelope_window: 100,
            policy: SearchPolicy::offline(),
        }
    }
}

/// Everything the batch pipeline produces for one recording.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Samples in the original series.
    pub total_samples: usize,
    /// Samples dropped from each end.
    pub trimmed_per_end: usize,
    /// `count / span` over the trimmed series.
    pub sampling_rate: f64,
    /// Timestamps of the trimmed series.
    pub timestamps: Vec<f64>,
    /// High-passed trimmed values.
    pub filtered_signal: Vec<f64>,
    /// Rectified + smoothed `filtered_signal`.
    pub envelope: Vec<f64>,
    /// Raw-value spectrum over the offline search band.
    pub spectrum: SpectrumResult,
    /// Dominant frequency in Hz.
    pub peak_frequency: f64,
    /// Magnitude of the dominant bin.
    pub peak_magnitude: f64,
}

/// Runs the batch pipeline. Holds an FFT plan between calls.
#[derive(Default)]
pub struct BatchAnalyzer {
    settings: BatchSettings,
    analyzer: SpectralAnalyzer,
}

impl BatchAnalyzer {
    /// Creates an analyzer with the given settings.
    pub fn new(settings: BatchSettings) -> Self {
        Self {
            settings,
            analyzer: SpectralAnalyzer::new(),
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Analyzes a full recording.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::InsufficientData`] if fewer than two samples remain
    ///   after trimming, or the series is too short for the search band
    /// - [`AnalysisError::InvalidTimebase`] if timestamps do not advance
    /// - [`AnalysisError::InvalidFilterSpec`] if the high-pass corner is not
    ///   below Nyquist at the estimated rate
    pub fn analyze(&mut self, samples: &[Sample]) -> Result<BatchReport> {
        let total = samples.len();
        let cut = (total as f64 * self.settings.trim_fraction).floor() as usize;
        let trimmed = if 2 * cut < total {
            &samples[cut..total - cut]
        } else {
            &[][..]
        };
        if trimmed.len() < 2 {
            return Err(AnalysisError::InsufficientData {
                available: trimmed.len(),
                required: 2,
            });
        }

        let sampling_rate = estimate_sampling_rate(trimmed)?;
        tracing::debug!(
            total,
            trimmed = trimmed.len(),
            sampling_rate,
            "batch series prepared"
        );

        let values: Vec<f64> = trimmed.iter().map(|s| s.value).collect();

        let highpass = design_highpass(
            self.settings.highpass_cutoff_hz,
            self.settings.highpass_order,
            sampling_rate,
        )?;
        let filtered_signal = apply_sos(&highpass, &values);
        let envelope =
            apply_moving_average(self.settings.envelope_window, &rectify(&filtered_signal));

        let spectrum = self
            .analyzer
            .analyze(&values, sampling_rate, self.settings.policy)?;

        Ok(BatchReport {
            total_samples: total,
            trimmed_per_end: cut,
            sampling_rate,
            timestamps: trimmed.iter().map(|s| s.timestamp).collect(),
            filtered_signal,
            envelope,
            peak_frequency: spectrum.peak_frequency,
            peak_magnitude: spectrum.peak_magnitude,
            spectrum,
        })
    }
}
