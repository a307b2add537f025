//! Band-pass target tracking the model frequency.
//!
//! The live monitor re-centres its band-pass on the model's loaded frequency
//! every analysis tick: the edges sit one hertz either side of the rounded
//! frequency, with the lower edge floored so the band never reaches the
//! drift/DC region.

use resoscope_core::{DesignError, FilterSpec, design_bandpass};

/// A pair of band edges in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandTarget {
    /// Lower edge in Hz.
    pub low_hz: f64,
    /// Upper edge in Hz.
    pub high_hz: f64,
}

impl BandTarget {
    /// Creates a band target.
    pub const fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }

    /// Geometric centre of the band.
    pub fn center_hz(&self) -> f64 {
        (self.low_hz * self.high_hz).sqrt()
    }

    /// Width of the band.
    pub fn bandwidth(&self) -> f64 {
        self.high_hz - self.low_hz
    }
}

/// Rules for turning a model frequency into a band-pass design.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveBandpass {
    /// Filter order of every design.
    pub order: usize,
    /// Distance from the rounded frequency to each edge, Hz.
    pub half_width_hz: f64,
    /// Lowest allowed lower edge, Hz.
    pub floor_hz: f64,
    /// Band used before the first model-driven design.
    pub initial: BandTarget,
}

impl Default for AdaptiveBandpass {
    fn default() -> Self {
        Self {
            order: 10,
            half_width_hz: 1.0,
            floor_hz: 1.5,
            initial: BandTarget::new(2.0, 4.0),
        }
    }
}

impl AdaptiveBandpass {
    /// Band edges for a model frequency.
    ///
    /// The frequency is rounded half-to-even first, so 2.5 Hz centres on 2.
    pub fn target(&self, f_loaded: f64) -> BandTarget {
        let center = f_loaded.round_ties_even();
        BandTarget {
            low_hz: (center - self.half_width_hz).max(self.floor_hz),
            high_hz: center + self.half_width_hz,
        }
    }

    /// Designs the filter for a model frequency at `sampling_rate`.
    pub fn design(&self, f_loaded: f64, sampling_rate: f64) -> Result<FilterSpec, DesignError> {
        let band = self.target(f_loaded);
        tracing::debug!(
            f_loaded,
            low_hz = band.low_hz,
            high_hz = band.high_hz,
            order = self.order,
            "redesigning adaptive bandpass"
        );
        design_bandpass(band.low_hz, band.high_hz, self.order, sampling_rate)
    }

    /// Designs the calibration-time filter.
    pub fn design_initial(&self, sampling_rate: f64) -> Result<FilterSpec, DesignError> {
        design_bandpass(
            self.initial.low_hz,
            self.initial.high_hz,
            self.order,
            sampling_rate,
        )
    }
}

/// Band target with the default rules (±1 Hz, 1.5 Hz floor).
pub fn derive_bandpass_target(f_loaded: f64) -> BandTarget {
    AdaptiveBandpass::default().target(f_loaded)
}
