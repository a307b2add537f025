//! Cascaded second-order-section filtering.

use alloc::vec::Vec;

use crate::biquad::Biquad;
use crate::butterworth::FilterSpec;

/// Streaming filter built from a [`FilterSpec`].
///
/// Samples pass through every section in order; state persists between
/// calls until [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct SosFilter {
    stages: Vec<Biquad>,
}

impl SosFilter {
    /// Creates a filter with zeroed state.
    pub fn new(spec: &FilterSpec) -> Self {
        Self {
            stages: spec.sections().iter().map(Biquad::from_section).collect(),
        }
    }

    /// Number of cascaded sections.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Filters one sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        self.stages
            .iter_mut()
            .fold(input, |acc, stage| stage.process(acc))
    }

    /// Filters a block in place.
    pub fn process_block_inplace(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Clears every section's delay line.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.clear();
        }
    }
}

/// Filters `samples` in a single causal pass starting from zero state.
///
/// Output length always equals input length.
pub fn apply_sos(spec: &FilterSpec, samples: &[f64]) -> Vec<f64> {
    let mut filter = SosFilter::new(spec);
    let mut out = samples.to_vec();
    filter.process_block_inplace(&mut out);
    out
}
