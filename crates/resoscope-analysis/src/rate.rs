//! Sampling-rate estimation from timestamps.

use resoscope_core::Sample;

use crate::error::{AnalysisError, Result};

/// Estimates the sampling rate as `count / (t_last - t_first)`.
///
/// This is the count-over-span estimator, not `(count - 1) / span`; the live
/// window lengths and the spectral resolution are both derived from it.
pub fn estimate_sampling_rate(samples: &[Sample]) -> Result<f64> {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return Err(AnalysisError::InsufficientData {
            available: 0,
            required: 2,
        });
    };
    if samples.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            available: samples.len(),
            required: 2,
        });
    }
    let span = last.timestamp - first.timestamp;
    if !(span.is_finite() && span > 0.0) {
        return Err(AnalysisError::InvalidTimebase { span });
    }
    Ok(samples.len() as f64 / span)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(count: usize, rate: f64) -> Vec<Sample> {
        (0..count)
            .map(|i| Sample::new(i as f64 / rate, 0.0))
            .collect()
    }

    #[test]
    fn count_over_span() {
        let rate = estimate_sampling_rate(&uniform(5000, 1000.0)).unwrap();
        assert!((rate - 5000.0 / 4.999).abs() < 1e-9);
    }

    #[test]
    fn needs_two_samples() {
        assert!(matches!(
            estimate_sampling_rate(&[]),
            Err(AnalysisError::InsufficientData { available: 0, .. })
        ));
        assert!(matches!(
            estimate_sampling_rate(&uniform(1, 10.0)),
            Err(AnalysisError::InsufficientData { available: 1, .. })
        ));
    }

    #[test]
    fn rejects_flat_timebase() {
        let samples = [Sample::new(3.0, 0.0), Sample::new(3.0, 1.0)];
        assert!(matches!(
            estimate_sampling_rate(&samples),
            Err(AnalysisError::InvalidTimebase { .. })
        ));
    }
}
