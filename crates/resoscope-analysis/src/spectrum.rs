//! Bounded-band spectral peak detection

use crate::error::{AnalysisError, Result};
use crate::fft::Fft;

/// Which bins a peak search inspects.
///
/// Bins `[first_bin, floor(search_limit_hz / resolution))` are searched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchPolicy {
    /// Upper bound of the search band in Hz (exclusive, rounded down to a bin).
    pub search_limit_hz: f64,
    /// First bin inspected; bins below it are ignored.
    pub first_bin: usize,
}

impl SearchPolicy {
    /// Live monitor preset: bins 0..3 skipped, 5 Hz limit.
    pub const LIVE: Self = Self::new(5.0, 3);
    /// Batch preset: DC skipped, 4.5 Hz limit.
    pub const OFFLINE: Self = Self::new(4.5, 1);

    /// Creates a policy.
    pub const fn new(search_limit_hz: f64, first_bin: usize) -> Self {
        Self {
            search_limit_hz,
            first_bin,
        }
    }

    /// The adaptive monitor's policy.
    pub const fn live() -> Self {
        Self::LIVE
    }

    /// The batch analyzer's policy.
    pub const fn offline() -> Self {
        Self::OFFLINE
    }

    /// Checks that the search band has a positive, finite upper edge.
    pub fn validate(&self) -> Result<()> {
        if self.search_limit_hz.is_finite() && self.search_limit_hz > 0.0 {
            Ok(())
        } else {
            Err(AnalysisError::InvalidSearchLimit(self.search_limit_hz))
        }
    }

    /// Smallest window length that yields a non-empty search range at
    /// `sampling_rate`.
    pub fn min_window(&self, sampling_rate: f64) -> Result<usize> {
        self.validate()?;
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(AnalysisError::InvalidSamplingRate(sampling_rate));
        }
        let needed = (self.first_bin + 1) as f64 * sampling_rate / self.search_limit_hz;
        // floor(limit * n / rate) > first_bin needs n >= needed; step past
        // rounding at exact multiples
        let mut n = needed.ceil().max(1.0) as usize;
        while search_end(self.search_limit_hz, sampling_rate, n) <= self.first_bin {
            n = n.checked_add(1).ok_or(AnalysisError::InvalidSearchLimit(self.search_limit_hz))?;
        }
        Ok(n)
    }
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self::LIVE
    }
}

/// Result of one spectral analysis.
///
/// `frequencies` and `magnitudes` cover only the inspected range
/// (`first_bin..first_bin + len`); `peak_index` is the absolute bin.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumResult {
    /// Bin spacing in Hz (`sampling_rate / window_len`).
    pub resolution_hz: f64,
    /// Absolute index of `frequencies[0]`.
    pub first_bin: usize,
    /// Bin center frequencies, ascending.
    pub frequencies: Vec<f64>,
    /// Unnormalized DFT magnitudes.
    pub magnitudes: Vec<f64>,
    /// Absolute bin index of the maximum.
    pub peak_index: usize,
    /// `peak_index * resolution_hz`.
    pub peak_frequency: f64,
    /// Magnitude at `peak_index`.
    pub peak_magnitude: f64,
}

impl SpectrumResult {
    /// Iterates `(frequency, magnitude)` over the inspected range.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.magnitudes.iter().copied())
    }
}

/// FFT-based dominant-frequency detector.
///
/// Holds a cached FFT plan; the plan is rebuilt only when the window
/// length changes.
///
/// # Example
///
/// ```rust
/// use resoscope_analysis::{SearchPolicy, SpectralAnalyzer};
///
/// let rate = 100.0;
/// let signal: Vec<f64> = (0..1000)
///     .map(|i| (2.0 * std::f64::consts::PI * 2.0 * i as f64 / rate).sin())
///     .collect();
/// let mut analyzer = SpectralAnalyzer::new();
/// let result = analyzer.analyze(&signal, rate, SearchPolicy::offline()).unwrap();
/// assert_eq!(result.peak_index, 20);
/// ```
pub struct SpectralAnalyzer {
    fft: Option<Fft>,
}

impl SpectralAnalyzer {
    /// Creates an analyzer with no plan yet.
    pub fn new() -> Self {
        Self { fft: None }
    }

    /// Finds the dominant frequency of `samples` within `policy`'s band.
    ///
    /// The whole window is transformed as-is: no windowing, no padding.
    /// Ties between equal magnitudes go to the lower bin.
    pub fn analyze(
        &mut self,
        samples: &[f64],
        sampling_rate: f64,
        policy: SearchPolicy,
    ) -> Result<SpectrumResult> {
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) {
            return Err(AnalysisError::InvalidSamplingRate(sampling_rate));
        }
        policy.validate()?;
        let n = samples.len();
        let end = if n == 0 {
            0
        } else {
            search_end(policy.search_limit_hz, sampling_rate, n)
        };
        if end <= policy.first_bin {
            return Err(AnalysisError::InsufficientData {
                available: n,
                required: policy.min_window(sampling_rate)?,
            });
        }

        let fft = match &mut self.fft {
            Some(fft) => {
                fft.resize(n);
                fft
            }
            slot @ None => slot.insert(Fft::new(n)),
        };
        let magnitudes = fft.magnitudes(samples);

        let resolution_hz = sampling_rate / n as f64;
        let range = policy.first_bin..end;

        let mut peak_index = range.start;
        for k in range.clone() {
            if magnitudes[k] > magnitudes[peak_index] {
                peak_index = k;
            }
        }

        Ok(SpectrumResult {
            resolution_hz,
            first_bin: range.start,
            frequencies: range.clone().map(|k| k as f64 * resolution_hz).collect(),
            magnitudes: magnitudes[range].to_vec(),
            peak_index,
            peak_frequency: peak_index as f64 * resolution_hz,
            peak_magnitude: magnitudes[peak_index],
        })
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive end bin for a window of `n` samples, clamped to the
/// positive-frequency half.
fn search_end(search_limit_hz: f64, sampling_rate: f64, n: usize) -> usize {
    let resolution = sampling_rate / n as f64;
    let end = (search_limit_hz / resolution).floor().max(0.0) as usize;
    end.min(n / 2 + 1)
}

/// Local maxima within a result's inspected range, strongest first.
///
/// Returns up to `count` `(frequency, magnitude)` pairs. A bin is a local
/// maximum if it exceeds both neighbors; the range edges compare against
/// their single inner neighbor.
pub fn find_peaks(result: &SpectrumResult, count: usize) -> Vec<(f64, f64)> {
    let mags = &result.magnitudes;
    let mut peaks: Vec<(f64, f64)> = (0..mags.len())
        .filter(|&i| {
            let left = i == 0 || mags[i] > mags[i - 1];
            let right = i + 1 == mags.len() || mags[i] > mags[i + 1];
            left && right
        })
        .map(|i| (result.frequencies[i], mags[i]))
        .collect();

    peaks.sort_by(|a, b| b.1.total_cmp(&a.1));
    peaks.truncate(count);
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, rate: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / rate).sin())
            .collect()
    }

    #[test]
    fn finds_in_band_sine() {
        let mut analyzer = SpectralAnalyzer::new();
        let rate = 1000.0;
        let result = analyzer
            .analyze(&sine(2.5, rate, 20_000), rate, SearchPolicy::live())
            .unwrap();
        assert_eq!(result.peak_index, 50);
        assert!((result.peak_frequency - 2.5).abs() < 1e-9);
        assert!((result.resolution_hz - 0.05).abs() < 1e-12);
        assert_eq!(result.first_bin, 3);
        assert_eq!(result.frequencies.len(), result.magnitudes.len());
        assert_eq!(result.frequencies.len(), 100 - 3);
    }

    #[test]
    fn frequencies_ascend_and_match_resolution() {
        let mut analyzer = SpectralAnalyzer::new();
        let result = analyzer
            .analyze(&sine(2.0, 200.0, 2000), 200.0, SearchPolicy::offline())
            .unwrap();
        assert!(result.frequencies.windows(2).all(|w| w[1] > w[0]));
        assert!((result.frequencies[0] - result.resolution_hz).abs() < 1e-12);
    }

    #[test]
    fn tie_goes_to_lowest_bin() {
        let mut analyzer = SpectralAnalyzer::new();
        // Zero signal: every magnitude equal
        let result = analyzer
            .analyze(&[0.0; 400], 100.0, SearchPolicy::live())
            .unwrap();
        assert_eq!(result.peak_index, 3);
        assert_eq!(result.peak_magnitude, 0.0);
    }

    #[test]
    fn out_of_band_energy_is_ignored() {
        let mut analyzer = SpectralAnalyzer::new();
        let rate = 1000.0;
        let strong = sine(40.0, rate, 20_000);
        let weak = sine(2.0, rate, 20_000);
        let mix: Vec<f64> = strong.iter().zip(&weak).map(|(a, b)| 10.0 * a + b).collect();
        let result = analyzer.analyze(&mix, rate, SearchPolicy::live()).unwrap();
        assert!((result.peak_frequency - 2.0).abs() < 1e-9);
    }

    #[test]
    fn skipped_bins_are_never_reported() {
        let mut analyzer = SpectralAnalyzer::new();
        // Large DC offset dominates bin 0 and its leakage
        let signal: Vec<f64> = sine(3.0, 100.0, 1000).iter().map(|x| x + 100.0).collect();
        let live = analyzer.analyze(&signal, 100.0, SearchPolicy::live()).unwrap();
        assert!(live.peak_index >= 3);
        let offline = analyzer.analyze(&signal, 100.0, SearchPolicy::offline()).unwrap();
        assert!(offline.peak_index >= 1);
    }

    #[test]
    fn short_window_is_insufficient() {
        let mut analyzer = SpectralAnalyzer::new();
        // rate 1000, 500 samples: resolution 2 Hz, end = 2 <= 3
        let err = analyzer
            .analyze(&[0.0; 500], 1000.0, SearchPolicy::live())
            .unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientData {
                available: 500,
                required: 800
            }
        );
        // exactly the reported minimum succeeds
        assert!(analyzer.analyze(&[0.0; 800], 1000.0, SearchPolicy::live()).is_ok());
    }

    #[test]
    fn empty_and_bad_rate() {
        let mut analyzer = SpectralAnalyzer::new();
        assert!(matches!(
            analyzer.analyze(&[], 1000.0, SearchPolicy::offline()),
            Err(AnalysisError::InsufficientData { available: 0, .. })
        ));
        assert!(matches!(
            analyzer.analyze(&[1.0; 100], 0.0, SearchPolicy::offline()),
            Err(AnalysisError::InvalidSamplingRate(_))
        ));
    }

    #[test]
    fn degenerate_search_limit_is_rejected() {
        let mut analyzer = SpectralAnalyzer::new();
        for limit in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let policy = SearchPolicy::new(limit, 1);
            assert!(matches!(
                analyzer.analyze(&[0.0; 1000], 100.0, policy),
                Err(AnalysisError::InvalidSearchLimit(_))
            ));
            assert!(policy.min_window(100.0).is_err());
        }
        assert!(analyzer.analyze(&[], 100.0, SearchPolicy::new(0.0, 1)).is_err());
    }

    #[test]
    fn min_window_matches_first_usable_length() {
        assert_eq!(SearchPolicy::live().min_window(1000.0), Ok(800));
        assert_eq!(SearchPolicy::offline().min_window(100.0), Ok(45));
        assert!(SearchPolicy::live().min_window(f64::NAN).is_err());
    }

    #[test]
    fn peaks_sorted_by_magnitude() {
        let mut analyzer = SpectralAnalyzer::new();
        let rate = 100.0;
        let a = sine(1.0, rate, 1000);
        let b = sine(3.0, rate, 1000);
        let mix: Vec<f64> = a.iter().zip(&b).map(|(x, y)| 0.5 * x + y).collect();
        let result = analyzer.analyze(&mix, rate, SearchPolicy::offline()).unwrap();
        let peaks = find_peaks(&result, 2);
        assert_eq!(peaks.len(), 2);
        assert!((peaks[0].0 - 3.0).abs() < 1e-9);
        assert!((peaks[1].0 - 1.0).abs() < 1e-9);
    }
}
