//! Resoscope Analysis - spectral peak detection and the resonance model
//!
//! This crate turns sample windows into a dominant oscillation frequency and
//! relates that frequency to an attached mass:
//!
//! - [`fft`] - Real-input FFT magnitude with plan caching
//! - [`spectrum`] - Bounded-band peak search ([`SpectralAnalyzer`])
//! - [`resonance`] - Spring/mass model, mass inference, mass selector
//! - [`adaptive`] - Band-pass target derived from the model frequency
//! - [`rate`] - Sampling-rate estimation from timestamps
//! - [`batch`] - One-shot analysis of a recorded series ([`BatchAnalyzer`])
//!
//! ## Live vs offline search
//!
//! The adaptive monitor and the batch analyzer deliberately use different
//! search policies: the live path skips bins 0..3 and searches up to 5 Hz,
//! the batch path skips only DC and searches up to 4.5 Hz. Both are exposed
//! as [`SearchPolicy`] presets.
//!
//! ## Example
//!
//! ```rust
//! use resoscope_analysis::{ResonanceParameters, SearchPolicy, SpectralAnalyzer};
//!
//! let rate = 1000.0;
//! let signal: Vec<f64> = (0..20_000)
//!     .map(|i| (2.0 * std::f64::consts::PI * 2.5 * i as f64 / rate).sin())
//!     .collect();
//!
//! let mut analyzer = SpectralAnalyzer::new();
//! let result = analyzer.analyze(&signal, rate, SearchPolicy::live()).unwrap();
//! assert!((result.peak_frequency - 2.5).abs() < 1e-9);
//!
//! let model = ResonanceParameters::default();
//! let grams = model.infer_mass_grams(result.peak_frequency).unwrap();
//! assert!((grams - 96.3).abs() < 0.1);
//! ```

pub mod adaptive;
pub mod batch;
pub mod error;
pub mod fft;
pub mod rate;
pub mod resonance;
pub mod spectrum;

pub use adaptive::{AdaptiveBandpass, BandTarget, derive_bandpass_target};
pub use batch::{BatchAnalyzer, BatchReport, BatchSettings};
pub use error::AnalysisError;
pub use fft::Fft;
pub use rate::estimate_sampling_rate;
pub use resonance::{MassSelector, ModelFrequencies, ResonanceParameters};
pub use spectrum::{SearchPolicy, SpectralAnalyzer, SpectrumResult, find_peaks};
