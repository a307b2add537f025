//! Resoscope Core - sample storage and filter primitives
//!
//! This crate holds the numeric building blocks shared by the live monitor and
//! the offline batch analyzer. Everything here is a plain value or a small
//! stateful processor; no I/O, no threads.
//!
//! # Core Abstractions
//!
//! ## Samples
//!
//! - [`Sample`] - A timestamped voltage reading
//! - [`SampleBuffer`] - Bounded ring buffer that evicts the oldest entry when full
//!
//! ## Filter Design
//!
//! - [`design_highpass`] / [`design_bandpass`] - Digital Butterworth designs
//!   returned as cascades of second-order sections
//! - [`FilterSpec`] - Immutable design result, with stability and frequency
//!   response queries
//!
//! ## Filter Application
//!
//! - [`Biquad`] - Direct Form I second-order section
//! - [`SosFilter`] - Streaming cascade built from a [`FilterSpec`]
//! - [`apply_sos`] - One-shot causal filtering from zero state
//! - [`MovingAverage`] / [`apply_moving_average`] - Causal boxcar smoothing
//!
//! # no_std Support
//!
//! Disable the default `std` feature to use the crate without the standard
//! library (an allocator is still required):
//!
//! ```toml
//! [dependencies]
//! resoscope-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use resoscope_core::{apply_sos, design_bandpass};
//!
//! let spec = design_bandpass(2.0, 4.0, 10, 1000.0).unwrap();
//! assert!(spec.is_stable());
//!
//! let signal: Vec<f64> = (0..2000)
//!     .map(|i| (2.0 * core::f64::consts::PI * 3.0 * i as f64 / 1000.0).sin())
//!     .collect();
//! let filtered = apply_sos(&spec, &signal);
//! assert_eq!(filtered.len(), signal.len());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod biquad;
pub mod butterworth;
pub mod error;
pub mod moving_average;
pub mod sample_buffer;
pub mod sos;

pub use biquad::Biquad;
pub use butterworth::{
    FilterKind, FilterSpec, MAX_FILTER_ORDER, SosSection, design_bandpass, design_highpass,
};
pub use error::DesignError;
pub use moving_average::{MovingAverage, apply_moving_average, rectify};
pub use sample_buffer::{Sample, SampleBuffer};
pub use sos::{SosFilter, apply_sos};
