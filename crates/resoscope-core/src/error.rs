//! Filter design errors.

use core::fmt;

/// Reasons a requested filter cannot be designed.
///
/// Hand-rolled `Display` keeps this crate free of `std`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DesignError {
    /// Sampling rate is not a finite positive number.
    InvalidSamplingRate(f64),
    /// A cutoff lies outside `(0, nyquist)`.
    CutoffOutOfRange {
        /// Requested cutoff in Hz.
        cutoff: f64,
        /// Nyquist frequency for the requested sampling rate.
        nyquist: f64,
    },
    /// Band-pass edges are not strictly increasing.
    InvertedBand {
        /// Lower edge in Hz.
        low: f64,
        /// Upper edge in Hz.
        high: f64,
    },
    /// Order is zero or exceeds [`crate::MAX_FILTER_ORDER`].
    InvalidOrder(usize),
}

impl fmt::Display for DesignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSamplingRate(rate) => {
                write!(f, "invalid sampling rate {rate} Hz")
            }
            Self::CutoffOutOfRange { cutoff, nyquist } => {
                write!(
                    f,
                    "cutoff {cutoff} Hz outside the open interval (0, {nyquist}) Hz"
                )
            }
            Self::InvertedBand { low, high } => {
                write!(f, "band edges must satisfy low < high, got {low}..{high} Hz")
            }
            Self::InvalidOrder(order) => write!(
                f,
                "filter order {order} outside 1..={}",
                crate::MAX_FILTER_ORDER
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DesignError {}
