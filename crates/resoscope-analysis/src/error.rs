//! Error types for analysis.

use resoscope_core::DesignError;
use thiserror::Error;

/// Errors produced by the analysis pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// The window is too short to resolve the search band.
    ///
    /// The live monitor treats this as "skip this tick".
    #[error("insufficient data: have {available} samples, need {required}")]
    InsufficientData {
        /// Samples available.
        available: usize,
        /// Samples needed.
        required: usize,
    },

    /// Sampling rate is zero, negative, or not finite.
    #[error("invalid sampling rate: {0} Hz")]
    InvalidSamplingRate(f64),

    /// Peak search upper edge is zero, negative, or not finite.
    #[error("invalid search limit: {0} Hz")]
    InvalidSearchLimit(f64),

    /// Timestamps do not span a positive interval.
    #[error("timestamps span {span} s; need a positive interval")]
    InvalidTimebase {
        /// `t_last - t_first`, in seconds.
        span: f64,
    },

    /// Filter design rejected the request.
    #[error("invalid filter spec: {0}")]
    InvalidFilterSpec(#[from] DesignError),
}

/// Convenience alias for analysis results.
pub type Result<T> = std::result::Result<T, AnalysisError>;
