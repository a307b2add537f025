//! Configuration value checks.
//!
//! Parsing guarantees types; this module guarantees the values make sense
//! together (positive rates, ordered bands, a mass range the selector can
//! step through).

use thiserror::Error;

use crate::settings::ResoscopeConfig;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Numeric value outside its allowed range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted field path, e.g. `monitor.filter_order`.
        field: &'static str,
        /// The rejected value.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Two related values are in the wrong order.
    #[error("'{field}' needs {low} < {high}")]
    Unordered {
        /// Dotted field path.
        field: &'static str,
        /// Value that must be smaller.
        low: f64,
        /// Value that must be larger.
        high: f64,
    },

    /// A list that must not be empty is empty.
    #[error("'{0}' must not be empty")]
    Empty(&'static str),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Highest filter order the designers accept.
const MAX_ORDER: f64 = 24.0;

#[derive(Default)]
struct Checker {
    errors: Vec<ValidationError>,
}

impl Checker {
    fn range(&mut self, field: &'static str, value: f64, min: f64, max: f64) {
        if !(value.is_finite() && value >= min && value <= max) {
            self.errors.push(ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            });
        }
    }

    fn positive(&mut self, field: &'static str, value: f64) {
        if !(value.is_finite() && value > 0.0) {
            self.errors.push(ValidationError::OutOfRange {
                field,
                value,
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
            });
        }
    }

    fn ordered(&mut self, field: &'static str, low: f64, high: f64) {
        if !(low < high) {
            self.errors
                .push(ValidationError::Unordered { field, low, high });
        }
    }

    fn finish(mut self) -> ValidationResult<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(ValidationError::Multiple(self.errors)),
        }
    }
}

impl ResoscopeConfig {
    /// Checks every section, reporting all problems at once.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut c = Checker::default();

        let acq = &self.acquisition;
        c.positive("acquisition.baud_rate", f64::from(acq.baud_rate));
        if acq.port_keywords.is_empty() {
            c.errors.push(ValidationError::Empty("acquisition.port_keywords"));
        }
        c.range("acquisition.dc_offset", acq.dc_offset, -1e3, 1e3);
        c.positive("acquisition.display_capacity", acq.display_capacity as f64);
        c.positive("acquisition.analysis_capacity", acq.analysis_capacity as f64);
        c.positive("acquisition.recording_capacity", acq.recording_capacity as f64);
        c.positive("acquisition.calibration_secs", acq.calibration_secs);

        let mon = &self.monitor;
        c.positive("monitor.fast_tick_ms", mon.fast_tick_ms as f64);
        c.positive("monitor.slow_tick_ms", mon.slow_tick_ms as f64);
        c.positive("monitor.analysis_window_secs", mon.analysis_window_secs);
        c.positive("monitor.search_limit_hz", mon.search_limit_hz);
        c.range("monitor.filter_order", mon.filter_order as f64, 1.0, MAX_ORDER);
        c.positive("monitor.band_half_width_hz", mon.band_half_width_hz);
        c.positive("monitor.band_floor_hz", mon.band_floor_hz);
        c.positive("monitor.initial_band_hz", mon.initial_band_hz[0]);
        c.ordered(
            "monitor.initial_band_hz",
            mon.initial_band_hz[0],
            mon.initial_band_hz[1],
        );

        let model = &self.model;
        c.positive("model.added_mass_kg", model.added_mass_kg);
        c.positive("model.spring_constant", model.spring_constant);
        c.positive("model.mass_step_grams", f64::from(model.mass_step_grams));
        c.positive("model.mass_min_grams", f64::from(model.mass_min_grams));
        c.ordered(
            "model.mass_min_grams",
            f64::from(model.mass_min_grams),
            f64::from(model.mass_max_grams),
        );
        c.range(
            "model.initial_mass_grams",
            f64::from(model.initial_mass_grams),
            f64::from(model.mass_min_grams),
            f64::from(model.mass_max_grams),
        );

        let batch = &self.batch;
        c.range("batch.trim_fraction", batch.trim_fraction, 0.0, 0.49);
        c.positive("batch.highpass_cutoff_hz", batch.highpass_cutoff_hz);
        c.range("batch.highpass_order", batch.highpass_order as f64, 1.0, MAX_ORDER);
        c.positive("batch.envelope_window", batch.envelope_window as f64);
        c.positive("batch.search_limit_hz", batch.search_limit_hz);

        c.positive(
            "recording.default_duration_secs",
            self.recording.default_duration_secs,
        );

        c.finish()
    }
}
