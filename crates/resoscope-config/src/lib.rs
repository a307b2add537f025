//! Configuration for resoscope.
//!
//! A single TOML file holds every tunable of the acquisition, live monitor,
//! resonance model, batch analyzer, and recorder. Missing sections and fields
//! fall back to the reference setup (1 kHz sensor over USB serial, 2.2 V
//! bias, 20–200 g masses in 20 g steps).
//!
//! # Features
//!
//! - **Config file**: [`ResoscopeConfig`] with `load`/`save`/`from_toml`/`to_toml`
//! - **Validation**: [`ResoscopeConfig::validate`] reports every bad value at once
//! - **Paths**: Platform-specific config and recording directories
//!
//! # Example
//!
//! ```rust,no_run
//! use resoscope_config::{ResoscopeConfig, paths};
//!
//! let mut config = ResoscopeConfig::discover(None).unwrap();
//! config.acquisition.calibration_secs = 3.0;
//! config.save(paths::default_config_file()).unwrap();
//! ```

mod error;
mod settings;

/// Platform-specific paths for configuration and recordings.
#[cfg(feature = "std")]
pub mod paths;

/// Configuration value checks.
pub mod validation;

pub use error::{ConfigError, FileAction};
pub use settings::{
    AcquisitionConfig, BatchConfig, ModelConfig, MonitorConfig, RecordingConfig, ResoscopeConfig,
};
pub use validation::{ValidationError, ValidationResult};

#[cfg(feature = "std")]
pub use paths::{default_config_file, recordings_dir, user_config_dir};
