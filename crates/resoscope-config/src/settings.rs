//! The resoscope configuration file.
//!
//! Every field has a default, so a partial file (or none at all) loads:
//!
//! ```toml
//! [acquisition]
//! port = "/dev/ttyUSB0"
//! calibration_secs = 3.0
//!
//! [model]
//! initial_mass_grams = 120
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, FileAction};

/// Device ingestion and buffer sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Explicit device path; auto-detected when absent.
    pub port: Option<String>,
    /// Serial line speed.
    pub baud_rate: u32,
    /// Substrings that identify the sensor in a port description.
    pub port_keywords: Vec<String>,
    /// Bias subtracted from live values before display and analysis, volts.
    pub dc_offset: f64,
    /// Samples kept for the waveform view.
    pub display_capacity: usize,
    /// Samples kept for spectral analysis.
    pub analysis_capacity: usize,
    /// Upper bound on samples captured by one recording.
    pub recording_capacity: usize,
    /// Settling time before the sampling rate is estimated, seconds.
    pub calibration_secs: f64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 115_200,
            port_keywords: vec!["USB-SERIAL".into(), "CP210".into(), "Arduino".into()],
            dc_offset: 2.2,
            display_capacity: 5_000,
            analysis_capacity: 500_000,
            recording_capacity: 500_000,
            calibration_secs: 5.0,
        }
    }
}

/// Live monitoring loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Waveform refresh period, milliseconds.
    pub fast_tick_ms: u64,
    /// Spectral analysis period, milliseconds.
    pub slow_tick_ms: u64,
    /// Length of history analyzed each slow tick, seconds.
    pub analysis_window_secs: f64,
    /// Upper edge of the peak search, Hz.
    pub search_limit_hz: f64,
    /// Low bins excluded from the peak search.
    pub skip_bins: usize,
    /// Band-pass order.
    pub filter_order: usize,
    /// Band edge distance from the rounded model frequency, Hz.
    pub band_half_width_hz: f64,
    /// Lowest allowed lower band edge, Hz.
    pub band_floor_hz: f64,
    /// Band used right after calibration, `[low, high]` Hz.
    pub initial_band_hz: [f64; 2],
    /// Start with the band-pass applied.
    pub filter_enabled: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            fast_tick_ms: 10,
            slow_tick_ms: 200,
            analysis_window_secs: 20.0,
            search_limit_hz: 5.0,
            skip_bins: 3,
            filter_order: 10,
            band_half_width_hz: 1.0,
            band_floor_hz: 1.5,
            initial_band_hz: [2.0, 4.0],
            filter_enabled: false,
        }
    }
}

/// Physical model and the mass selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Spring mass `m0`, kilograms.
    pub added_mass_kg: f64,
    /// Spring constant `k`, N/m.
    pub spring_constant: f64,
    /// Selector step, grams.
    pub mass_step_grams: u32,
    /// Smallest selectable mass, grams.
    pub mass_min_grams: u32,
    /// Largest selectable mass, grams.
    pub mass_max_grams: u32,
    /// Mass selected at startup, grams.
    pub initial_mass_grams: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            added_mass_kg: 0.028,
            spring_constant: 26.07,
            mass_step_grams: 20,
            mass_min_grams: 20,
            mass_max_grams: 200,
            initial_mass_grams: 20,
        }
    }
}

/// Offline analysis of recordings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Fraction trimmed from each end, `0.0..0.5`.
    pub trim_fraction: f64,
    /// Detrending high-pass corner, Hz.
    pub highpass_cutoff_hz: f64,
    /// Detrending high-pass order.
    pub highpass_order: usize,
    /// Envelope moving-average length, samples.
    pub envelope_window: usize,
    /// Upper edge of the peak search, Hz.
    pub search_limit_hz: f64,
    /// Low bins excluded from the peak search.
    pub skip_bins: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            trim_fraction: 0.05,
            highpass_cutoff_hz: 0.1,
            highpass_order: 8,
            envelope_window: 100,
            search_limit_hz: 4.5,
            skip_bins: 1,
        }
    }
}

/// Recording defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Recording length when none is given, seconds.
    pub default_duration_secs: f64,
    /// Directory for recordings without an explicit output path.
    pub output_dir: Option<String>,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: 60.0,
            output_dir: None,
        }
    }
}

/// Root of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResoscopeConfig {
    /// `[acquisition]`
    pub acquisition: AcquisitionConfig,
    /// `[monitor]`
    pub monitor: MonitorConfig,
    /// `[model]`
    pub model: ModelConfig,
    /// `[batch]`
    pub batch: BatchConfig,
    /// `[recording]`
    pub recording: RecordingConfig,
}

impl ResoscopeConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(ConfigError::file(FileAction::Read, path))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(ConfigError::file(FileAction::CreateDir, parent))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(ConfigError::file(FileAction::Write, path))?;
        Ok(())
    }

    /// Convert to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load `path` if given; otherwise the user config file if it exists;
    /// otherwise defaults.
    ///
    /// An explicitly named file that is missing is an error. A missing
    /// default file is not.
    #[cfg(feature = "std")]
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = crate::paths::default_config_file();
        if default_path.is_file() {
            Self::load(default_path)
        } else {
            Ok(Self::default())
        }
    }
}
