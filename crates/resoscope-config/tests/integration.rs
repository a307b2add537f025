//! Integration tests for resoscope-config.
//!
//! These exercise the file round trip through a real filesystem.

use resoscope_config::{ConfigError, ResoscopeConfig, ValidationError};
use tempfile::TempDir;

#[test]
fn save_then_load_preserves_everything() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = ResoscopeConfig::default();
    config.acquisition.port = Some("/dev/ttyUSB3".into());
    config.acquisition.dc_offset = 2.05;
    config.model.initial_mass_grams = 140;
    config.monitor.initial_band_hz = [1.5, 3.5];

    config.save(&path).unwrap();
    let loaded = ResoscopeConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn save_creates_missing_parents() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("config.toml");

    ResoscopeConfig::default().save(&path).unwrap();
    assert!(path.is_file());
}

#[test]
fn hand_written_file_overrides_only_named_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lab.toml");
    std::fs::write(
        &path,
        "[batch]\nenvelope_window = 50\n\n[recording]\ndefault_duration_secs = 30.0\n",
    )
    .unwrap();

    let config = ResoscopeConfig::load(&path).unwrap();
    assert_eq!(config.batch.envelope_window, 50);
    assert_eq!(config.batch.trim_fraction, 0.05);
    assert_eq!(config.recording.default_duration_secs, 30.0);
    assert_eq!(config.acquisition.baud_rate, 115_200);
}

#[test]
fn missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = ResoscopeConfig::load(&path).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn discover_with_explicit_missing_path_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope.toml");
    assert!(ResoscopeConfig::discover(Some(&path)).is_err());
}

#[test]
fn invalid_file_surfaces_validation_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[model]\nspring_constant = -1.0\n").unwrap();

    match ResoscopeConfig::load(&path) {
        Err(ConfigError::Invalid(ValidationError::OutOfRange { field, .. })) => {
            assert_eq!(field, "model.spring_constant");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
