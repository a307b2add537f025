//! Shared CLI helpers used across multiple commands.

use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Args;
use resoscope_analysis::{
    AdaptiveBandpass, BandTarget, BatchSettings, MassSelector, ResonanceParameters, SearchPolicy,
};
use resoscope_config::{
    AcquisitionConfig, BatchConfig, ModelConfig, RecordingConfig, ResoscopeConfig, paths,
};
use resoscope_io::{
    BufferCapacities, LineSource, MonitorSettings, SampleSource, find_port, open_serial,
};

/// Where samples come from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Serial device (auto-detected from the configured keywords if omitted)
    #[arg(short, long, conflicts_with = "stdin")]
    pub port: Option<String>,

    /// Read sensor lines from standard input instead of a serial port
    #[arg(long)]
    pub stdin: bool,

    /// Serial baud rate (overrides the config)
    #[arg(long)]
    pub baud: Option<u32>,
}

/// Loads the explicit config file, the user config, or defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ResoscopeConfig> {
    let config = ResoscopeConfig::discover(path)?;
    tracing::debug!(explicit = path.is_some(), "configuration loaded");
    Ok(config)
}

/// Opens the sensor described by `args`, falling back to the config.
pub fn open_source(
    args: &SourceArgs,
    acquisition: &AcquisitionConfig,
) -> resoscope_io::Result<Box<dyn SampleSource + Send>> {
    if args.stdin {
        let reader = BufReader::new(std::io::stdin());
        return Ok(Box::new(LineSource::new(reader, "stdin")));
    }
    let baud = args.baud.unwrap_or(acquisition.baud_rate);
    let path = match args.port.as_ref().or(acquisition.port.as_ref()) {
        Some(port) => port.clone(),
        None => find_port(&acquisition.port_keywords)?.path,
    };
    Ok(Box::new(open_serial(&path, baud)?))
}

/// Converts seconds from the command line or config into a duration.
pub fn secs(value: f64, what: &str) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| anyhow::anyhow!("Invalid {what}: {value} s"))
}

/// The mass range and spring constants from `[model]`.
pub fn model_parts(model: &ModelConfig) -> (MassSelector, ResonanceParameters) {
    let mut selector = MassSelector::new(
        model.mass_step_grams,
        model.mass_min_grams,
        model.mass_max_grams,
    );
    selector.set(f64::from(model.initial_mass_grams));
    let params = ResonanceParameters {
        added_mass_kg: model.added_mass_kg,
        spring_constant: model.spring_constant,
    };
    (selector, params)
}

/// Session settings from the whole configuration.
pub fn monitor_settings(config: &ResoscopeConfig) -> anyhow::Result<MonitorSettings> {
    let acq = &config.acquisition;
    let mon = &config.monitor;
    let (mass, model) = model_parts(&config.model);
    Ok(MonitorSettings {
        capacities: BufferCapacities {
            display: acq.display_capacity,
            analysis: acq.analysis_capacity,
            recording: acq.recording_capacity,
        },
        dc_offset: acq.dc_offset,
        calibration: secs(acq.calibration_secs, "calibration time")?,
        fast_tick: Duration::from_millis(mon.fast_tick_ms),
        slow_tick: Duration::from_millis(mon.slow_tick_ms),
        analysis_window_secs: mon.analysis_window_secs,
        policy: SearchPolicy::new(mon.search_limit_hz, mon.skip_bins),
        bandpass: bandpass_rules(config),
        model,
        mass,
        filter_enabled: mon.filter_enabled,
    })
}

/// Band-pass rules from `[monitor]`, for commands that only design.
pub fn bandpass_rules(config: &ResoscopeConfig) -> AdaptiveBandpass {
    let mon = &config.monitor;
    AdaptiveBandpass {
        order: mon.filter_order,
        half_width_hz: mon.band_half_width_hz,
        floor_hz: mon.band_floor_hz,
        initial: BandTarget::new(mon.initial_band_hz[0], mon.initial_band_hz[1]),
    }
}

/// Batch pipeline settings from `[batch]`.
pub fn batch_settings(batch: &BatchConfig) -> BatchSettings {
    BatchSettings {
        trim_fraction: batch.trim_fraction,
        highpass_cutoff_hz: batch.highpass_cutoff_hz,
        highpass_order: batch.highpass_order,
        envelope_window: batch.envelope_window,
        policy: SearchPolicy::new(batch.search_limit_hz, batch.skip_bins),
    }
}

/// Output path for a recording: the explicit one, or a fresh timestamped
/// file in the recordings directory (created if needed).
pub fn recording_path(
    explicit: Option<PathBuf>,
    recording: &RecordingConfig,
) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let dir = recording
        .output_dir
        .as_ref()
        .map_or_else(paths::recordings_dir, PathBuf::from);
    std::fs::create_dir_all(&dir)?;
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    Ok(dir.join(format!("recording-{stamp}.csv")))
}
