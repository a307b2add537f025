//! Live monitoring command.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use resoscope_analysis::AnalysisError;
use resoscope_config::RecordingConfig;
use resoscope_io::{
    AnalysisReport, ControlHandle, FixedRateClock, MonitorObserver, MonitorSession, Recording,
    SessionState, WaveformFrame, write_recording,
};

use super::common::{SourceArgs, load_config, monitor_settings, open_source, recording_path, secs};

#[derive(Args)]
pub struct MonitorArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Initial mass in grams (snapped to the selector step)
    #[arg(short, long)]
    mass: Option<f64>,

    /// Start with the band-pass filter on
    #[arg(long)]
    filter: bool,

    /// Start recording immediately for this many seconds
    #[arg(long, value_name = "SECS")]
    record: Option<f64>,

    /// Where to save recordings (default: recordings directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settling time before the sampling rate is estimated, seconds
    #[arg(long, value_name = "SECS")]
    calibration: Option<f64>,

    /// Stamp stdin samples at this fixed rate instead of the wall clock
    /// (for replaying recorded values)
    #[arg(long, value_name = "HZ", requires = "stdin")]
    replay_rate: Option<f64>,
}

pub fn run(args: MonitorArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(secs) = args.calibration {
        config.acquisition.calibration_secs = secs;
    }
    if args.filter {
        config.monitor.filter_enabled = true;
    }
    let settings = monitor_settings(&config)?;
    let record_for = args.record.map(|s| secs(s, "recording time")).transpose()?;

    let mut session = MonitorSession::new(settings);
    let control = session.control();
    if let Some(mass) = args.mass {
        control.set_mass(mass);
    }

    let stop = control.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nStopping...");
        stop.stop();
    })?;

    let opener = || open_source(&args.source, &config.acquisition);
    match args.replay_rate {
        Some(rate) if rate > 0.0 && rate.is_finite() => {
            session.connect_with_clock(opener, FixedRateClock::new(rate))?;
        }
        Some(rate) => anyhow::bail!("Invalid replay rate: {rate} Hz"),
        None => session.connect(opener)?,
    }

    println!(
        "Calibrating for {:.1}s (Ctrl+C to stop)...",
        session.settings().calibration.as_secs_f64()
    );
    let calibration = session.calibrate()?;
    println!(
        "Sampling rate: {:.2} Hz ({} samples over {:.2}s)",
        calibration.sampling_rate, calibration.samples, calibration.span_secs
    );
    println!(
        "Mass: {} g, filter {}",
        control.mass_grams(),
        if control.filter_enabled() { "on" } else { "off" }
    );

    if let Some(duration) = record_for {
        session.start_recording(Some(duration))?;
        println!("Recording for {:.1}s", duration.as_secs_f64());
    }

    if !args.source.stdin {
        spawn_console(control.clone());
        println!("Commands: mass <g> | + | - | filter on|off | record [secs] | stop | quit");
    }
    println!();

    let mut console = Console::new(args.output, config.recording.clone());
    let outcome = session.run(&mut console);
    let stats = session.disconnect()?;
    outcome?;

    println!(
        "\n{} samples read, {} malformed line(s) dropped",
        stats.samples, stats.dropped
    );
    if let Some(e) = console.save_error {
        return Err(e);
    }
    Ok(())
}

/// Prints analyses and saves recordings.
struct Console {
    output: Option<PathBuf>,
    recording: RecordingConfig,
    last_span: Option<(f64, f64)>,
    waiting_since: Option<Instant>,
    save_error: Option<anyhow::Error>,
}

impl Console {
    fn new(output: Option<PathBuf>, recording: RecordingConfig) -> Self {
        Self {
            output,
            recording,
            last_span: None,
            waiting_since: None,
            save_error: None,
        }
    }

    fn save(&mut self, recording: &Recording) -> anyhow::Result<PathBuf> {
        // An explicit path is reused only for the first recording.
        let path = recording_path(self.output.take(), &self.recording)?;
        write_recording(&path, &recording.samples)?;
        Ok(path)
    }
}

impl MonitorObserver for Console {
    fn on_status(&mut self, state: SessionState, message: &str) {
        tracing::debug!(%state, message, "session status");
        if message != "monitoring" {
            println!("[{state}] {message}");
        }
    }

    fn on_waveform(&mut self, frame: &WaveformFrame) {
        let lo = frame.values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = frame.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo.is_finite() && hi.is_finite() {
            self.last_span = Some((lo, hi));
        }
    }

    fn on_analysis(&mut self, report: &AnalysisReport) {
        self.waiting_since = None;
        let swing = self
            .last_span
            .map(|(lo, hi)| format!("{:.3} Vpp", hi - lo))
            .unwrap_or_else(|| "-".into());
        let inferred = report
            .inferred_mass_grams
            .map(|g| format!("{g:.0} g"))
            .unwrap_or_else(|| "-".into());
        println!(
            "mass {:>3} g | model {:.3} Hz (bare {:.3}) | band {:.1}-{:.1} Hz{} | peak {:.3} Hz (mag {:.1}) | inferred {} | {}",
            report.mass_grams,
            report.model.f_loaded,
            report.model.f_bare,
            report.band.low_hz,
            report.band.high_hz,
            if report.filtered { "" } else { " (off)" },
            report.peak_frequency,
            report.peak_magnitude,
            inferred,
            swing,
        );
    }

    fn on_skipped(&mut self, reason: &AnalysisError) {
        let now = Instant::now();
        let due = self
            .waiting_since
            .is_none_or(|t| now.duration_since(t) >= Duration::from_secs(5));
        if due {
            if let AnalysisError::InsufficientData {
                available,
                required,
            } = reason
            {
                println!("Collecting data: {available}/{required} samples");
            } else {
                println!("Skipped: {reason}");
            }
            self.waiting_since = Some(now);
        }
    }

    fn on_recording(&mut self, recording: Recording) {
        if recording.is_empty() {
            println!("Recording stopped (no samples captured)");
            return;
        }
        match self.save(&recording) {
            Ok(path) => println!(
                "Saved {} samples ({:.1}s) to {}",
                recording.len(),
                recording.duration_secs(),
                path.display()
            ),
            Err(e) => {
                eprintln!("Failed to save recording: {e}");
                self.save_error = Some(e);
            }
        }
    }
}

/// One parsed console line.
#[derive(Debug, PartialEq)]
enum ConsoleCommand {
    Mass(f64),
    StepUp,
    StepDown,
    Filter(bool),
    Record(Option<f64>),
    StopRecording,
    Quit,
}

fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or("");
    let arg = words.next();
    match (command, arg) {
        ("mass" | "m", Some(g)) => g
            .parse()
            .map(ConsoleCommand::Mass)
            .map_err(|_| format!("Invalid mass '{g}'")),
        ("+", None) => Ok(ConsoleCommand::StepUp),
        ("-", None) => Ok(ConsoleCommand::StepDown),
        ("filter", Some("on")) => Ok(ConsoleCommand::Filter(true)),
        ("filter", Some("off")) => Ok(ConsoleCommand::Filter(false)),
        ("record" | "r", None) => Ok(ConsoleCommand::Record(None)),
        ("record" | "r", Some(s)) => s
            .parse()
            .map(|secs| ConsoleCommand::Record(Some(secs)))
            .map_err(|_| format!("Invalid duration '{s}'")),
        ("stop", None) => Ok(ConsoleCommand::StopRecording),
        ("quit" | "q" | "exit", None) => Ok(ConsoleCommand::Quit),
        _ => Err(format!("Unknown command '{}'", line.trim())),
    }
}

/// Reads control commands from stdin on a detached thread.
fn spawn_console(control: ControlHandle) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Ok(ConsoleCommand::Mass(g)) => println!("Mass set to {} g", control.set_mass(g)),
                Ok(ConsoleCommand::StepUp) => println!("Mass set to {} g", control.step_mass_up()),
                Ok(ConsoleCommand::StepDown) => {
                    println!("Mass set to {} g", control.step_mass_down());
                }
                Ok(ConsoleCommand::Filter(on)) => control.set_filter_enabled(on),
                Ok(ConsoleCommand::Record(secs)) => {
                    match secs.map(Duration::try_from_secs_f64).transpose() {
                        Ok(duration) => control.start_recording(duration),
                        Err(_) => eprintln!("Invalid duration"),
                    }
                }
                Ok(ConsoleCommand::StopRecording) => control.stop_recording(),
                Ok(ConsoleCommand::Quit) => {
                    control.stop();
                    break;
                }
                Err(e) => eprintln!("{e}"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_console_commands() {
        assert_eq!(parse_command("mass 120"), Ok(ConsoleCommand::Mass(120.0)));
        assert_eq!(parse_command("  + "), Ok(ConsoleCommand::StepUp));
        assert_eq!(parse_command("filter off"), Ok(ConsoleCommand::Filter(false)));
        assert_eq!(parse_command("record 30"), Ok(ConsoleCommand::Record(Some(30.0))));
        assert_eq!(parse_command("record"), Ok(ConsoleCommand::Record(None)));
        assert_eq!(parse_command("stop"), Ok(ConsoleCommand::StopRecording));
        assert_eq!(parse_command("q"), Ok(ConsoleCommand::Quit));
    }

    #[test]
    fn rejects_bad_commands() {
        assert!(parse_command("mass heavy").is_err());
        assert!(parse_command("filter maybe").is_err());
        assert!(parse_command("dance").is_err());
    }
}
