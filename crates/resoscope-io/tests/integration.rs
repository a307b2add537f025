//! Integration tests for resoscope-io.
//!
//! File round trips through a temp directory, and a replayed sensor stream
//! driven through the monitor session into a recording that is then
//! batch-analyzed.

use std::f64::consts::PI;
use std::io::Cursor;

use resoscope_analysis::BatchAnalyzer;
use resoscope_core::Sample;
use resoscope_io::{
    Error, FixedRateClock, LineSource, MonitorObserver, MonitorSession, MonitorSettings,
    Recording, SessionState, read_recording, write_recording, write_spectrum,
};
use tempfile::TempDir;

fn oscillation(n: usize, freq_hz: f64) -> Vec<Sample> {
    (0..n)
        .map(|i| {
            let t = i as f64 / 1000.0;
            Sample::new(t, 2.2 + 0.4 * (2.0 * PI * freq_hz * t).sin())
        })
        .collect()
}

#[test]
fn export_then_import_preserves_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.csv");
    let samples = oscillation(1234, 2.0);

    write_recording(&path, &samples).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Timestamp (s), Voltage (V)\n"));

    let loaded = read_recording(&path).unwrap();
    assert_eq!(loaded, samples);
}

#[test]
fn headerless_file_from_older_collector() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.csv");
    std::fs::write(&path, "0.0,2.21\n0.001,2.25\n0.002,2.19\n").unwrap();

    let loaded = read_recording(&path).unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[2], Sample::new(0.002, 2.19));
}

#[test]
fn malformed_file_names_the_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.csv");
    std::fs::write(&path, "Timestamp (s), Voltage (V)\n0.0,2.2\n0.001,\n").unwrap();

    let err = read_recording(&path).unwrap_err();
    assert!(matches!(err, Error::FileFormat { line: 3, .. }), "{err}");
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = read_recording(dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn batch_analysis_of_saved_recording() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.csv");
    write_recording(&path, &oscillation(30_000, 1.8)).unwrap();

    let samples = read_recording(&path).unwrap();
    let report = BatchAnalyzer::default().analyze(&samples).unwrap();
    assert!(
        (report.peak_frequency - 1.8).abs() <= report.spectrum.resolution_hz,
        "peak {}",
        report.peak_frequency
    );

    let spectrum_path = dir.path().join("spectrum.csv");
    write_spectrum(&spectrum_path, &report.spectrum).unwrap();
    let text = std::fs::read_to_string(&spectrum_path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("frequency_hz,magnitude"));
    assert_eq!(lines.count(), report.spectrum.frequencies.len());
}

#[derive(Default)]
struct Saver {
    recordings: Vec<Recording>,
    final_state: Option<SessionState>,
}

impl MonitorObserver for Saver {
    fn on_status(&mut self, state: SessionState, _message: &str) {
        self.final_state = Some(state);
    }

    fn on_recording(&mut self, recording: Recording) {
        self.recordings.push(recording);
    }
}

#[test]
fn replayed_stream_through_session() {
    let lines: String = oscillation(22_000, 2.5)
        .iter()
        .map(|s| format!("{}\n", s.value))
        .collect();

    let mut session = MonitorSession::new(MonitorSettings::default());
    session
        .connect_with_clock(
            move || Ok(Box::new(LineSource::new(Cursor::new(lines), "replay"))),
            FixedRateClock::new(1000.0),
        )
        .unwrap();
    let calibration = session.calibrate().unwrap();
    assert!((calibration.sampling_rate - 1000.2).abs() < 0.01);

    let mut saver = Saver::default();
    session.run(&mut saver).unwrap();
    assert_eq!(saver.final_state, Some(SessionState::Monitoring));
    assert!(saver.recordings.is_empty());

    let stats = session.disconnect().unwrap();
    assert_eq!(stats.samples, 22_000);
    assert_eq!(stats.dropped, 0);
    assert_eq!(session.state(), SessionState::Idle);
}
