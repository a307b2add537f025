//! The live monitoring session.
//!
//! A [`MonitorSession`] walks through
//! `Idle → Connected → Calibrating → Monitoring`. Recording is an orthogonal
//! flag that can be raised in any state with a running producer.
//!
//! While monitoring, two ticks run on the caller's thread:
//!
//! - **fast** (10 ms): snapshot the display buffer and band-pass it with the
//!   current design, producing a [`WaveformFrame`]
//! - **slow** (200 ms): read the selected mass, redesign the band-pass around
//!   the model frequency, analyze the last 20 s of the analysis buffer, and
//!   produce an [`AnalysisReport`]
//!
//! Everything the user can change while the loop runs (mass, filter on/off,
//! recording, stop) goes through a cloneable [`ControlHandle`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use resoscope_analysis::{
    AdaptiveBandpass, AnalysisError, BandTarget, MassSelector, ModelFrequencies,
    ResonanceParameters, SearchPolicy, SpectralAnalyzer, SpectrumResult,
    estimate_sampling_rate,
};
use resoscope_core::{FilterSpec, Sample, apply_sos};

use crate::acquisition::{Acquisition, BufferCapacities, ProducerStats, SharedBuffers};
use crate::clock::{Clock, SystemClock};
use crate::source::SampleSource;
use crate::{Error, Result};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No device.
    Idle,
    /// Producer running, sampling rate unknown.
    Connected,
    /// Waiting out the settling period.
    Calibrating,
    /// Rate known, ticks may run.
    Monitoring,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Connected => "connected",
            Self::Calibrating => "calibrating",
            Self::Monitoring => "monitoring",
        })
    }
}

/// Session tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    /// Buffer sizes.
    pub capacities: BufferCapacities,
    /// Sensor bias removed from display and analysis values, volts.
    pub dc_offset: f64,
    /// Settling time before the rate is estimated.
    pub calibration: Duration,
    /// Waveform refresh period.
    pub fast_tick: Duration,
    /// Analysis period.
    pub slow_tick: Duration,
    /// History analyzed per slow tick, seconds.
    pub analysis_window_secs: f64,
    /// Peak search band.
    pub policy: SearchPolicy,
    /// Band-pass design rules.
    pub bandpass: AdaptiveBandpass,
    /// Spring constants.
    pub model: ResonanceParameters,
    /// Mass range and the initial selection.
    pub mass: MassSelector,
    /// Whether the band-pass starts enabled. Off by default.
    pub filter_enabled: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            capacities: BufferCapacities::default(),
            dc_offset: 2.2,
            calibration: Duration::from_secs(5),
            fast_tick: Duration::from_millis(10),
            slow_tick: Duration::from_millis(200),
            analysis_window_secs: 20.0,
            policy: SearchPolicy::live(),
            bandpass: AdaptiveBandpass::default(),
            model: ResonanceParameters::default(),
            mass: MassSelector::default(),
            filter_enabled: false,
        }
    }
}

/// Outcome of [`MonitorSession::calibrate`].
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationReport {
    /// Estimated sampling rate, Hz.
    pub sampling_rate: f64,
    /// Samples the estimate was based on.
    pub samples: usize,
    /// Time they span, seconds.
    pub span_secs: f64,
    /// Band of the initial filter.
    pub band: BandTarget,
}

/// One waveform refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformFrame {
    /// Sample times, seconds.
    pub timestamps: Vec<f64>,
    /// Offset-removed values, band-passed when `filtered`.
    pub values: Vec<f64>,
    /// Whether the band-pass was applied.
    pub filtered: bool,
}

/// One slow-tick analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Selected mass, grams.
    pub mass_grams: u32,
    /// Model frequencies for that mass.
    pub model: ModelFrequencies,
    /// Band the filter was designed for.
    pub band: BandTarget,
    /// Sampling rate from calibration.
    pub sampling_rate: f64,
    /// Samples analyzed.
    pub window_len: usize,
    /// Whether the band-pass was applied before the FFT.
    pub filtered: bool,
    /// The inspected spectrum.
    pub spectrum: SpectrumResult,
    /// Dominant frequency, Hz.
    pub peak_frequency: f64,
    /// Magnitude at the peak.
    pub peak_magnitude: f64,
    /// Mass the loaded model assigns to the peak, grams.
    pub inferred_mass_grams: Option<f64>,
}

/// Samples captured between a start and a stop of recording.
///
/// Values are raw device readings (bias included).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    /// Captured samples, oldest first.
    pub samples: Vec<Sample>,
    /// Duration asked for at start, if any.
    pub requested: Option<Duration>,
}

impl Recording {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time between the first and last sample, seconds.
    pub fn duration_secs(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(a), Some(b)) => b.timestamp - a.timestamp,
            _ => 0.0,
        }
    }
}

/// Receives everything a running session produces.
///
/// All methods default to doing nothing.
pub trait MonitorObserver {
    /// State changes and notable events.
    fn on_status(&mut self, _state: SessionState, _message: &str) {}

    /// A fast-tick waveform.
    fn on_waveform(&mut self, _frame: &WaveformFrame) {}

    /// A slow-tick analysis.
    fn on_analysis(&mut self, _report: &AnalysisReport) {}

    /// A slow tick that had too little data to analyze.
    fn on_skipped(&mut self, _reason: &AnalysisError) {}

    /// A finished recording, handed over for export.
    fn on_recording(&mut self, _recording: Recording) {}
}

/// Queued requests that need the session itself to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    /// Start recording, optionally stopping after the duration.
    StartRecording(Option<Duration>),
    /// Stop recording and hand the capture to the observer.
    StopRecording,
}

#[derive(Debug)]
struct ControlShared {
    mass: Mutex<MassSelector>,
    filter_enabled: AtomicBool,
    stop: AtomicBool,
    requests: Mutex<VecDeque<ControlRequest>>,
}

/// Thread-safe remote control for a session.
///
/// Clones share state; hand one to a Ctrl+C handler or an input thread.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    inner: Arc<ControlShared>,
}

impl ControlHandle {
    /// Creates a handle with the given selector and filter state.
    pub fn new(mass: MassSelector, filter_enabled: bool) -> Self {
        Self {
            inner: Arc::new(ControlShared {
                mass: Mutex::new(mass),
                filter_enabled: AtomicBool::new(filter_enabled),
                stop: AtomicBool::new(false),
                requests: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Requests a mass; returns the snapped, clamped value in effect.
    pub fn set_mass(&self, grams: f64) -> u32 {
        self.inner
            .mass
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set(grams)
    }

    /// Moves the mass one step up.
    pub fn step_mass_up(&self) -> u32 {
        self.inner
            .mass
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .step_up()
    }

    /// Moves the mass one step down.
    pub fn step_mass_down(&self) -> u32 {
        self.inner
            .mass
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .step_down()
    }

    /// Currently selected mass, grams.
    pub fn mass_grams(&self) -> u32 {
        self.mass().grams()
    }

    /// Copy of the selector.
    pub fn mass(&self) -> MassSelector {
        *self.inner.mass.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Turns the band-pass on or off.
    pub fn set_filter_enabled(&self, enabled: bool) {
        self.inner.filter_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether the band-pass is applied.
    pub fn filter_enabled(&self) -> bool {
        self.inner.filter_enabled.load(Ordering::Relaxed)
    }

    /// Asks the running session to start recording.
    pub fn start_recording(&self, duration: Option<Duration>) {
        self.push(ControlRequest::StartRecording(duration));
    }

    /// Asks the running session to stop recording.
    pub fn stop_recording(&self) {
        self.push(ControlRequest::StopRecording);
    }

    /// Asks the running session to return.
    pub fn stop(&self) {
        self.inner.stop.store(true, Ordering::Release);
    }

    /// True once [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.inner.stop.load(Ordering::Acquire)
    }

    fn push(&self, request: ControlRequest) {
        self.inner
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(request);
    }

    fn take_requests(&self) -> Vec<ControlRequest> {
        self.inner
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }
}

struct ActiveRecording {
    requested: Option<Duration>,
    deadline: Option<Instant>,
}

/// Live acquisition plus adaptive analysis.
pub struct MonitorSession {
    settings: MonitorSettings,
    state: SessionState,
    control: ControlHandle,
    acquisition: Option<Acquisition>,
    sampling_rate: Option<f64>,
    filter: Option<FilterSpec>,
    analyzer: SpectralAnalyzer,
    recording: Option<ActiveRecording>,
}

impl MonitorSession {
    /// Creates an idle session.
    pub fn new(settings: MonitorSettings) -> Self {
        let control = ControlHandle::new(settings.mass, settings.filter_enabled);
        Self {
            settings,
            state: SessionState::Idle,
            control,
            acquisition: None,
            sampling_rate: None,
            filter: None,
            analyzer: SpectralAnalyzer::new(),
            recording: None,
        }
    }

    /// Session tunables.
    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// A handle sharing this session's controls.
    pub fn control(&self) -> ControlHandle {
        self.control.clone()
    }

    /// Rate from the last calibration.
    pub fn sampling_rate(&self) -> Option<f64> {
        self.sampling_rate
    }

    /// The band-pass used by the next fast tick.
    pub fn current_filter(&self) -> Option<&FilterSpec> {
        self.filter.as_ref()
    }

    /// Buffers of the running producer.
    pub fn buffers(&self) -> Option<&SharedBuffers> {
        self.acquisition.as_ref().map(Acquisition::buffers)
    }

    /// True while samples are being recorded.
    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// True once the producer has stopped on its own (end of stream or a
    /// read error).
    pub fn source_finished(&self) -> bool {
        self.acquisition
            .as_ref()
            .is_some_and(Acquisition::is_finished)
    }

    /// Opens a source and starts the producer with wall-clock timestamps.
    pub fn connect<F>(&mut self, opener: F) -> Result<()>
    where
        F: FnOnce() -> Result<Box<dyn SampleSource + Send>>,
    {
        self.connect_with_clock(opener, SystemClock::new())
    }

    /// Opens a source and starts the producer with the given clock.
    ///
    /// If the opener fails the session stays idle.
    pub fn connect_with_clock<F, C>(&mut self, opener: F, clock: C) -> Result<()>
    where
        F: FnOnce() -> Result<Box<dyn SampleSource + Send>>,
        C: Clock + Send + 'static,
    {
        self.require(&[SessionState::Idle], "connect")?;
        let source = opener().inspect_err(|e| {
            tracing::warn!(error = %e, "failed to open sample source");
        })?;
        let buffers = SharedBuffers::new(self.settings.capacities, self.settings.dc_offset);
        self.acquisition = Some(Acquisition::spawn(source, clock, buffers)?);
        self.state = SessionState::Connected;
        tracing::info!("session connected");
        Ok(())
    }

    /// Waits out the settling period, estimates the sampling rate from the
    /// display buffer, and designs the initial band-pass.
    ///
    /// Returns early if the source ends or a stop is requested. On failure
    /// the session stays connected.
    pub fn calibrate(&mut self) -> Result<CalibrationReport> {
        self.require(&[SessionState::Connected], "calibrate")?;
        self.state = SessionState::Calibrating;
        tracing::info!(secs = self.settings.calibration.as_secs_f64(), "calibrating");

        let deadline = Instant::now() + self.settings.calibration;
        loop {
            let now = Instant::now();
            if now >= deadline || self.source_finished() || self.control.is_stopped() {
                break;
            }
            std::thread::sleep((deadline - now).min(Duration::from_millis(10)));
        }

        let snapshot = match self.buffers() {
            Some(buffers) => buffers.lock().display().to_vec(),
            None => Vec::new(),
        };
        let rate = match estimate_sampling_rate(&snapshot) {
            Ok(rate) => rate,
            Err(e) => {
                self.state = SessionState::Connected;
                return Err(Error::Calibration(e));
            }
        };
        let filter = match self.settings.bandpass.design_initial(rate) {
            Ok(spec) => spec,
            Err(e) => {
                self.state = SessionState::Connected;
                return Err(AnalysisError::from(e).into());
            }
        };

        let report = CalibrationReport {
            sampling_rate: rate,
            samples: snapshot.len(),
            span_secs: snapshot.last().map_or(0.0, |s| s.timestamp)
                - snapshot.first().map_or(0.0, |s| s.timestamp),
            band: self.settings.bandpass.initial,
        };
        self.sampling_rate = Some(rate);
        self.filter = Some(filter);
        self.state = SessionState::Monitoring;
        tracing::info!(sampling_rate = rate, samples = report.samples, "calibrated");
        Ok(report)
    }

    /// Snapshots the display buffer, band-passed when the filter is enabled.
    pub fn fast_tick(&mut self) -> Result<WaveformFrame> {
        self.require(&[SessionState::Monitoring], "refresh the waveform")?;
        let snapshot = match self.buffers() {
            Some(buffers) => buffers.lock().display().to_vec(),
            None => Vec::new(),
        };
        let timestamps = snapshot.iter().map(|s| s.timestamp).collect();
        let raw: Vec<f64> = snapshot.iter().map(|s| s.value).collect();

        let (values, filtered) = match (&self.filter, self.control.filter_enabled()) {
            (Some(spec), true) => (apply_sos(spec, &raw), true),
            _ => (raw, false),
        };
        Ok(WaveformFrame {
            timestamps,
            values,
            filtered,
        })
    }

    /// Redesigns the band-pass for the selected mass and analyzes the
    /// latest window.
    ///
    /// The design happens first, so the waveform follows the mass even when
    /// the window is still too short; that case returns
    /// [`AnalysisError::InsufficientData`].
    pub fn slow_tick(&mut self) -> Result<AnalysisReport> {
        self.require(&[SessionState::Monitoring], "analyze")?;
        let rate = self
            .sampling_rate
            .ok_or(AnalysisError::InvalidSamplingRate(0.0))?;

        let mass_grams = self.control.mass_grams();
        let model = self.settings.model.frequencies(f64::from(mass_grams));
        let band = self.settings.bandpass.target(model.f_loaded);
        let spec = self
            .settings
            .bandpass
            .design(model.f_loaded, rate)
            .map_err(AnalysisError::from)?;
        self.filter = Some(spec);

        let window_len = (rate * self.settings.analysis_window_secs).floor() as usize;
        let window = {
            let Some(buffers) = self.buffers() else {
                return Err(self.invalid("analyze"));
            };
            let guard = buffers.lock();
            let available = guard.analysis().len();
            if available < window_len {
                return Err(AnalysisError::InsufficientData {
                    available,
                    required: window_len,
                }
                .into());
            }
            guard.analysis().values(window_len)
        };

        let filtered = self.control.filter_enabled();
        let signal = match (&self.filter, filtered) {
            (Some(spec), true) => apply_sos(spec, &window),
            _ => window,
        };
        let spectrum = self.analyzer.analyze(&signal, rate, self.settings.policy)?;
        let inferred_mass_grams = self.settings.model.infer_mass_grams(spectrum.peak_frequency);

        Ok(AnalysisReport {
            mass_grams,
            model,
            band,
            sampling_rate: rate,
            window_len,
            filtered,
            peak_frequency: spectrum.peak_frequency,
            peak_magnitude: spectrum.peak_magnitude,
            spectrum,
            inferred_mass_grams,
        })
    }

    /// Clears the recording buffer and starts capturing.
    ///
    /// With a duration, the capture stops once it elapses (checked by
    /// [`run`](Self::run) or [`recording_due`](Self::recording_due)).
    pub fn start_recording(&mut self, duration: Option<Duration>) -> Result<()> {
        let Some(buffers) = self.buffers() else {
            return Err(self.invalid("start recording"));
        };
        buffers.lock().start_recording();
        self.recording = Some(ActiveRecording {
            requested: duration,
            deadline: duration.map(|d| Instant::now() + d),
        });
        tracing::info!(duration_secs = duration.map(|d| d.as_secs_f64()), "recording started");
        Ok(())
    }

    /// Stops capturing and returns the capture, or `None` if not recording.
    ///
    /// Acquisition keeps running.
    pub fn stop_recording(&mut self) -> Result<Option<Recording>> {
        let Some(buffers) = self.buffers() else {
            return Err(self.invalid("stop recording"));
        };
        let samples = buffers.lock().stop_recording();
        let Some(active) = self.recording.take() else {
            return Ok(None);
        };
        tracing::info!(samples = samples.len(), "recording stopped");
        Ok(Some(Recording {
            samples,
            requested: active.requested,
        }))
    }

    /// True when a timed recording has reached its duration.
    pub fn recording_due(&self) -> bool {
        self.recording
            .as_ref()
            .and_then(|r| r.deadline)
            .is_some_and(|d| Instant::now() >= d)
    }

    /// Runs both ticks until a stop is requested or the source ends.
    ///
    /// When the source ends, one final pair of ticks covers whatever arrived
    /// last. A recording still active on return is handed to the observer,
    /// also when a tick fails.
    pub fn run<O: MonitorObserver + ?Sized>(&mut self, observer: &mut O) -> Result<()> {
        self.require(&[SessionState::Monitoring], "run")?;
        observer.on_status(self.state, "monitoring");

        let outcome = self.tick_until_done(observer);
        if let Some(recording) = self.stop_recording()? {
            observer.on_recording(recording);
        }
        let reason = outcome.inspect_err(|e| {
            tracing::warn!(error = %e, "monitor loop failed");
        })?;
        tracing::info!(reason, "monitor loop finished");
        observer.on_status(self.state, reason);
        Ok(())
    }

    fn tick_until_done<O: MonitorObserver + ?Sized>(
        &mut self,
        observer: &mut O,
    ) -> Result<&'static str> {
        let fast = self.settings.fast_tick;
        let slow = self.settings.slow_tick;
        let mut next_fast = Instant::now();
        let mut next_slow = next_fast;

        loop {
            if self.control.is_stopped() {
                return Ok("stop requested");
            }
            let source_done = self.source_finished();
            self.apply_requests(observer)?;
            if self.recording_due()
                && let Some(recording) = self.stop_recording()?
            {
                observer.on_recording(recording);
            }

            if source_done {
                self.emit_waveform(observer)?;
                self.emit_analysis(observer)?;
                return Ok("source ended");
            }

            let now = Instant::now();
            if now >= next_fast {
                self.emit_waveform(observer)?;
                next_fast = advance(next_fast, fast, now);
            }
            if now >= next_slow {
                self.emit_analysis(observer)?;
                next_slow = advance(next_slow, slow, now);
            }
            let wake = next_fast.min(next_slow);
            std::thread::sleep(wake.saturating_duration_since(Instant::now()));
        }
    }

    /// Stops the producer and returns to idle.
    pub fn disconnect(&mut self) -> Result<ProducerStats> {
        let Some(acquisition) = self.acquisition.take() else {
            return Err(self.invalid("disconnect"));
        };
        let stats = acquisition.stop();
        self.state = SessionState::Idle;
        self.sampling_rate = None;
        self.filter = None;
        self.recording = None;
        tracing::info!("session disconnected");
        Ok(stats)
    }

    fn apply_requests<O: MonitorObserver + ?Sized>(&mut self, observer: &mut O) -> Result<()> {
        for request in self.control.take_requests() {
            match request {
                ControlRequest::StartRecording(duration) => {
                    self.start_recording(duration)?;
                    observer.on_status(self.state, "recording started");
                }
                ControlRequest::StopRecording => {
                    if let Some(recording) = self.stop_recording()? {
                        observer.on_recording(recording);
                    }
                }
            }
        }
        Ok(())
    }

    fn emit_waveform<O: MonitorObserver + ?Sized>(&mut self, observer: &mut O) -> Result<()> {
        let frame = self.fast_tick()?;
        observer.on_waveform(&frame);
        Ok(())
    }

    fn emit_analysis<O: MonitorObserver + ?Sized>(&mut self, observer: &mut O) -> Result<()> {
        match self.slow_tick() {
            Ok(report) => observer.on_analysis(&report),
            Err(Error::Analysis(reason @ AnalysisError::InsufficientData { .. })) => {
                tracing::debug!(%reason, "analysis tick skipped");
                observer.on_skipped(&reason);
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn require(&self, allowed: &[SessionState], operation: &'static str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> Error {
        Error::InvalidState {
            operation,
            state: self.state,
        }
    }
}

/// Next deadline of a periodic tick, dropping missed periods.
fn advance(scheduled: Instant, period: Duration, now: Instant) -> Instant {
    let next = scheduled + period;
    if next > now { next } else { now + period }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedRateClock;
    use crate::source::LineSource;
    use std::f64::consts::PI;
    use std::io::{self, Cursor};
    use std::sync::mpsc;

    /// Raw device lines: 2.2 V bias plus a 2.5 Hz sine at 1 kHz.
    fn sensor_lines(n: usize) -> String {
        (0..n)
            .map(|i| {
                let v = 2.2 + (2.0 * PI * 2.5 * i as f64 / 1000.0).sin();
                format!("{v}\n")
            })
            .collect()
    }

    fn connect_memory(session: &mut MonitorSession, text: String) {
        session
            .connect_with_clock(
                move || Ok(Box::new(LineSource::new(Cursor::new(text), "synthetic"))),
                FixedRateClock::new(1000.0),
            )
            .unwrap();
    }

    struct ChannelSource(mpsc::Receiver<String>);

    impl SampleSource for ChannelSource {
        fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
            match self.0.recv() {
                Ok(line) => {
                    buf.push_str(&line);
                    Ok(line.len())
                }
                Err(_) => Ok(0),
            }
        }

        fn describe(&self) -> String {
            "channel".into()
        }
    }

    fn wait_for_samples(session: &MonitorSession, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while session.buffers().unwrap().lock().display().len() < n {
            assert!(Instant::now() < deadline, "timed out waiting for {n} samples");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[derive(Default)]
    struct Collect {
        statuses: Vec<String>,
        frames: usize,
        reports: Vec<AnalysisReport>,
        skipped: usize,
        recordings: Vec<Recording>,
    }

    impl MonitorObserver for Collect {
        fn on_status(&mut self, _state: SessionState, message: &str) {
            self.statuses.push(message.to_owned());
        }
        fn on_waveform(&mut self, _frame: &WaveformFrame) {
            self.frames += 1;
        }
        fn on_analysis(&mut self, report: &AnalysisReport) {
            self.reports.push(report.clone());
        }
        fn on_skipped(&mut self, _reason: &AnalysisError) {
            self.skipped += 1;
        }
        fn on_recording(&mut self, recording: Recording) {
            self.recordings.push(recording);
        }
    }

    #[test]
    fn failed_open_stays_idle() {
        let mut session = MonitorSession::new(MonitorSettings::default());
        let err = session
            .connect(|| Err(Error::DeviceNotFound("no sensor".into())))
            .unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound(_)));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn operations_check_state() {
        let mut session = MonitorSession::new(MonitorSettings::default());
        assert!(matches!(
            session.calibrate(),
            Err(Error::InvalidState {
                state: SessionState::Idle,
                ..
            })
        ));
        assert!(session.fast_tick().is_err());
        assert!(session.slow_tick().is_err());
        assert!(session.start_recording(None).is_err());
        assert!(session.disconnect().is_err());
        assert!(session.run(&mut Collect::default()).is_err());
    }

    #[test]
    fn calibrate_then_analyze() {
        let mut session = MonitorSession::new(MonitorSettings::default());
        connect_memory(&mut session, sensor_lines(30_000));
        session.control().set_mass(200.0);
        session.control().set_filter_enabled(true);

        let cal = session.calibrate().unwrap();
        assert_eq!(session.state(), SessionState::Monitoring);
        assert_eq!(cal.samples, 5000);
        assert!((cal.sampling_rate - 5000.0 / 4.999).abs() < 1e-6);
        assert_eq!(cal.band, BandTarget::new(2.0, 4.0));

        let frame = session.fast_tick().unwrap();
        assert_eq!(frame.values.len(), 5000);
        assert!(frame.filtered);

        let report = session.slow_tick().unwrap();
        assert_eq!(report.mass_grams, 200);
        assert_eq!(report.band, BandTarget::new(1.5, 3.0));
        assert_eq!(report.window_len, 20_004);
        assert_eq!(report.spectrum.peak_index, 50);
        let grams = report.inferred_mass_grams.unwrap();
        assert!((grams - 96.3).abs() < 0.5, "inferred {grams} g");

        let stats = session.disconnect().unwrap();
        assert_eq!(stats.samples, 30_000);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn short_history_skips_tick_but_redesigns() {
        let mut session = MonitorSession::new(MonitorSettings::default());
        connect_memory(&mut session, sensor_lines(8_000));
        session.calibrate().unwrap();
        session.control().set_mass(200.0);

        let err = session.slow_tick().unwrap_err();
        assert!(matches!(
            err,
            Error::Analysis(AnalysisError::InsufficientData {
                available: 8000,
                ..
            })
        ));
        let kind = session.current_filter().unwrap().kind();
        assert_eq!(
            kind,
            resoscope_core::FilterKind::BandPass {
                low_hz: 1.5,
                high_hz: 3.0
            }
        );
    }

    #[test]
    fn calibration_needs_two_samples() {
        let mut session = MonitorSession::new(MonitorSettings::default());
        connect_memory(&mut session, "2.2\n".into());
        let err = session.calibrate().unwrap_err();
        assert!(matches!(err, Error::Calibration(_)));
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn filter_toggle_reaches_fast_tick() {
        let mut session = MonitorSession::new(MonitorSettings::default());
        connect_memory(&mut session, sensor_lines(6_000));
        session.calibrate().unwrap();

        // starts unfiltered: values are the bare sine, bias removed
        let frame = session.fast_tick().unwrap();
        assert!(!frame.filtered);
        assert!(frame.values.iter().all(|v| v.abs() <= 1.0 + 1e-9));

        session.control().set_filter_enabled(true);
        assert!(session.fast_tick().unwrap().filtered);
        session.control().set_filter_enabled(false);
        assert!(!session.fast_tick().unwrap().filtered);
    }

    #[test]
    fn recording_captures_only_flagged_samples() {
        let (tx, rx) = mpsc::channel();
        let mut session = MonitorSession::new(MonitorSettings::default());
        session
            .connect_with_clock(
                move || Ok(Box::new(ChannelSource(rx))),
                FixedRateClock::new(10.0),
            )
            .unwrap();

        for v in ["2.0\n", "2.1\n", "2.2\n"] {
            tx.send(v.to_owned()).unwrap();
        }
        wait_for_samples(&session, 3);
        session.start_recording(None).unwrap();
        assert!(session.is_recording());
        for v in ["2.3\n", "2.4\n"] {
            tx.send(v.to_owned()).unwrap();
        }
        wait_for_samples(&session, 5);

        let recording = session.stop_recording().unwrap().unwrap();
        assert_eq!(
            recording.samples,
            vec![Sample::new(0.3, 2.3), Sample::new(0.4, 2.4)]
        );
        assert!(session.stop_recording().unwrap().is_none());
        assert_eq!(session.state(), SessionState::Connected);

        drop(tx);
        session.disconnect().unwrap();
    }

    #[test]
    fn run_ends_with_source_and_reports() {
        let mut session = MonitorSession::new(MonitorSettings::default());
        connect_memory(&mut session, sensor_lines(25_000));
        session.control().set_mass(200.0);
        session.calibrate().unwrap();
        session.start_recording(None).unwrap();

        let mut observer = Collect::default();
        session.run(&mut observer).unwrap();

        assert_eq!(observer.frames, 1);
        assert_eq!(observer.skipped, 0);
        assert_eq!(observer.reports.len(), 1);
        assert_eq!(observer.reports[0].spectrum.peak_index, 50);
        assert_eq!(observer.statuses.last().map(String::as_str), Some("source ended"));
        // the producer had finished before recording began
        assert_eq!(observer.recordings.len(), 1);
        assert!(observer.recordings[0].is_empty());
    }

    #[test]
    fn failed_tick_still_delivers_recording() {
        let settings = MonitorSettings {
            calibration: Duration::from_millis(50),
            // puts the model band far above Nyquist
            model: ResonanceParameters {
                spring_constant: 1e9,
                ..ResonanceParameters::default()
            },
            ..MonitorSettings::default()
        };
        let (tx, rx) = mpsc::channel();
        let mut session = MonitorSession::new(settings);
        session
            .connect_with_clock(
                move || Ok(Box::new(ChannelSource(rx))),
                FixedRateClock::new(1000.0),
            )
            .unwrap();
        for line in sensor_lines(100).lines() {
            tx.send(format!("{line}\n")).unwrap();
        }
        wait_for_samples(&session, 100);
        session.calibrate().unwrap();

        session.start_recording(None).unwrap();
        for line in sensor_lines(10).lines() {
            tx.send(format!("{line}\n")).unwrap();
        }
        wait_for_samples(&session, 110);

        let mut observer = Collect::default();
        let err = session.run(&mut observer).unwrap_err();
        assert!(matches!(err, Error::Analysis(AnalysisError::InvalidFilterSpec(_))), "{err}");
        assert_eq!(observer.recordings.len(), 1);
        assert_eq!(observer.recordings[0].len(), 10);
        assert!(!session.is_recording());

        drop(tx);
        session.disconnect().unwrap();
    }

    #[test]
    fn disconnect_returns_while_source_is_silent() {
        let (tx, rx) = mpsc::channel::<String>();
        let mut session = MonitorSession::new(MonitorSettings::default());
        session
            .connect_with_clock(
                move || Ok(Box::new(ChannelSource(rx))),
                FixedRateClock::new(1000.0),
            )
            .unwrap();
        std::thread::sleep(Duration::from_millis(50));

        let started = Instant::now();
        let stats = session.disconnect().unwrap();
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(stats.samples, 0);
        assert_eq!(session.state(), SessionState::Idle);
        drop(tx);
    }

    #[test]
    fn stop_before_run_returns_immediately() {
        let mut session = MonitorSession::new(MonitorSettings::default());
        connect_memory(&mut session, sensor_lines(6_000));
        session.calibrate().unwrap();
        session.control().stop();

        let mut observer = Collect::default();
        session.run(&mut observer).unwrap();
        assert_eq!(observer.frames, 0);
        assert_eq!(observer.statuses, ["monitoring", "stop requested"]);
    }

    #[test]
    fn control_handle_snaps_mass() {
        let control = ControlHandle::new(MassSelector::default(), true);
        assert_eq!(control.set_mass(130.0), 120);
        assert_eq!(control.step_mass_up(), 140);
        assert_eq!(control.set_mass(1000.0), 200);
        assert_eq!(control.step_mass_up(), 200);
        assert_eq!(control.set_mass(0.0), 20);
        assert_eq!(control.step_mass_down(), 20);

        let other = control.clone();
        other.set_mass(60.0);
        assert_eq!(control.mass_grams(), 60);
    }

    #[test]
    fn missed_ticks_are_dropped() {
        let t0 = Instant::now();
        let period = Duration::from_millis(10);
        assert_eq!(advance(t0, period, t0), t0 + period);
        let late = t0 + Duration::from_millis(35);
        assert_eq!(advance(t0, period, late), late + period);
    }
}
