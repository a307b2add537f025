//! Shared acquisition buffers and the producer thread that fills them.
//!
//! One producer reads lines from a [`SampleSource`], stamps them with a
//! [`Clock`], and appends each sample to three bounded buffers under a single
//! mutex:
//!
//! - **display**: short history for the waveform view
//! - **analysis**: long history for spectral analysis
//! - **recording**: populated only while recording is active
//!
//! Display and analysis store `value - dc_offset`; the recording keeps the raw
//! device value so exported files match what the sensor printed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use resoscope_core::{Sample, SampleBuffer};

use crate::clock::Clock;
use crate::source::{SampleSource, parse_voltage};
use crate::Result;

/// Longest [`Acquisition::stop`] waits for a blocked producer.
pub const STOP_GRACE: Duration = Duration::from_millis(500);

/// Sizes of the three acquisition buffers, in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferCapacities {
    /// Waveform history.
    pub display: usize,
    /// Spectral analysis history.
    pub analysis: usize,
    /// Longest recording.
    pub recording: usize,
}

impl Default for BufferCapacities {
    fn default() -> Self {
        Self {
            display: 5_000,
            analysis: 500_000,
            recording: 500_000,
        }
    }
}

/// Counters kept by the producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerStats {
    /// Non-empty lines read.
    pub lines: u64,
    /// Lines that parsed into samples.
    pub samples: u64,
    /// Lines that did not parse.
    pub dropped: u64,
}

/// The buffers shared between the producer and the monitor.
#[derive(Debug)]
pub struct AcquisitionBuffers {
    display: SampleBuffer<Sample>,
    analysis: SampleBuffer<Sample>,
    recording: SampleBuffer<Sample>,
    recording_active: bool,
    dc_offset: f64,
    stats: ProducerStats,
}

impl AcquisitionBuffers {
    /// Creates empty buffers.
    pub fn new(capacities: BufferCapacities, dc_offset: f64) -> Self {
        Self {
            display: SampleBuffer::new(capacities.display),
            analysis: SampleBuffer::new(capacities.analysis),
            recording: SampleBuffer::new(capacities.recording),
            recording_active: false,
            dc_offset,
            stats: ProducerStats::default(),
        }
    }

    /// Appends one raw reading to every active buffer.
    pub fn ingest(&mut self, timestamp: f64, raw: f64) {
        let centered = Sample::new(timestamp, raw - self.dc_offset);
        self.display.push(centered);
        self.analysis.push(centered);
        if self.recording_active {
            self.recording.push(Sample::new(timestamp, raw));
        }
        self.stats.lines += 1;
        self.stats.samples += 1;
    }

    /// Counts a line that did not parse.
    pub fn note_dropped(&mut self) {
        self.stats.lines += 1;
        self.stats.dropped += 1;
    }

    /// Waveform history.
    pub fn display(&self) -> &SampleBuffer<Sample> {
        &self.display
    }

    /// Spectral analysis history.
    pub fn analysis(&self) -> &SampleBuffer<Sample> {
        &self.analysis
    }

    /// Samples captured by the current or last recording.
    pub fn recording(&self) -> &SampleBuffer<Sample> {
        &self.recording
    }

    /// True while new samples are being recorded.
    pub fn is_recording(&self) -> bool {
        self.recording_active
    }

    /// Clears the recording buffer and starts capturing.
    pub fn start_recording(&mut self) {
        self.recording.clear();
        self.recording_active = true;
    }

    /// Stops capturing and returns what was captured.
    ///
    /// The buffer keeps its contents until the next start.
    pub fn stop_recording(&mut self) -> Vec<Sample> {
        self.recording_active = false;
        self.recording.to_vec()
    }

    /// Offset subtracted from display and analysis values.
    pub fn dc_offset(&self) -> f64 {
        self.dc_offset
    }

    /// Producer counters.
    pub fn stats(&self) -> ProducerStats {
        self.stats
    }
}

/// Cloneable handle to the mutex-protected [`AcquisitionBuffers`].
#[derive(Debug, Clone)]
pub struct SharedBuffers(Arc<Mutex<AcquisitionBuffers>>);

impl SharedBuffers {
    /// Wraps freshly created buffers.
    pub fn new(capacities: BufferCapacities, dc_offset: f64) -> Self {
        Self(Arc::new(Mutex::new(AcquisitionBuffers::new(
            capacities, dc_offset,
        ))))
    }

    /// Locks the buffers.
    ///
    /// A panic on the other side of the lock leaves the buffers structurally
    /// valid, so poisoning is logged and ignored.
    pub fn lock(&self) -> MutexGuard<'_, AcquisitionBuffers> {
        self.0.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("acquisition buffer lock poisoned; recovering");
            poisoned.into_inner()
        })
    }
}

/// A running producer thread.
pub struct Acquisition {
    buffers: SharedBuffers,
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    source_name: String,
}

impl Acquisition {
    /// Starts reading `source` on a new thread.
    pub fn spawn<S, C>(source: S, clock: C, buffers: SharedBuffers) -> Result<Self>
    where
        S: SampleSource + Send + 'static,
        C: Clock + Send + 'static,
    {
        let source_name = source.describe();
        let stop = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let thread_buffers = buffers.clone();
        let thread_stop = Arc::clone(&stop);
        let thread_finished = Arc::clone(&finished);
        let handle = std::thread::Builder::new()
            .name("resoscope-acquisition".into())
            .spawn(move || {
                produce(source, clock, &thread_buffers, &thread_stop);
                thread_finished.store(true, Ordering::Release);
            })?;

        tracing::info!(source = %source_name, "acquisition started");
        Ok(Self {
            buffers,
            stop,
            finished,
            handle: Some(handle),
            source_name,
        })
    }

    /// The shared buffers this producer fills.
    pub fn buffers(&self) -> &SharedBuffers {
        &self.buffers
    }

    /// Description of the source being read.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// True once the producer has exited (end of stream, read error, or stop).
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Signals the producer and waits up to [`STOP_GRACE`] for it.
    ///
    /// The producer notices the flag after its current read returns. Serial
    /// reads time out, but a read on stdin or a pipe can block indefinitely;
    /// such a producer is detached and exits on its next line or at process
    /// end.
    pub fn stop(mut self) -> ProducerStats {
        self.stop.store(true, Ordering::Release);
        let deadline = Instant::now() + STOP_GRACE;
        while !self.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        if let Some(handle) = self.handle.take() {
            if self.is_finished() {
                if handle.join().is_err() {
                    tracing::warn!(source = %self.source_name, "acquisition thread panicked");
                }
            } else {
                tracing::warn!(
                    source = %self.source_name,
                    "producer still blocked in a read; detaching"
                );
            }
        }
        let stats = self.buffers.lock().stats();
        tracing::info!(
            source = %self.source_name,
            samples = stats.samples,
            dropped = stats.dropped,
            "acquisition stopped"
        );
        stats
    }
}

impl Drop for Acquisition {
    fn drop(&mut self) {
        // Never join here: a blocked read would hang the caller.
        self.stop.store(true, Ordering::Release);
    }
}

fn produce<S: SampleSource, C: Clock>(
    mut source: S,
    mut clock: C,
    buffers: &SharedBuffers,
    stop: &AtomicBool,
) {
    let mut line = String::new();
    while !stop.load(Ordering::Acquire) {
        line.clear();
        match source.read_line(&mut line) {
            Ok(0) => {
                tracing::info!(source = %source.describe(), "source reached end of stream");
                break;
            }
            Ok(_) => {
                if line.trim().is_empty() {
                    continue;
                }
                match parse_voltage(&line) {
                    Some(raw) => {
                        let t = clock.now();
                        buffers.lock().ingest(t, raw);
                    }
                    None => {
                        tracing::trace!(line = line.trim(), "dropping malformed line");
                        buffers.lock().note_dropped();
                    }
                }
            }
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::Interrupted
                        | std::io::ErrorKind::TimedOut
                        | std::io::ErrorKind::WouldBlock
                ) => {}
            Err(e) => {
                tracing::warn!(source = %source.describe(), error = %e, "read failed; stopping acquisition");
                break;
            }
        }
    }
}
