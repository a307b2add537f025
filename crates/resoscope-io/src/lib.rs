//! Sensor I/O layer for resoscope.
//!
//! This crate provides:
//!
//! - **Device ingestion**: [`SampleSource`] over any line-oriented reader, with
//!   serial port discovery and opening ([`list_ports`], [`find_port`],
//!   [`open_serial`]) and timestamping
//!   through a [`Clock`]
//! - **Acquisition**: a producer thread filling shared display, analysis and
//!   recording buffers ([`Acquisition`])
//! - **Recordings**: two-column CSV import and export ([`read_recording`],
//!   [`write_recording`])
//! - **Live monitoring**: the [`MonitorSession`] state machine that calibrates,
//!   filters, and reports to a [`MonitorObserver`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resoscope_io::{MonitorObserver, MonitorSession, MonitorSettings, open_serial, find_port};
//!
//! struct Print;
//! impl MonitorObserver for Print {
//!     fn on_analysis(&mut self, report: &resoscope_io::AnalysisReport) {
//!         println!("peak {:.3} Hz", report.peak_frequency);
//!     }
//! }
//!
//! let mut session = MonitorSession::new(MonitorSettings::default());
//! session.connect(|| {
//!     let port = find_port(&["CP210"])?;
//!     Ok(Box::new(open_serial(&port.path, 115_200)?))
//! })?;
//! session.calibrate()?;
//! session.run(&mut Print)?;
//! # Ok::<(), resoscope_io::Error>(())
//! ```

mod acquisition;
mod clock;
mod csv;
mod monitor;
mod serial;
mod source;

pub use acquisition::{
    Acquisition, AcquisitionBuffers, BufferCapacities, ProducerStats, STOP_GRACE, SharedBuffers,
};
pub use clock::{Clock, FixedRateClock, SystemClock};
pub use csv::{
    RECORDING_HEADER, parse_recording, read_recording, write_recording, write_recording_to,
    write_spectrum,
};
pub use monitor::{
    AnalysisReport, CalibrationReport, ControlHandle, ControlRequest, MonitorObserver,
    MonitorSession, MonitorSettings, Recording, SessionState, WaveformFrame,
};
pub use serial::{PortInfo, READ_TIMEOUT, SerialSource, find_port, list_ports, open_serial, select_port};
pub use source::{LineSource, SampleSource, parse_voltage};

use resoscope_analysis::AnalysisError;

/// Error types for sensor I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No serial port matched, or a named device does not exist.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// A recording file could not be parsed.
    #[error("Malformed recording at line {line}: {reason}")]
    FileFormat {
        /// 1-based line number, or 0 for whole-file problems.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// The session is not in a state that allows the operation.
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        /// Operation that was attempted.
        operation: &'static str,
        /// State the session was in.
        state: SessionState,
    },

    /// The sampling rate could not be estimated after the settling period.
    #[error("Calibration failed: {0}")]
    Calibration(#[source] AnalysisError),

    /// Filter design or spectral analysis error.
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// The serial port could not be opened or configured.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for sensor I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn file_format(line: usize, reason: impl Into<String>) -> Self {
        Error::FileFormat {
            line,
            reason: reason.into(),
        }
    }
}
