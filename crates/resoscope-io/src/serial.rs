//! Serial port discovery and opening.
//!
//! The sensor enumerates as a USB serial adapter. Ports come from
//! [`serialport::available_ports`]; the first one whose USB product,
//! manufacturer, or description mentions a configured keyword is selected.

use std::io::BufReader;
use std::time::Duration;

use serialport::{SerialPort, SerialPortInfo, SerialPortType};

use crate::source::LineSource;
use crate::{Error, Result};

/// How long a read waits before the producer re-checks its stop flag.
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// An opened serial port yielding lines.
pub type SerialSource = LineSource<BufReader<Box<dyn SerialPort>>>;

/// A candidate serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Name to open, e.g. `/dev/ttyUSB0` or `COM3`.
    pub path: String,
    /// One-line summary for listings.
    pub description: String,
    /// USB manufacturer string.
    pub manufacturer: Option<String>,
    /// USB product string, e.g. `CP2102 USB to UART Bridge Controller`.
    pub product: Option<String>,
    /// USB vendor and product IDs.
    pub usb_id: Option<(u16, u16)>,
}

impl PortInfo {
    /// A port with nothing known beyond its name and kind.
    pub fn plain(path: impl Into<String>, kind: &str) -> Self {
        Self {
            path: path.into(),
            description: kind.to_owned(),
            manufacturer: None,
            product: None,
            usb_id: None,
        }
    }

    /// A USB adapter port.
    pub fn usb(
        path: impl Into<String>,
        vid: u16,
        pid: u16,
        manufacturer: Option<String>,
        product: Option<String>,
    ) -> Self {
        let description = match (&manufacturer, &product) {
            (Some(m), Some(p)) if !p.contains(m.as_str()) => format!("{p} ({m})"),
            (_, Some(p)) => p.clone(),
            (Some(m), None) => format!("{m} USB serial"),
            (None, None) => format!("USB serial {vid:04x}:{pid:04x}"),
        };
        Self {
            path: path.into(),
            description,
            manufacturer,
            product,
            usb_id: Some((vid, pid)),
        }
    }

    /// True if any keyword occurs in the product, manufacturer, or
    /// description (case-insensitive).
    pub fn matches<S: AsRef<str>>(&self, keywords: &[S]) -> bool {
        let haystacks: Vec<String> = [
            Some(self.description.as_str()),
            self.product.as_deref(),
            self.manufacturer.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .collect();
        keywords.iter().any(|k| {
            let k = k.as_ref().to_lowercase();
            !k.is_empty() && haystacks.iter().any(|h| h.contains(&k))
        })
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => {
                Self::usb(info.port_name, usb.vid, usb.pid, usb.manufacturer, usb.product)
            }
            SerialPortType::PciPort => Self::plain(info.port_name, "PCI serial"),
            SerialPortType::BluetoothPort => Self::plain(info.port_name, "Bluetooth serial"),
            SerialPortType::Unknown => Self::plain(info.port_name, "serial port"),
        }
    }
}

/// Lists serial ports, sorted by path.
///
/// Enumeration failures are logged and yield an empty list.
pub fn list_ports() -> Vec<PortInfo> {
    let mut ports: Vec<PortInfo> = match serialport::available_ports() {
        Ok(found) => found.into_iter().map(PortInfo::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "serial port enumeration failed");
            Vec::new()
        }
    };
    ports.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(count = ports.len(), "enumerated serial ports");
    ports
}

/// Picks the first port matching any keyword.
pub fn select_port<'a, S: AsRef<str>>(ports: &'a [PortInfo], keywords: &[S]) -> Option<&'a PortInfo> {
    ports.iter().find(|p| p.matches(keywords))
}

/// Enumerates ports and selects the sensor.
pub fn find_port<S: AsRef<str>>(keywords: &[S]) -> Result<PortInfo> {
    let ports = list_ports();
    select_port(&ports, keywords).cloned().ok_or_else(|| {
        let wanted: Vec<&str> = keywords.iter().map(AsRef::as_ref).collect();
        Error::DeviceNotFound(format!(
            "no serial port matching [{}] among {} candidate(s)",
            wanted.join(", "),
            ports.len()
        ))
    })
}

/// Opens a serial port as a line source.
///
/// Reads time out after [`READ_TIMEOUT`] so a silent device never blocks
/// shutdown.
pub fn open_serial(path: &str, baud_rate: u32) -> Result<SerialSource> {
    #[cfg(unix)]
    if !std::path::Path::new(path).exists() {
        return Err(Error::DeviceNotFound(path.to_owned()));
    }
    let port = serialport::new(path, baud_rate)
        .timeout(READ_TIMEOUT)
        .open()
        .map_err(|e| open_error(path, e))?;
    tracing::info!(port = path, baud_rate, "serial port opened");
    Ok(LineSource::new(BufReader::new(port), path))
}

fn open_error(path: &str, e: serialport::Error) -> Error {
    match e.kind() {
        serialport::ErrorKind::NoDevice
        | serialport::ErrorKind::Io(std::io::ErrorKind::NotFound) => {
            Error::DeviceNotFound(format!("{path}: {e}"))
        }
        _ => Error::Serial(e),
    }
}
