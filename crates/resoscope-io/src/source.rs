//! Line-oriented sample sources.
//!
//! The sensor firmware prints one voltage per line. Anything that yields
//! lines (a serial device node, stdin, a byte slice in a test) becomes a
//! [`SampleSource`] through [`LineSource`].

use std::io::{self, BufRead};

/// A blocking stream of text lines from the sensor.
pub trait SampleSource {
    /// Appends the next line to `buf`, returning the number of bytes read.
    ///
    /// Returns `Ok(0)` at end of stream.
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize>;

    /// Human-readable origin, used in logs and status messages.
    fn describe(&self) -> String;
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        (**self).read_line(buf)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Adapts any [`BufRead`] into a [`SampleSource`].
///
/// Invalid UTF-8 is replaced rather than treated as an error, so a glitch on
/// the wire costs one malformed line instead of the whole stream.
pub struct LineSource<R> {
    reader: R,
    name: String,
    bytes: Vec<u8>,
}

impl<R: BufRead> LineSource<R> {
    /// Wraps `reader`, labelling it `name`.
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            name: name.into(),
            bytes: Vec::with_capacity(32),
        }
    }

    /// Unwraps the inner reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R> std::fmt::Debug for LineSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSource")
            .field("name", &self.name)
            .field("pending", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

impl<R: BufRead> SampleSource for LineSource<R> {
    /// A read that fails part-way (e.g. a serial timeout) keeps the bytes
    /// already received; the next call continues the same line.
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        self.reader.read_until(b'\n', &mut self.bytes)?;
        let n = self.bytes.len();
        buf.push_str(&String::from_utf8_lossy(&self.bytes));
        self.bytes.clear();
        Ok(n)
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Parses one device line into a voltage.
///
/// Surrounding whitespace (including `\r`) is ignored. Returns `None` for
/// empty, non-numeric, or non-finite lines.
pub fn parse_voltage(line: &str) -> Option<f64> {
    line.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
