//! Two-column CSV recordings.
//!
//! Files are `timestamp, voltage` rows, comma-delimited. Exports always carry
//! the [`RECORDING_HEADER`]; imports accept files with or without it.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use resoscope_analysis::SpectrumResult;
use resoscope_core::Sample;

use crate::{Error, Result};

/// Header row written at the top of every exported recording.
pub const RECORDING_HEADER: &str = "Timestamp (s), Voltage (V)";

/// Reads a recording from disk.
pub fn read_recording<P: AsRef<Path>>(path: P) -> Result<Vec<Sample>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let samples = parse_recording(BufReader::new(file))?;
    tracing::debug!(path = %path.display(), rows = samples.len(), "loaded recording");
    Ok(samples)
}

/// Parses recording rows from any reader.
///
/// A first row that does not parse as two numbers is taken as a header and
/// skipped. Blank lines are ignored. Any other unparseable row is an error
/// naming its 1-based line number, as is a file with fewer than two rows.
pub fn parse_recording<R: BufRead>(reader: R) -> Result<Vec<Sample>> {
    let mut samples = Vec::new();
    let mut seen_row = false;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_row(trimmed) {
            Ok(sample) => samples.push(sample),
            Err(_) if !seen_row => {
                tracing::trace!(line = line_no, "skipping header row");
            }
            Err(reason) => return Err(Error::file_format(line_no, reason)),
        }
        seen_row = true;
    }

    if samples.len() < 2 {
        return Err(Error::file_format(
            0,
            format!("need at least 2 data rows, found {}", samples.len()),
        ));
    }
    Ok(samples)
}

fn parse_row(row: &str) -> std::result::Result<Sample, String> {
    let mut fields = row.split(',').map(str::trim);
    let (Some(t), Some(v)) = (fields.next(), fields.next()) else {
        return Err(format!("expected 2 columns in '{row}'"));
    };
    let timestamp = parse_field(t, "timestamp")?;
    let value = parse_field(v, "voltage")?;
    Ok(Sample::new(timestamp, value))
}

fn parse_field(field: &str, what: &str) -> std::result::Result<f64, String> {
    match field.parse::<f64>() {
        Ok(x) if x.is_finite() => Ok(x),
        _ => Err(format!("invalid {what} '{field}'")),
    }
}

/// Writes a recording to disk, creating or truncating the file.
pub fn write_recording<P: AsRef<Path>>(path: P, samples: &[Sample]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_recording_to(&mut writer, samples)?;
    writer.flush()?;
    tracing::info!(path = %path.display(), rows = samples.len(), "recording saved");
    Ok(())
}

/// Writes the header and one row per sample.
///
/// Values use the shortest representation that parses back exactly.
pub fn write_recording_to<W: Write>(writer: &mut W, samples: &[Sample]) -> Result<()> {
    writeln!(writer, "{RECORDING_HEADER}")?;
    for s in samples {
        writeln!(writer, "{},{}", s.timestamp, s.value)?;
    }
    Ok(())
}

/// Writes the inspected range of a spectrum as `frequency_hz,magnitude`.
pub fn write_spectrum<P: AsRef<Path>>(path: P, spectrum: &SpectrumResult) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "frequency_hz,magnitude")?;
    for (f, m) in spectrum.bins() {
        writeln!(writer, "{f},{m}")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<Vec<Sample>> {
        parse_recording(Cursor::new(text))
    }

    #[test]
    fn header_is_optional() {
        let with = parse("Timestamp (s), Voltage (V)\n0.0,2.2\n0.001,2.3\n").unwrap();
        let without = parse("0.0,2.2\n0.001,2.3\n").unwrap();
        assert_eq!(with, without);
        assert_eq!(with[1], Sample::new(0.001, 2.3));
    }

    #[test]
    fn blank_lines_and_spaces_ignored() {
        let samples = parse("\n 0.0 , 1.0 \n\n0.5,1.5\r\n\n").unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1], Sample::new(0.5, 1.5));
    }

    #[test]
    fn extra_columns_ignored() {
        let samples = parse("0.0,1.0,x\n1.0,2.0,y\n").unwrap();
        assert_eq!(samples[0], Sample::new(0.0, 1.0));
    }

    #[test]
    fn bad_row_reports_line_number() {
        let err = parse("t,v\n0.0,1.0\n0.1,oops\n0.2,1.0\n").unwrap_err();
        match err {
            Error::FileFormat { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("oops"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn only_the_first_row_may_be_a_header() {
        let err = parse("t,v\nstill,header\n0.0,1.0\n").unwrap_err();
        assert!(matches!(err, Error::FileFormat { line: 2, .. }));
    }

    #[test]
    fn single_column_is_an_error() {
        let err = parse("0.0,1.0\n0.5\n").unwrap_err();
        assert!(matches!(err, Error::FileFormat { line: 2, .. }));
    }

    #[test]
    fn too_few_rows() {
        assert!(matches!(parse(""), Err(Error::FileFormat { line: 0, .. })));
        assert!(matches!(
            parse("Timestamp (s), Voltage (V)\n1.0,2.0\n"),
            Err(Error::FileFormat { line: 0, .. })
        ));
    }

    #[test]
    fn export_starts_with_header() {
        let mut out = Vec::new();
        write_recording_to(&mut out, &[Sample::new(0.0, 2.25), Sample::new(0.001, 2.5)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Timestamp (s), Voltage (V)\n0,2.25\n0.001,2.5\n");
    }
}
