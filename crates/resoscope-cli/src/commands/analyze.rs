//! Offline analysis of a recorded CSV file.

use std::path::{Path, PathBuf};

use clap::Args;
use resoscope_analysis::{BatchAnalyzer, find_peaks};
use resoscope_io::{read_recording, write_spectrum};

use super::common::{batch_settings, load_config};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Recording to analyze (timestamp,voltage rows)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Write the inspected spectrum to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show the top N spectral peaks
    #[arg(long, default_value = "3")]
    peaks: usize,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: AnalyzeArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let samples = read_recording(&args.input)?;
    let mut analyzer = BatchAnalyzer::new(batch_settings(&config.batch));
    let report = analyzer.analyze(&samples)?;
    let peaks = find_peaks(&report.spectrum, args.peaks);

    if let Some(path) = &args.output {
        write_spectrum(path, &report.spectrum)?;
        tracing::info!(path = %path.display(), bins = report.spectrum.frequencies.len(), "spectrum written");
    }

    if args.json {
        let peaks: Vec<_> = peaks
            .iter()
            .map(|&(f, m)| serde_json::json!({ "frequency_hz": f, "magnitude": m }))
            .collect();
        let value = serde_json::json!({
            "file": args.input.display().to_string(),
            "total_samples": report.total_samples,
            "trimmed_per_end": report.trimmed_per_end,
            "analyzed_samples": report.filtered_signal.len(),
            "sampling_rate_hz": report.sampling_rate,
            "resolution_hz": report.spectrum.resolution_hz,
            "peak_frequency_hz": report.peak_frequency,
            "peak_magnitude": report.peak_magnitude,
            "peaks": peaks,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Recording: {}", args.input.display());
    println!(
        "  Samples:       {} ({} trimmed from each end)",
        report.total_samples, report.trimmed_per_end
    );
    println!("  Sampling rate: {:.2} Hz", report.sampling_rate);
    println!(
        "  Resolution:    {:.4} Hz over {:.2}-{:.2} Hz",
        report.spectrum.resolution_hz,
        report.spectrum.frequencies.first().copied().unwrap_or_default(),
        report.spectrum.frequencies.last().copied().unwrap_or_default(),
    );
    println!();
    println!(
        "Resonant peak: {:.3} Hz (magnitude {:.2})",
        report.peak_frequency, report.peak_magnitude
    );

    if peaks.len() > 1 {
        println!();
        println!("Top {} peaks:", peaks.len());
        println!("  {:>3}  {:>10}  {:>12}", "#", "Freq (Hz)", "Magnitude");
        for (i, (freq, mag)) in peaks.iter().enumerate() {
            println!("  {:>3}  {:>10.3}  {:>12.2}", i + 1, freq, mag);
        }
    }

    Ok(())
}
