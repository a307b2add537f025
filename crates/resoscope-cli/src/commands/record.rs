//! Record the raw sensor stream to CSV.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use resoscope_io::{MonitorSession, write_recording};

use super::common::{
    SourceArgs, load_config, monitor_settings, open_source, recording_path, secs,
};

#[derive(Args)]
pub struct RecordArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Recording length in seconds (default from config)
    #[arg(short, long, value_name = "SECS")]
    duration: Option<f64>,

    /// Output CSV file (default: timestamped file in the recordings directory)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: RecordArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let duration = secs(
        args.duration
            .unwrap_or(config.recording.default_duration_secs),
        "recording time",
    )?;
    let path = recording_path(args.output, &config.recording)?;

    let mut session = MonitorSession::new(monitor_settings(&config)?);
    let control = session.control();
    let stop = control.clone();
    ctrlc::set_handler(move || stop.stop())?;

    session.connect(|| open_source(&args.source, &config.acquisition))?;
    session.start_recording(Some(duration))?;
    let started = Instant::now();

    let total_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    let pb = ProgressBar::new(total_ms);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    let reason = loop {
        if session.recording_due() {
            break "done";
        }
        if control.is_stopped() {
            break "interrupted";
        }
        if session.source_finished() {
            break "source ended";
        }
        let elapsed = started.elapsed();
        pb.set_position(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        if let Some(buffers) = session.buffers() {
            let count = buffers.lock().recording().len();
            pb.set_message(format!("{count} samples"));
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    pb.finish_and_clear();

    let recording = session.stop_recording()?.unwrap_or_default();
    let stats = session.disconnect()?;
    tracing::debug!(reason, dropped = stats.dropped, "recording loop finished");

    if recording.is_empty() {
        anyhow::bail!("No samples captured ({reason})");
    }
    write_recording(&path, &recording.samples)?;
    println!(
        "Recorded {} samples ({:.1}s, {reason}) to {}",
        recording.len(),
        recording.duration_secs(),
        path.display()
    );
    if stats.dropped > 0 {
        println!("{} malformed line(s) skipped", stats.dropped);
    }
    Ok(())
}
