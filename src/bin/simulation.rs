//! Synthetic capture run for exercising the full pipeline without
//! hardware: arm, sample a generated signal, analyze, persist, and print
//! the store state (optionally the bulk export).
//!
//! # Usage
//! ```bash
//! ./simulation --captures 3 --freq-hz 20 --export
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vibrelog::{CaptureConfig, CaptureState, Session, SimulatedRtc, SyntheticSource};

#[derive(Parser, Debug)]
#[command(name = "vibrelog-simulation")]
#[command(about = "Synthetic vibration capture run")]
#[command(version = "1.0")]
struct Args {
    /// Number of captures to run
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=100))]
    captures: u32,

    /// Tone frequency applied to all axes (Hz)
    #[arg(long, default_value = "20.0")]
    freq_hz: f64,

    /// Tone amplitude (g)
    #[arg(long, default_value = "1.0")]
    amplitude: f64,

    /// Storage directory for the record ring
    #[arg(long, default_value = "./data/records")]
    data_dir: std::path::PathBuf,

    /// Print the bulk export after the run
    #[arg(long)]
    export: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut config = CaptureConfig::default();
    config.storage.data_dir = args.data_dir.clone();
    config.validate().context("invalid configuration")?;

    // Nominal rate matching the default 5 ms minimum interval.
    let source = SyntheticSource::sine(args.amplitude, args.freq_hz, 200.0);
    let clock = SimulatedRtc::new(chrono::Utc::now().naive_utc());
    let mut session = Session::new(&config, source, clock).context("session startup failed")?;

    let mut now_us: u64 = 0;
    for capture in 0..args.captures {
        session.request_capture()?;
        loop {
            let state = session.tick(now_us)?;
            now_us += 1000;
            if state == CaptureState::Idle {
                break;
            }
        }

        if let Some(view) = session.current() {
            println!(
                "capture {}: Fs {:.2} Hz, peaks [{:.2}, {:.2}, {:.2}] Hz, {} spectrogram segments",
                capture,
                view.record.sampling_hz,
                view.record.peak_hz[0],
                view.record.peak_hz[1],
                view.record.peak_hz[2],
                view.spectrogram.segment_count()
            );
        }
    }

    let stats = session.store_stats();
    println!(
        "store: {}/{} records, {}/{} bytes",
        stats.count, stats.capacity, stats.used_bytes, stats.total_bytes
    );

    if args.export {
        print!("{}", session.export_all()?);
    }

    Ok(())
}
