use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::json;

use acc_sensing_rs::detection::FallDetector;
use acc_sensing_rs::storage;

#[derive(Parser, Debug)]
struct Args {
    /// Path to a recorded session CSV
    #[arg(long, conflicts_with = "session_dir")]
    log: Option<PathBuf>,

    /// Directory of session CSVs to batch replay
    #[arg(long)]
    session_dir: Option<PathBuf>,
}

fn run_once(path: &Path) -> anyhow::Result<serde_json::Value> {
    let log = storage::read_session(path)?;
    let mut detector = FallDetector::new();

    let mut falls = 0u64;
    let mut fall_times_ms = Vec::new();
    let mut peak_magnitude: f64 = 0.0;

    for sample in &log.samples {
        let raw = (sample.x * sample.x + sample.y * sample.y + sample.z * sample.z).sqrt();
        if raw > peak_magnitude {
            peak_magnitude = raw;
        }
        // Decisions are re-derived from the axis values; the log never
        // stores them.
        if detector.process_sample(sample.x, sample.y, sample.z) {
            falls += 1;
            fall_times_ms.push(sample.elapsed_ms);
            println!(
                "[FALL] t={}ms |a| = {:.2} m/s² (fall #{})",
                sample.elapsed_ms, raw, falls
            );
        }
    }

    Ok(json!({
        "log": path.display().to_string(),
        "base_time_ms": log.base_time_ms,
        "samples": log.samples.len(),
        "falls": falls,
        "fall_times_ms": fall_times_ms,
        "peak_magnitude": peak_magnitude,
        "final_smoothed": detector.last_smoothed(),
        "history_len": detector.history_len(),
    }))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut results = Vec::new();

    if let Some(dir) = args.session_dir.as_ref() {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !name.ends_with(".csv") {
                continue;
            }
            match run_once(&path) {
                Ok(res) => results.push(res),
                Err(e) => eprintln!("Failed {}: {}", path.display(), e),
            }
        }
    } else if let Some(log) = args.log.as_ref() {
        results.push(run_once(log)?);
    } else {
        anyhow::bail!("Provide --log or --session-dir");
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
