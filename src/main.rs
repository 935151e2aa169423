use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use acc_sensing_rs::detection::FallDetector;
use acc_sensing_rs::live_status::{self, LiveStatus};
use acc_sensing_rs::sensors::{self, AccelSample};
use acc_sensing_rs::session::Session;
use acc_sensing_rs::storage::SessionWriter;

#[derive(Parser, Debug)]
#[command(name = "acc_sensing")]
#[command(about = "Accelerometer fall sensing - smoothed history, raw-magnitude threshold", long_about = None)]
struct Args {
    /// Duration in seconds (0 = continuous)
    #[arg(value_name = "SECONDS", default_value = "0")]
    duration: u64,

    /// Record samples to a CSV session log
    #[arg(long)]
    record: bool,

    /// Use the synthetic waveform instead of termux-sensor
    #[arg(long)]
    mock: bool,

    /// Output directory
    #[arg(long, default_value = "acc_sensing_sessions")]
    output_dir: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!("[{}] Acc Sensing RS Starting", ts_now());
    println!("  Duration: {} seconds (0=continuous)", args.duration);
    println!("  Record: {}", args.record);
    println!("  Mock Sensor: {}", args.mock);
    println!("  Output Dir: {}", args.output_dir);

    std::fs::create_dir_all(&args.output_dir)?;

    let mut detector = FallDetector::new();
    let mut session = Session::new();

    let mut writer = if args.record {
        session.start_recording()?;
        let writer = SessionWriter::create(std::path::Path::new(&args.output_dir))?;
        println!("[{}] Recording to {}", ts_now(), writer.path().display());
        Some(writer)
    } else {
        None
    };

    // Sensor task feeds the channel; the main loop drains it.
    let (accel_tx, mut accel_rx) = mpsc::channel::<AccelSample>(500);
    let _accel_handle = tokio::spawn(sensors::accel_loop(accel_tx.clone(), args.mock));
    drop(accel_tx);

    let mut samples_processed = 0u64;
    let mut falls_detected = 0u64;
    let mut last_axes = (0.0, 0.0, 0.0);
    let mut last_magnitude = 0.0;
    let mut last_fall = false;
    let mut peak_magnitude = 0.0;

    let start = Utc::now();
    let mut last_status_update = Utc::now();

    println!("[{}] Starting data collection...", ts_now());

    loop {
        // Check if duration exceeded
        if args.duration > 0 {
            let elapsed = Utc::now().signed_duration_since(start);
            if elapsed.num_seconds() as u64 >= args.duration {
                println!("[{}] Duration reached, stopping...", ts_now());
                break;
            }
        }

        // Drain whatever the sensor task has queued
        while let Ok(sample) = accel_rx.try_recv() {
            let raw = sample.magnitude();
            let is_fall = detector.process_sample(sample.x, sample.y, sample.z);

            samples_processed += 1;
            last_axes = (sample.x, sample.y, sample.z);
            last_magnitude = raw;
            last_fall = is_fall;
            if raw > peak_magnitude {
                peak_magnitude = raw;
            }

            if is_fall {
                falls_detected += 1;
                println!(
                    "[{}] FALL DETECTED: |a| = {:.2} m/s² (fall #{})",
                    ts_now(),
                    raw,
                    falls_detected
                );
            }

            session.record_sample(raw, is_fall);
            if let Some(writer) = writer.as_mut() {
                writer.append(&sample)?;
            }
        }

        // Update live status every 2 seconds
        let now = Utc::now();
        if (now.signed_duration_since(last_status_update).num_seconds() as u64) >= 2 {
            let uptime = now.signed_duration_since(start).num_seconds().max(0) as u64;
            let meta = session.metadata();

            let mut status = LiveStatus::new();
            status.timestamp = live_status::current_timestamp();
            status.samples_processed = samples_processed;
            status.falls_detected = falls_detected;
            status.last_x = last_axes.0;
            status.last_y = last_axes.1;
            status.last_z = last_axes.2;
            status.last_magnitude = last_magnitude;
            status.last_smoothed = detector.last_smoothed().unwrap_or(0.0);
            status.last_fall = last_fall;
            status.peak_magnitude = peak_magnitude;
            status.warming_up = detector.is_warming_up();
            status.recording = session.is_recording();
            status.session_id = meta.session_id;
            status.uptime_seconds = uptime;

            let status_path = format!("{}/live_status.json", args.output_dir);
            let _ = status.save(&status_path);

            log::info!(
                "{} samples, {} falls, |a| = {:.2} m/s²",
                samples_processed,
                falls_detected,
                last_magnitude
            );
            last_status_update = now;
        }

        sleep(Duration::from_millis(1)).await;
    }

    if session.is_recording() {
        session.stop_recording()?;
        if let Some(writer) = writer.take() {
            println!(
                "[{}] Session log: {} rows in {}",
                ts_now(),
                writer.rows_written(),
                writer.path().display()
            );
        }

        // Metadata summary lands next to the session CSV.
        let meta = session.metadata();
        let summary_path = format!("{}/{}.json", args.output_dir, meta.session_id);
        std::fs::write(&summary_path, serde_json::to_string_pretty(&meta)?)?;
        println!("[{}] Session summary: {}", ts_now(), summary_path);
    }

    // Final live status update
    let uptime = Utc::now().signed_duration_since(start).num_seconds().max(0) as u64;
    let mut final_status = LiveStatus::new();
    final_status.timestamp = live_status::current_timestamp();
    final_status.samples_processed = samples_processed;
    final_status.falls_detected = falls_detected;
    final_status.last_x = last_axes.0;
    final_status.last_y = last_axes.1;
    final_status.last_z = last_axes.2;
    final_status.last_magnitude = last_magnitude;
    final_status.last_smoothed = detector.last_smoothed().unwrap_or(0.0);
    final_status.last_fall = last_fall;
    final_status.peak_magnitude = peak_magnitude;
    final_status.warming_up = detector.is_warming_up();
    final_status.recording = false;
    final_status.session_id = session.metadata().session_id;
    final_status.uptime_seconds = uptime;
    let status_path = format!("{}/live_status_final.json", args.output_dir);
    let _ = final_status.save(&status_path);

    // Print stats
    println!("\n=== Final Stats ===");
    println!("Total samples: {}", samples_processed);
    println!("Falls detected: {}", falls_detected);
    println!("Peak magnitude: {:.2} m/s²", peak_magnitude);

    Ok(())
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}
