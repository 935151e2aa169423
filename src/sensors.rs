use serde::{Deserialize, Serialize};
use std::process::Command;
use tokio::sync::mpsc::Sender;
use tokio::time::{interval, Duration};

/// One 3-axis linear acceleration reading in m/s², gravity already removed,
/// so a device at rest sits near zero on all axes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccelSample {
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AccelSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        AccelSample {
            timestamp: current_timestamp(),
            x,
            y,
            z,
        }
    }

    /// Euclidean norm of the three axes.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Samples the accelerometer at ~50Hz and pushes readings into `tx`.
///
/// Reads through termux-sensor when available; otherwise (or when
/// `force_mock` is set) synthesizes a resting-device waveform with a
/// periodic spike so the detection path still gets exercised.
pub async fn accel_loop(tx: Sender<AccelSample>, force_mock: bool) {
    let mut interval = interval(Duration::from_millis(20)); // ~50Hz sampling
    let mut sample_count = 0u64;

    loop {
        interval.tick().await;

        let sample = if force_mock {
            mock_accel_data()
        } else {
            match read_accelerometer() {
                Some(data) => data,
                None => mock_accel_data(),
            }
        };

        match tx.try_send(sample) {
            Ok(_) => {
                sample_count += 1;
                if sample_count % 100 == 0 {
                    log::debug!("[accel] {} samples", sample_count);
                }
            }
            Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => {
                log::info!("[accel] Channel closed after {} samples", sample_count);
                break;
            }
            Err(tokio::sync::mpsc::error::TrySendError::Full(_)) => {
                // Channel full, drop this sample
            }
        }
    }
}

fn read_accelerometer() -> Option<AccelSample> {
    // Try to read from termux-sensor
    // Format: Linear Acceleration event: x=X, y=Y, z=Z, accuracy=0, timestamp=TS
    match Command::new("termux-sensor")
        .arg("-n")
        .arg("1")
        .arg("-s")
        .arg("linear_acceleration")
        .output()
    {
        Ok(output) => {
            let text = String::from_utf8_lossy(&output.stdout);
            parse_accel_output(&text)
        }
        Err(_) => None,
    }
}

fn parse_accel_output(output: &str) -> Option<AccelSample> {
    let timestamp = current_timestamp();

    // Example: "Linear Acceleration event: x=0.02, y=-0.11, z=0.05, accuracy=0, timestamp=1234567890"
    let mut x = 0.0;
    let mut y = 0.0;
    let mut z = 0.0;
    let mut matched = false;

    for part in output.split(',') {
        // Keep only the key=value token; the first segment carries the
        // event prefix in front of it.
        let token = part.rsplit(' ').next().unwrap_or(part).trim();

        if let Some(val_str) = token.strip_prefix("x=") {
            x = val_str.parse().ok()?;
            matched = true;
        } else if let Some(val_str) = token.strip_prefix("y=") {
            y = val_str.parse().ok()?;
            matched = true;
        } else if let Some(val_str) = token.strip_prefix("z=") {
            z = val_str.parse().ok()?;
            matched = true;
        }
    }

    if !matched {
        return None;
    }

    Some(AccelSample { timestamp, x, y, z })
}

fn mock_accel_data() -> AccelSample {
    use std::f64::consts::PI;
    static COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
    let seq = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let t = seq as f64 * 0.02;

    // Resting jitter near zero, with a hard spike every ten seconds so a
    // fall shows up without shaking a real device.
    if seq % 500 == 499 {
        AccelSample {
            timestamp: current_timestamp(),
            x: 12.0,
            y: 3.0,
            z: 2.0,
        }
    } else {
        AccelSample {
            timestamp: current_timestamp(),
            x: (t * 2.0 * PI).sin() * 0.4,
            y: (t * 2.0 * PI).cos() * 0.3,
            z: (t * PI).sin() * 0.2,
        }
    }
}

fn current_timestamp() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
