use serde::{Deserialize, Serialize};
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

/// Snapshot written to `live_status.json` every couple of seconds so other
/// tools can watch a run without attaching to the process.
#[derive(Serialize, Deserialize, Clone)]
pub struct LiveStatus {
    pub timestamp: f64,
    pub samples_processed: u64,
    pub falls_detected: u64,
    // Latest sample
    pub last_x: f64,
    pub last_y: f64,
    pub last_z: f64,
    pub last_magnitude: f64,
    pub last_smoothed: f64,
    pub last_fall: bool,
    pub peak_magnitude: f64,
    pub warming_up: bool,
    pub recording: bool,
    pub session_id: String,
    pub uptime_seconds: u64,
}

impl LiveStatus {
    pub fn new() -> Self {
        Self {
            timestamp: current_timestamp(),
            samples_processed: 0,
            falls_detected: 0,
            last_x: 0.0,
            last_y: 0.0,
            last_z: 0.0,
            last_magnitude: 0.0,
            last_smoothed: 0.0,
            last_fall: false,
            peak_magnitude: 0.0,
            warming_up: true,
            recording: false,
            session_id: String::new(),
            uptime_seconds: 0,
        }
    }

    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for LiveStatus {
    fn default() -> Self {
        Self::new()
    }
}

pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_save_writes_parseable_json() {
        let dir = env::temp_dir().join("acc_sensing_status_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("live_status.json");

        let mut status = LiveStatus::new();
        status.samples_processed = 250;
        status.falls_detected = 1;
        status.last_x = 0.3;
        status.last_y = -0.1;
        status.last_z = 9.6;
        status.last_magnitude = 9.6;
        status.last_fall = true;
        status.warming_up = false;
        status.save(path.to_str().unwrap()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let parsed: LiveStatus = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.samples_processed, 250);
        assert_eq!(parsed.falls_detected, 1);
        assert_eq!(parsed.last_x, 0.3);
        assert_eq!(parsed.last_y, -0.1);
        assert_eq!(parsed.last_z, 9.6);
        assert!(parsed.last_fall);
        assert!(!parsed.warming_up);

        // Cleanup
        fs::remove_dir_all(&dir).unwrap();
    }
}
