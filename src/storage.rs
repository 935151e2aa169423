use crate::error::{AccSensingError, SensingResult};
use crate::sensors::AccelSample;
use chrono::{Local, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes one session's samples to a CSV log.
///
/// Layout matches the phone recordings: the first row carries the base
/// wall-clock time in epoch milliseconds followed by the axis labels, and
/// every later row is the elapsed milliseconds since that base plus the
/// three axis values. Fall decisions are not persisted; replay re-derives
/// them from the axis values.
pub struct SessionWriter {
    writer: csv::Writer<fs::File>,
    path: PathBuf,
    base_time_ms: i64,
    rows_written: u64,
}

impl SessionWriter {
    /// Open a new log under `output_dir`, named from the local wall clock,
    /// and write the base-time header row.
    pub fn create(output_dir: &Path) -> SensingResult<Self> {
        fs::create_dir_all(output_dir)?;

        let filename = format!("{}.csv", Local::now().format("%Y-%m-%d-%H-%M-%S"));
        let path = output_dir.join(filename);
        let base_time_ms = Utc::now().timestamp_millis();

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(&[
            base_time_ms.to_string(),
            "x".to_string(),
            "y".to_string(),
            "z".to_string(),
        ])?;
        writer.flush()?;

        Ok(SessionWriter {
            writer,
            path,
            base_time_ms,
            rows_written: 0,
        })
    }

    /// Append one sample, stamped relative to the base time. Flushes per
    /// row, so a killed process loses at most the row in flight.
    pub fn append(&mut self, sample: &AccelSample) -> SensingResult<()> {
        let elapsed_ms = (sample.timestamp * 1000.0).round() as i64 - self.base_time_ms;
        self.writer.write_record(&[
            elapsed_ms.to_string(),
            sample.x.to_string(),
            sample.y.to_string(),
            sample.z.to_string(),
        ])?;
        self.writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_time_ms(&self) -> i64 {
        self.base_time_ms
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

/// One row read back from a session log.
#[derive(Debug, Clone)]
pub struct LoggedSample {
    pub elapsed_ms: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A recorded session read back from disk.
#[derive(Debug, Clone)]
pub struct SessionLog {
    pub base_time_ms: i64,
    pub samples: Vec<LoggedSample>,
}

/// Read a session log back into memory.
pub fn read_session(path: &Path) -> SensingResult<SessionLog> {
    // The first row is base time + axis labels, not a real CSV header.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut base_time_ms = 0i64;
    let mut saw_header = false;
    let mut samples = Vec::new();

    for (idx, record) in reader.records().enumerate() {
        let record = record?;

        if idx == 0 {
            // Refuse to treat a data row as the header.
            if record.get(1) != Some("x")
                || record.get(2) != Some("y")
                || record.get(3) != Some("z")
            {
                return Err(AccSensingError::MalformedLog(
                    "missing header row".to_string(),
                ));
            }
            let field = record.get(0).unwrap_or("");
            base_time_ms = field.parse().map_err(|_| {
                AccSensingError::MalformedLog(format!("bad base time {:?}", field))
            })?;
            saw_header = true;
            continue;
        }

        if record.len() < 4 {
            return Err(AccSensingError::MalformedLog(format!(
                "row {} has {} fields, expected 4",
                idx,
                record.len()
            )));
        }

        let number = |i: usize| -> SensingResult<f64> {
            let field = record.get(i).unwrap_or("");
            field.parse().map_err(|_| {
                AccSensingError::MalformedLog(format!("row {}: bad number {:?}", idx, field))
            })
        };

        let elapsed_field = record.get(0).unwrap_or("");
        let elapsed_ms = elapsed_field.parse().map_err(|_| {
            AccSensingError::MalformedLog(format!(
                "row {}: bad elapsed time {:?}",
                idx, elapsed_field
            ))
        })?;

        samples.push(LoggedSample {
            elapsed_ms,
            x: number(1)?,
            y: number(2)?,
            z: number(3)?,
        });
    }

    if !saw_header {
        return Err(AccSensingError::MalformedLog("empty log file".to_string()));
    }

    Ok(SessionLog {
        base_time_ms,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::env;

    #[test]
    fn test_write_read_roundtrip() {
        let dir = env::temp_dir().join("acc_sensing_roundtrip_test");
        fs::create_dir_all(&dir).unwrap();

        let mut writer = SessionWriter::create(&dir).unwrap();
        let base = writer.base_time_ms();

        // Timestamps built from the base so elapsed values are exact.
        let first = AccelSample {
            timestamp: (base + 20) as f64 / 1000.0,
            x: 0.5,
            y: -0.25,
            z: 9.75,
        };
        let second = AccelSample {
            timestamp: (base + 40) as f64 / 1000.0,
            x: 3.0,
            y: 4.0,
            z: 0.0,
        };
        writer.append(&first).unwrap();
        writer.append(&second).unwrap();
        assert_eq!(writer.rows_written(), 2);

        let log = read_session(writer.path()).unwrap();
        assert_eq!(log.base_time_ms, base);
        assert_eq!(log.samples.len(), 2);
        assert_eq!(log.samples[0].elapsed_ms, 20);
        assert_eq!(log.samples[1].elapsed_ms, 40);
        assert_abs_diff_eq!(log.samples[0].x, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(log.samples[0].y, -0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(log.samples[1].z, 0.0, epsilon = 1e-12);

        // Cleanup
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_header_row_carries_base_time_and_labels() {
        let dir = env::temp_dir().join("acc_sensing_header_test");
        fs::create_dir_all(&dir).unwrap();

        let writer = SessionWriter::create(&dir).unwrap();
        let contents = fs::read_to_string(writer.path()).unwrap();
        let header = contents.lines().next().unwrap();

        assert_eq!(header, format!("{},x,y,z", writer.base_time_ms()));

        // Cleanup
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_read_rejects_bad_base_time() {
        let dir = env::temp_dir().join("acc_sensing_bad_base_test");
        fs::create_dir_all(&dir).unwrap();

        let path = dir.join("broken.csv");
        fs::write(&path, "not-a-time,x,y,z\n10,0.1,0.2,0.3\n").unwrap();

        assert!(matches!(
            read_session(&path),
            Err(AccSensingError::MalformedLog(_))
        ));

        // Cleanup
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_read_rejects_empty_file() {
        let dir = env::temp_dir().join("acc_sensing_empty_file_test");
        fs::create_dir_all(&dir).unwrap();

        let path = dir.join("empty.csv");
        fs::write(&path, "").unwrap();

        assert!(matches!(
            read_session(&path),
            Err(AccSensingError::MalformedLog(_))
        ));

        // Cleanup
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_read_rejects_file_without_header() {
        let dir = env::temp_dir().join("acc_sensing_no_header_test");
        fs::create_dir_all(&dir).unwrap();

        // Data rows only; the first must not be swallowed as a header.
        let path = dir.join("headerless.csv");
        fs::write(&path, "20,0.1,0.2,0.3\n40,0.0,0.0,0.0\n").unwrap();

        assert!(matches!(
            read_session(&path),
            Err(AccSensingError::MalformedLog(_))
        ));

        // Cleanup
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_read_rejects_short_row() {
        let dir = env::temp_dir().join("acc_sensing_short_row_test");
        fs::create_dir_all(&dir).unwrap();

        let path = dir.join("short.csv");
        fs::write(&path, "1700000000000,x,y,z\n10,0.1\n").unwrap();

        assert!(matches!(
            read_session(&path),
            Err(AccSensingError::MalformedLog(_))
        ));

        // Cleanup
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_recorded_spike_survives_replay() {
        use crate::detection::FallDetector;

        let dir = env::temp_dir().join("acc_sensing_replay_test");
        fs::create_dir_all(&dir).unwrap();

        let mut writer = SessionWriter::create(&dir).unwrap();
        let base = writer.base_time_ms();

        // Four quiet samples, then a spike on the fifth.
        let axes = [
            (0.1, 0.0, 0.2),
            (0.0, 0.1, 0.1),
            (0.2, 0.1, 0.0),
            (0.1, 0.2, 0.1),
            (12.0, 3.0, 2.0),
        ];
        for (i, (x, y, z)) in axes.iter().enumerate() {
            let sample = AccelSample {
                timestamp: (base + 20 * (i as i64 + 1)) as f64 / 1000.0,
                x: *x,
                y: *y,
                z: *z,
            };
            writer.append(&sample).unwrap();
        }

        let log = read_session(writer.path()).unwrap();
        let mut detector = FallDetector::new();
        let decisions: Vec<bool> = log
            .samples
            .iter()
            .map(|s| detector.process_sample(s.x, s.y, s.z))
            .collect();

        assert_eq!(decisions, vec![false, false, false, false, true]);

        // Cleanup
        fs::remove_dir_all(&dir).unwrap();
    }
}
