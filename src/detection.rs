/// Values averaged per smoothing step: the incoming raw magnitude plus the
/// four most recently stored smoothed magnitudes.
const SMOOTHING_SPAN: usize = 5;

/// Magnitude (m/s²) at or above which a sample counts as a fall.
const FALL_THRESHOLD: f64 = 5.0;

/// Threshold-based fall detection over a stream of 3-axis acceleration
/// samples.
///
/// Every processed sample appends one smoothed magnitude to an internal
/// history; the smoothing is a trailing moving average over previously
/// *smoothed* values, so a spike keeps echoing through the stored stream
/// for several samples after it passes.
pub struct FallDetector {
    // Smoothed magnitudes, one per sample ever processed. Append-only; the
    // last four entries feed the next smoothing step.
    history: Vec<f64>,
}

impl FallDetector {
    pub fn new() -> Self {
        FallDetector {
            history: Vec::new(),
        }
    }

    /// Feed one sample and decide whether it indicates a fall.
    ///
    /// The first four calls always return `false` while the history fills;
    /// from the fifth call on, the decision is `raw magnitude >= 5.0`.
    /// Non-finite components are not rejected; they flow through the
    /// arithmetic under normal IEEE 754 rules.
    pub fn process_sample(&mut self, x: f64, y: f64, z: f64) -> bool {
        let raw = magnitude(x, y, z);
        let smoothed = self.smooth(raw);
        self.history.push(smoothed);

        if self.history.len() >= SMOOTHING_SPAN {
            // The decision reads the raw magnitude of the current sample;
            // the smoothed value only feeds the history.
            raw >= FALL_THRESHOLD
        } else {
            false
        }
    }

    // Trailing moving average of the raw value and the last four stored
    // smoothed values. Pass-through until five entries already exist, so
    // smoothing first engages on the sixth sample.
    fn smooth(&self, raw: f64) -> f64 {
        if self.history.len() >= SMOOTHING_SPAN {
            let tail: f64 = self.history[self.history.len() - (SMOOTHING_SPAN - 1)..]
                .iter()
                .sum();
            (raw + tail) / SMOOTHING_SPAN as f64
        } else {
            raw
        }
    }

    /// Number of smoothed magnitudes stored so far (one per sample).
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Stored smoothed magnitudes, oldest first.
    pub fn smoothed_history(&self) -> &[f64] {
        &self.history
    }

    /// Most recently stored smoothed magnitude.
    pub fn last_smoothed(&self) -> Option<f64> {
        self.history.last().copied()
    }

    /// True while fewer than five samples have been seen and every decision
    /// is still a forced `false`.
    pub fn is_warming_up(&self) -> bool {
        self.history.len() < SMOOTHING_SPAN
    }

    /// The fixed decision threshold in m/s².
    pub fn threshold(&self) -> f64 {
        FALL_THRESHOLD
    }
}

impl Default for FallDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn magnitude(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}
