use crate::error::{AccSensingError, SensingResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Session state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Sensing but not recording
    Idle,
    /// Recording samples to disk
    Recording,
}

/// Session metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_id: String,
    pub start_time: String,
    pub state: SessionState,
    pub sample_count: u32,
    pub fall_count: u32,
    pub peak_magnitude: f64,
}

/// One sensing session, owned and driven by the main loop.
pub struct Session {
    metadata: SessionMetadata,
}

impl Session {
    /// Create new session in Idle state
    pub fn new() -> Self {
        let metadata = SessionMetadata {
            session_id: format!("session_{}", Utc::now().timestamp_millis()),
            start_time: Utc::now().to_rfc3339(),
            state: SessionState::Idle,
            sample_count: 0,
            fall_count: 0,
            peak_magnitude: 0.0,
        };

        Session { metadata }
    }

    /// Transition to Recording (Idle → Recording), stamping a fresh session
    /// id and resetting the counters.
    pub fn start_recording(&mut self) -> SensingResult<()> {
        match self.metadata.state {
            SessionState::Idle => {
                self.metadata.session_id =
                    format!("session_{}", Utc::now().timestamp_millis());
                self.metadata.start_time = Utc::now().to_rfc3339();
                self.metadata.state = SessionState::Recording;
                self.metadata.sample_count = 0;
                self.metadata.fall_count = 0;
                self.metadata.peak_magnitude = 0.0;
                Ok(())
            }
            SessionState::Recording => Err(AccSensingError::AlreadyRecording),
        }
    }

    /// Transition back to Idle (Recording → Idle, ends the session)
    pub fn stop_recording(&mut self) -> SensingResult<()> {
        match self.metadata.state {
            SessionState::Recording => {
                self.metadata.state = SessionState::Idle;
                Ok(())
            }
            SessionState::Idle => Err(AccSensingError::NotRecording),
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.metadata.state
    }

    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        self.metadata.state == SessionState::Recording
    }

    /// Account for one processed sample. Ignored while idle.
    pub fn record_sample(&mut self, magnitude: f64, is_fall: bool) {
        if !self.is_recording() {
            return;
        }

        self.metadata.sample_count += 1;
        if is_fall {
            self.metadata.fall_count += 1;
        }
        if magnitude > self.metadata.peak_magnitude {
            self.metadata.peak_magnitude = magnitude;
        }
    }

    /// Get metadata snapshot
    pub fn metadata(&self) -> SessionMetadata {
        self.metadata.clone()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
