use thiserror::Error;

/// Errors surfaced by the session and storage layers.
///
/// The detector itself has no failure path: every sample produces a
/// decision, so nothing here maps to it.
#[derive(Error, Debug)]
pub enum AccSensingError {
    #[error("Recording already in progress")]
    AlreadyRecording,

    #[error("No recording in progress")]
    NotRecording,

    #[error("Storage error: {0}")]
    Storage(#[from] csv::Error),

    #[error("Malformed session log: {0}")]
    MalformedLog(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for session and storage operations.
pub type SensingResult<T> = Result<T, AccSensingError>;
