// Accelerometer fall sensing core
// Streams 3-axis samples through a smoothing history and a raw-magnitude
// threshold, with CSV session logs and a live status file on the side.

pub mod detection;
pub mod error;
pub mod live_status;
pub mod sensors;
pub mod session;
pub mod storage;

pub use detection::FallDetector;
pub use error::{AccSensingError, SensingResult};
pub use sensors::AccelSample;
pub use session::{Session, SessionMetadata, SessionState};
pub use storage::{read_session, LoggedSample, SessionLog, SessionWriter};
