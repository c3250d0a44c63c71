/// Error types surfaced by the scanning engine and controller.
///
/// Only [`ScanError::InvalidArgument`], [`ScanError::AlreadyRunning`] and
/// [`ScanError::Spawn`] ever reach an external caller. Directory- and
/// file-level I/O failures are absorbed where they happen and show up only
/// in logs and in the [`ScanReport`](crate::scanner::ScanReport) counters.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    /// The root identifier was empty or blank.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `start` was called while a scan is running, paused, or cancelling.
    #[error("a scan is already active")]
    AlreadyRunning,

    /// Cancellation was observed while publishing a result.
    #[error("scan was cancelled")]
    Cancelled,

    /// A worker or supervisor thread could not be spawned.
    #[error("failed to spawn scan thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
