use std::time::Duration;

use groundlink_frame::FrameError;

/// Errors raised by a physical link.
///
/// Every variant is a connection error: the transport worker reports it,
/// drops the current connection and retries.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The medium could not be opened.
    #[error("failed to open {medium}: {reason}")]
    Open { medium: String, reason: String },

    /// The serial port driver reported an error.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// An I/O error occurred on the link.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading or writing a frame failed.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// A write did not complete in time.
    #[error("write timed out after {0:?}")]
    Timeout(Duration),

    /// The wireless peripheral reported an error.
    #[error("peripheral error: {0}")]
    Peripheral(String),

    /// The remote end went away.
    #[error("link closed")]
    Closed,

    /// A link description could not be parsed.
    #[error("invalid link config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
