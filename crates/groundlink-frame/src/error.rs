use groundlink_registry::{RegistryError, ValueKind};

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A frame declares more bytes than the buffer holds.
    #[error("frame declares {declared} payload bytes but only {remaining} remain")]
    Framing { declared: usize, remaining: usize },

    /// The decoded tag is not in the registry.
    #[error("unknown tag {0}")]
    UnknownTag(i64),

    /// The decoded value does not fit the variable's declared kind.
    #[error("type mismatch for '{path}': expected {expected}, got {found}")]
    TypeMismatch {
        path: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// The payload is not a valid update message.
    #[error("malformed payload: {0}")]
    Malformed(#[from] prost::DecodeError),

    /// The registry refused the decoded value for a reason other than its
    /// kind.
    #[error("rejected by registry: {0}")]
    Registry(RegistryError),

    /// The payload decoded but carries no tag.
    #[error("malformed payload: missing tag")]
    MissingTag,

    /// The encoded payload does not fit behind a one-byte length prefix.
    #[error("encoded update too large ({size} bytes, max {max})")]
    EncodingTooLarge { size: usize, max: usize },

    /// A single frame is larger than one packet on this link.
    #[error("frame of {size} bytes exceeds link MTU {mtu}")]
    ExceedsMtu { size: usize, mtu: usize },

    /// A frame started arriving but its payload never completed.
    #[error("link stalled mid-frame ({received} of {expected} payload bytes)")]
    Stalled { expected: usize, received: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The medium accepted zero bytes on write.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
