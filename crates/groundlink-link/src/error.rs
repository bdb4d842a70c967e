use groundlink_transport::TransportError;

/// Errors that can occur while starting or driving a ground link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// At least one transport is required.
    #[error("no transports configured")]
    NoTransports,

    /// A transport failed to start.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A worker thread could not be spawned.
    #[error("failed to spawn {worker} worker: {source}")]
    Spawn {
        worker: &'static str,
        source: std::io::Error,
    },

    /// The link's workers are gone.
    #[error("link shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, LinkError>;
