use easynet_transport::Identity;

/// Errors that can occur in endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] easynet_transport::TransportError),

    /// An inbound frame does not have the expected layout.
    #[error("malformed frame: {0}")]
    Frame(#[from] easynet_frame::FrameError),

    /// Payload encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] easynet_codec::CodecError),

    /// `start` was called on a running endpoint.
    #[error("endpoint already started")]
    AlreadyStarted,

    /// `stop` was called before `start`.
    #[error("endpoint not started")]
    NotStarted,

    /// The endpoint has been stopped.
    #[error("endpoint closed")]
    Closed,

    /// No connected client has this identity.
    #[error("no route to client {0}")]
    Unroutable(Identity),

    /// The listener thread could not be spawned.
    #[error("failed to spawn listener: {0}")]
    Spawn(std::io::Error),
}

/// Result alias for endpoint operations.
pub type Result<T> = std::result::Result<T, EndpointError>;
