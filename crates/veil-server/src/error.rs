use thiserror::Error;

/// Errors produced by the veil server.
///
/// Session-level failures are logged and end the session without any
/// wire-level response — a rejected handshake is indistinguishable from an
/// idle connection on the wire.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Path mismatch, first-frame timeout, non-binary first frame, or a
    /// header decode failure. The reason never leaves the process.
    #[error("handshake rejected: {0}")]
    HandshakeRejected(&'static str),

    /// Header decode failure, carried for logging only.
    #[error("header decode failed: {0}")]
    Decode(#[from] veil_proto::DecodeError),

    /// The outbound TCP connection could not be established.
    #[error("upstream connect failed: {0}")]
    UpstreamConnect(std::io::Error),

    /// Mid-session I/O failure on either side of the bridge.
    #[error("forwarding error: {0}")]
    Forwarding(String),

    /// Listener could not be bound, or the serve loop failed.
    #[error("listener error: {0}")]
    Listener(std::io::Error),

    /// Invalid startup configuration.
    #[error("config error: {0}")]
    Config(String),
}

pub type ServerResult<T> = Result<T, ServerError>;
