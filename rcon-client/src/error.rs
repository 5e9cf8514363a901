//! Client error types.

use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] rcon_protocol::ProtocolError),

    #[error("not connected")]
    NotConnected,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("request timeout")]
    Timeout,

    #[error("authentication denied by server")]
    AuthenticationDenied,

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("unexpected reply packet: {0}")]
    UnexpectedReply(&'static str),
}

impl ClientError {
    /// Returns whether retrying on a fresh connection could help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Io(_) | ClientError::Timeout | ClientError::ConnectionClosed
        )
    }
}
