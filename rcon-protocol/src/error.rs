//! Protocol error types.

use thiserror::Error;

/// Errors that can occur during framing or packet handling.
///
/// Structural decode errors (truncation, trailer violation, unknown or
/// malformed packets) poison the stream position and are treated as fatal for
/// the connection by both peers; they are never retried.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: u32, max: u32 },

    #[error("packet payload truncated: {len} bytes")]
    TruncatedPayload { len: usize },

    #[error("packet trailer is not a double null byte")]
    TrailerViolation,

    #[error("unknown packet id: {0:#04x}")]
    UnknownPacket(i32),

    #[error("invalid body for packet id {id:#04x}: {reason}")]
    InvalidPacket { id: i32, reason: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::FrameTooLarge {
            size: 2048,
            max: 1024,
        };
        assert!(err.to_string().contains("2048"));

        let err = ProtocolError::UnknownPacket(0x7f);
        assert!(err.to_string().contains("0x7f"));

        let err = ProtocolError::TruncatedPayload { len: 3 };
        assert!(err.to_string().contains("3"));

        let err = ProtocolError::InvalidPacket {
            id: 0x02,
            reason: "body is not valid text",
        };
        assert!(err.to_string().contains("valid text"));
    }
}
