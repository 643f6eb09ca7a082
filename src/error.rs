// ABOUTME: Crate-wide error type covering every failure surface of the framing engine
// ABOUTME: Maps protocol, pool, and I/O failures onto one flat enum applications can match on

use std::io;

use crate::frame::DataType;

/// Every error this crate can surface, from buffer exhaustion to protocol corruption.
///
/// Kept as a single flat enum rather than a tree of per-module errors: every variant
/// here is already meaningful at the application boundary, so there is nothing a
/// nested `#[from]` chain would add besides indirection.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// `BufferPool::acquire` was asked for more than the LARGE size class holds.
    #[error("requested buffer size {requested} exceeds the largest size class ({max})")]
    BufferTooLarge { requested: usize, max: usize },

    /// A pending `acquire` was cancelled (the owning task was aborted) before a permit arrived.
    #[error("buffer pool wait was interrupted")]
    ResourceInterrupted,

    /// A send was attempted on a connection whose channel is already closed.
    #[error("channel is closed")]
    ChannelClosed,

    /// The peer closed the connection (EOF on read, or a zero-length write completion).
    #[error("peer closed the connection")]
    PeerClosed,

    /// No bytes arrived within the configured keep-alive timeout.
    #[error("read timed out")]
    Timeout,

    /// The channel was closed while an I/O operation was in flight.
    #[error("channel closed during pending I/O")]
    AsyncClose,

    /// `FRAME_LENGTH` exceeded the configured maximum; fatal to the connection.
    #[error("frame length {length} exceeds maximum {max}")]
    FrameOversize { length: u32, max: u32 },

    /// `FRAME_LENGTH` was zero; fatal to the connection.
    #[error("frame length must be positive, got {0}")]
    FrameNonPositive(u32),

    /// The payload violated its type's format: unknown marker, an inner length that
    /// overruns the frame, or bytes that are not valid UTF-8 where a string was expected.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// The payload was shorter than its declared or fixed size.
    #[error("protocol incomplete: expected {expected} bytes, had {actual}")]
    ProtocolIncomplete { expected: usize, actual: usize },

    /// Frame assembly failed on the send side (an internal arithmetic or I/O invariant).
    #[error("encoder failed: {0}")]
    EncoderInternal(String),

    /// Wraps the underlying I/O error for variants that carry one along for context.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FrameError {
    /// `true` for errors that leave the byte stream unsynchronized and so must close
    /// the connection (§4.4/§4.6); `false` for errors local to a single payload (§4.5).
    pub fn is_fatal_to_connection(&self) -> bool {
        matches!(
            self,
            FrameError::FrameOversize { .. }
                | FrameError::FrameNonPositive(_)
                | FrameError::PeerClosed
                | FrameError::Timeout
                | FrameError::AsyncClose
                | FrameError::ResourceInterrupted
                | FrameError::Io(_)
        )
    }

    /// Classifies a raw I/O failure the way the read and write engines both need to
    /// (§4.6 step 6 / §4.3): a closed-out-from-under-us socket becomes `AsyncClose`,
    /// anything else stays a generic `Io`.
    pub(crate) fn classify_io(source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted | io::ErrorKind::BrokenPipe => {
                FrameError::AsyncClose
            }
            _ => FrameError::Io(source),
        }
    }

    pub(crate) fn protocol_violation_unknown_marker(marker: u8) -> Self {
        FrameError::ProtocolViolation(format!("unknown data type marker {marker:#04x}"))
    }

    pub(crate) fn protocol_violation_length(declared: u32, remaining: usize) -> Self {
        FrameError::ProtocolViolation(format!(
            "declared length {declared} exceeds {remaining} remaining payload bytes"
        ))
    }

    pub(crate) fn protocol_violation_utf8(data_type: DataType, source: std::str::Utf8Error) -> Self {
        FrameError::ProtocolViolation(format!("invalid UTF-8 in {data_type:?} payload: {source}"))
    }
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FrameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_reset_and_friends_classify_as_async_close() {
        for kind in [io::ErrorKind::ConnectionReset, io::ErrorKind::ConnectionAborted, io::ErrorKind::BrokenPipe] {
            let error = FrameError::classify_io(io::Error::from(kind));
            assert!(matches!(error, FrameError::AsyncClose));
        }
    }

    #[test]
    fn other_io_errors_stay_generic() {
        let error = FrameError::classify_io(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(error, FrameError::Io(_)));
    }

    #[test]
    fn fatal_classification_matches_connection_ending_errors() {
        assert!(FrameError::AsyncClose.is_fatal_to_connection());
        assert!(FrameError::PeerClosed.is_fatal_to_connection());
        assert!(FrameError::Timeout.is_fatal_to_connection());
        assert!(!FrameError::ChannelClosed.is_fatal_to_connection());
        assert!(!FrameError::ProtocolViolation("x".into()).is_fatal_to_connection());
    }
}
