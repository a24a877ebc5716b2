//! Error types for bytewire transports.

use thiserror::Error;

/// Main error type for all transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying channel failure (socket, pipe, file handle).
    ///
    /// The originating `std::io::Error` is preserved as the cause.
    #[error("channel error: {0}")]
    Channel(#[from] std::io::Error),

    /// The stream ended before the requested number of bytes was available.
    #[error("unexpected end of stream")]
    EndOfStream,

    /// Operation on a transport that is not open.
    ///
    /// Also raised for every negotiation failure: an aborted session leaves
    /// the transport permanently unopened.
    #[error("transport not open: {0}")]
    NotOpen(String),

    /// `open()` called on a transport that already completed negotiation.
    #[error("transport already open")]
    AlreadyOpen,

    /// Frame length header with the sign bit set.
    #[error("negative frame size: {0}")]
    NegativeSize(i32),

    /// Frame length above the configured maximum.
    #[error("frame size {size} exceeds limit {limit}")]
    SizeLimit {
        /// Length claimed by the frame header.
        size: u32,
        /// Configured maximum frame size.
        limit: u32,
    },

    /// Negotiation status byte outside the known range.
    #[error("invalid negotiation status byte: {0}")]
    InvalidClientType(u8),
}

impl TransportError {
    /// Whether this error re-surfaces a timeout reported by the underlying
    /// channel. Timeouts are never generated at this layer.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransportError::Channel(e) if matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            )
        )
    }

    /// Whether this error marks end of stream.
    #[inline]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, TransportError::EndOfStream)
    }
}

/// Result type alias using TransportError.
pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_recognized_not_generated() {
        let timed_out = TransportError::Channel(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "socket timeout",
        ));
        assert!(timed_out.is_timeout());

        let refused = TransportError::Channel(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(!refused.is_timeout());
        assert!(!TransportError::EndOfStream.is_timeout());
    }

    #[test]
    fn test_end_of_stream_is_distinct_from_channel_error() {
        assert!(TransportError::EndOfStream.is_end_of_stream());

        let channel = TransportError::Channel(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "broken pipe",
        ));
        assert!(!channel.is_end_of_stream());
    }

    #[test]
    fn test_channel_error_preserves_cause() {
        let inner = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "peer vanished");
        let err = TransportError::from(inner);
        assert!(err.to_string().contains("peer vanished"));
    }

    #[test]
    fn test_size_limit_message_names_both_sizes() {
        let err = TransportError::SizeLimit {
            size: 5000,
            limit: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("5000"));
        assert!(msg.contains("1024"));
    }
}
