//! Error types for transport operations.
//!
//! This module defines the failure modes of a reader link: disconnection,
//! timeouts, malformed responses, and errors surfaced by the platform
//! PC/SC service.

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur while talking to a reader.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No matching reader is attached to the PC/SC service.
    #[error("Reader not found: {name}")]
    ReaderNotFound { name: String },

    /// The reader or its link is gone.
    #[error("Reader disconnected: {device}")]
    Disconnected { device: String },

    /// The exchange did not complete within the configured bound.
    #[error("Transmit timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The response is too short to carry a trailing status word.
    #[error("Response of {length} bytes is too short to carry a status word")]
    ResponseTooShort { length: usize },

    /// Error reported by the platform PC/SC service.
    #[cfg(feature = "pcsc")]
    #[error("PC/SC error: {0}")]
    Pcsc(#[from] pcsc::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a new reader-not-found error.
    pub fn reader_not_found(name: impl Into<String>) -> Self {
        Self::ReaderNotFound { name: name.into() }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new short-response error.
    pub fn response_too_short(length: usize) -> Self {
        Self::ResponseTooShort { length }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Whether this failure is a bounded-timeout expiry rather than a hard
    /// link fault. The relay treats timeouts on polls as "nothing pending".
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<TransportError> for relaykit_core::Error {
    fn from(err: TransportError) -> Self {
        relaykit_core::Error::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = TransportError::disconnected("ACR122U");
        assert!(matches!(error, TransportError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Reader disconnected: ACR122U");
    }

    #[test]
    fn test_timeout_error() {
        let error = TransportError::timeout(1500);
        assert!(error.is_timeout());
        assert_eq!(error.to_string(), "Transmit timeout after 1500ms");
    }

    #[test]
    fn test_short_response_error() {
        let error = TransportError::response_too_short(1);
        assert!(!error.is_timeout());
        assert_eq!(
            error.to_string(),
            "Response of 1 bytes is too short to carry a status word"
        );
    }

    #[test]
    fn test_conversion_into_core_error() {
        let error: relaykit_core::Error = TransportError::reader_not_found("emulator").into();
        assert!(matches!(error, relaykit_core::Error::Transport(_)));
        assert!(error.to_string().contains("emulator"));
    }
}
