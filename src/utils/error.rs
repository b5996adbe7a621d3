use std::io::Error as IoError;
use thiserror::Error;

/// Failures decoding or encoding an RTMP chunk header.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header size {0} is not one of 1, 4, 8 or 12")]
    SizeOutOfRange(usize),

    #[error("body size {0} exceeds 65535")]
    BodySizeTooLarge(usize),

    #[error("no previous body size for channel {0}")]
    NoPriorBodySize(u8),

    #[error("channel {0} out of range")]
    ChannelOutOfRange(u8),

    #[error("truncated header: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("Header error: {0}")]
    Header(#[from] HeaderError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Handshake error: {0}")]
    Handshake(String),

    #[error("AMF decode error: {0}")]
    AmfDecode(String),

    #[error("AMF encode error: {0}")]
    AmfEncode(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Create an IO error from message
    pub fn io(msg: impl Into<String>) -> Self {
        Error::Io(IoError::other(msg.into()))
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    /// Create a handshake error
    pub fn handshake(msg: impl Into<String>) -> Self {
        Error::Handshake(msg.into())
    }

    /// Create an AMF decode error
    pub fn amf_decode(msg: impl Into<String>) -> Self {
        Error::AmfDecode(msg.into())
    }

    /// Create an AMF encode error
    pub fn amf_encode(msg: impl Into<String>) -> Self {
        Error::AmfEncode(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Error::Connection(msg.into())
    }

    /// Create a stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Error::Stream(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// True for socket read timeouts, which callers may retry
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::protocol("packet size out of range");
        assert_eq!(format!("{}", err), "Protocol error: packet size out of range");

        let err = Error::handshake("Version mismatch");
        assert_eq!(format!("{}", err), "Handshake error: Version mismatch");
    }

    #[test]
    fn test_header_error_conversion() {
        let err: Error = HeaderError::BodySizeTooLarge(70000).into();
        assert!(matches!(err, Error::Header(HeaderError::BodySizeTooLarge(70000))));
        assert_eq!(format!("{}", err), "Header error: body size 70000 exceeds 65535");
    }

    #[test]
    fn test_error_conversion() {
        use std::io::{Error as IoError, ErrorKind};

        let err: Error = IoError::new(ErrorKind::UnexpectedEof, "EOF").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_timeout());

        let err: Error = IoError::new(ErrorKind::WouldBlock, "again").into();
        assert!(err.is_timeout());
    }
}
