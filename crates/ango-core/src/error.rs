//! Shared error type across ango crates.

use thiserror::Error;

/// Stable error codes (safe to log or expose to peers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Caller passed an unusable argument.
    InvalidArgument,
    /// Deferred was already resolved or rejected.
    AlreadyCompleted,
    /// Peer denied the request.
    Denied,
    /// Connection is closed.
    Closed,
    /// Bounded wait expired.
    Timeout,
    /// Transport read/write failed.
    Transport,
    /// Malformed envelope.
    Protocol,
    /// Payload could not be encoded/decoded.
    Encode,
    /// Invalid configuration.
    BadConfig,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::AlreadyCompleted => "ALREADY_COMPLETED",
            ErrorCode::Denied => "DENIED",
            ErrorCode::Closed => "CLOSED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::Protocol => "PROTOCOL",
            ErrorCode::Encode => "ENCODE",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, AngoError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum AngoError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("deferred was already resolved or rejected")]
    AlreadyCompleted,
    #[error("request denied: {0}")]
    Denied(String),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("timed out waiting for peer")]
    Timeout,
    #[error("transport: {0}")]
    Transport(String),
    #[error("protocol: {0}")]
    Protocol(String),
    #[error("encode: {0}")]
    Encode(String),
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl AngoError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            AngoError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            AngoError::AlreadyCompleted => ErrorCode::AlreadyCompleted,
            AngoError::Denied(_) => ErrorCode::Denied,
            AngoError::ConnectionClosed => ErrorCode::Closed,
            AngoError::Timeout => ErrorCode::Timeout,
            AngoError::Transport(_) => ErrorCode::Transport,
            AngoError::Protocol(_) => ErrorCode::Protocol,
            AngoError::Encode(_) => ErrorCode::Encode,
            AngoError::Config(_) => ErrorCode::BadConfig,
            AngoError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            AngoError::Internal(_) => ErrorCode::Internal,
        }
    }
}
