//! # Error Handling
//!
//! Error types for the link client. Every failure here is absorbed locally:
//! transport errors feed the reconnect policy, everything else is logged and
//! reflected as observable status text. No error terminates the process.
//!
//! ## Error Categories:
//! - **Transport**: connect/send/receive failure (recoverable, drives backoff reconnect)
//! - **Encoding**: message serialization failure (message dropped, non-fatal)
//! - **AuthorizationDenied**: motion/speech permission not granted (feature does not start)
//! - **Recognition**: speech engine failure (current recognition session abandoned)
//! - **Config**: configuration file or environment problems (startup only)

use std::fmt;

/// Failure classes for the link client.
#[derive(Debug)]
pub enum LinkError {
    /// Connect, send, or receive failure on the transport
    Transport(String),

    /// Outbound message could not be serialized
    Encoding(String),

    /// Permission for a sensor or the recognizer was not granted
    AuthorizationDenied(String),

    /// The speech engine reported a failure
    Recognition(String),

    /// Configuration file or environment variable problems
    Config(String),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Transport(msg) => write!(f, "transport error: {}", msg),
            LinkError::Encoding(msg) => write!(f, "encoding error: {}", msg),
            LinkError::AuthorizationDenied(msg) => write!(f, "authorization denied: {}", msg),
            LinkError::Recognition(msg) => write!(f, "recognition error: {}", msg),
            LinkError::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl std::error::Error for LinkError {}

/// Conversion from WebSocket transport errors.
///
/// ## When this happens:
/// - The dial fails (refused, DNS, TLS)
/// - A send hits a closed or broken socket
/// - The receive loop observes a protocol violation
impl From<tokio_tungstenite::tungstenite::Error> for LinkError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        LinkError::Transport(err.to_string())
    }
}

/// Conversion from JSON serialization errors.
///
/// Serialization of an outbound frame should never fail for these types, but
/// when it does the message is dropped rather than poisoning the session.
impl From<serde_json::Error> for LinkError {
    fn from(err: serde_json::Error) -> Self {
        LinkError::Encoding(format!("JSON error: {}", err))
    }
}

/// Conversion from configuration errors.
///
/// ## When this happens:
/// - config.toml has invalid syntax
/// - An `APP_`-prefixed environment override has the wrong shape
/// - Values fail validation
impl From<config::ConfigError> for LinkError {
    fn from(err: config::ConfigError) -> Self {
        LinkError::Config(err.to_string())
    }
}

/// Type alias for Results that use the link error type.
pub type LinkResult<T> = Result<T, LinkError>;
