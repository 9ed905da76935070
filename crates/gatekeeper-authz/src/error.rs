//! Transport-level errors of the authorization client.

use thiserror::Error;

/// Errors that can occur while talking to the authorization server.
///
/// None of these escape [`Authorizer::authorize`]; the client folds them
/// into `AuthorizationResult::TransportError` so callers always get a
/// decision.
///
/// [`Authorizer::authorize`]: crate::Authorizer::authorize
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Read operation timed out
    #[error("Read timeout after {0}ms")]
    ReadTimeout(u64),

    /// Write operation timed out
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Connection was lost during the exchange
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Response could not be parsed as HTTP/1.x
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Request payload could not be encoded
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
