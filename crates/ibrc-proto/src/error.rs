//! Error types for the ibrc protocol library.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Protocol-level errors.
///
/// Everything except [`ProtocolError::Io`] describes malformed input, which
/// a server drops without replying.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The message was empty or whitespace only.
    #[error("empty message")]
    EmptyMessage,

    /// The leading token is not a known message type.
    #[error("unknown message type: {0}")]
    UnknownCommand(String),

    /// A required field was missing.
    #[error("{command}: missing field `{field}`")]
    MissingField {
        /// Message type being parsed.
        command: &'static str,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A STATUS code was not a number.
    #[error("invalid status code: {0}")]
    InvalidStatusCode(String),
}
