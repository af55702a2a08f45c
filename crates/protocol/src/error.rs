//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while parsing a wire frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("unknown server message: {0}")]
    UnknownMessage(String),

    #[error("unexpected end of frame")]
    UnexpectedEnd,

    #[error("invalid number: {0:?}")]
    InvalidNumber(String),

    #[error("invalid power-up kind: {0}")]
    InvalidPowerupKind(u8),

    #[error("frame is not valid UTF-8")]
    NotText,
}
