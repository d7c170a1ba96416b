//! Motion link error types

use thiserror::Error;

/// Errors that can occur while talking to the pan/tilt head
#[derive(Debug, Error)]
pub enum LinkError {
    /// Serial port could not be opened
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Write on a link that is not connected
    #[error("Pan/tilt head is not connected")]
    NotConnected,

    /// Underlying stream failed
    #[error("I/O error on motion link: {0}")]
    Io(#[from] std::io::Error),

    /// Text that is not a valid motion command
    #[error("Invalid motion command: {0:?}")]
    InvalidCommand(String),

    /// Line exceeded the firmware buffer before a terminator arrived
    #[error("Command line exceeds {0} bytes")]
    LineTooLong(usize),
}

impl From<tokio_serial::Error> for LinkError {
    fn from(err: tokio_serial::Error) -> Self {
        LinkError::SerialError(err.to_string())
    }
}
