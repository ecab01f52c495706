//! Wire-level error types shared by every process speaking the admin protocol

use thiserror::Error;

/// Failure while framing or encoding an admin message
#[derive(Error, Debug)]
pub enum WireError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("Frame of {0} bytes exceeds the admin protocol limit")]
    FrameTooLarge(usize),
}

impl WireError {
    /// Whether this failure means the peer went away mid-exchange, which is
    /// the expected signature of a node dying on a forced shutdown
    pub fn is_connection_lost(&self) -> bool {
        match self {
            WireError::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}
