//! Harness-specific error types

use shared::WireError;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("No node answered the liveness probe ({attempted} attempted)")]
    ClusterUnreachable { attempted: usize },

    #[error("No reachable node reports itself as leader")]
    LeaderUnresolved,

    #[error("Shutdown RPC to {endpoint} timed out after {timeout:?}")]
    RpcTimeout { endpoint: SocketAddr, timeout: Duration },

    #[error("Connection to {endpoint} lost: {message}")]
    ConnectionLost { endpoint: SocketAddr, message: String },

    #[error("Command rejected by {endpoint}: {message}")]
    CommandRejected { endpoint: SocketAddr, message: String },

    #[error("Helper process failed: {message}")]
    HelperFailed { message: String },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Wire protocol error: {0}")]
    WireError(#[from] WireError),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl HarnessError {
    /// Shorthand for configuration errors
    pub fn config(field: impl Into<String>) -> Self {
        HarnessError::ConfigurationError { field: field.into() }
    }

    /// Whether this error aborts a run instead of being folded into a
    /// per-node shutdown outcome
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HarnessError::ClusterUnreachable { .. }
                | HarnessError::LeaderUnresolved
                | HarnessError::ConfigurationError { .. }
        )
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
