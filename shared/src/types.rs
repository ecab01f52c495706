//! Core types used throughout the harness workspace

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Global process ID singleton - set once at startup
static PROCESS_ID: OnceLock<ProcessId> = OnceLock::new();

/// Process identifier for any component in the system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessId {
    /// The race harness itself (singleton)
    Harness,
    /// The external leader-shutdown helper
    Helper,
    /// A fake cluster node, identified by its listen port
    Node(u16),
}

impl ProcessId {
    /// Initialize the global process ID for the harness
    pub fn init_harness() -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Harness)
    }

    /// Initialize the global process ID for the helper
    pub fn init_helper() -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Helper)
    }

    /// Initialize the global process ID for a test node with its port
    pub fn init_node(port: u16) -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Node(port))
    }

    /// Get the global process ID, falling back to `Harness` when no binary
    /// entry point initialized it (library consumers, tests)
    pub fn current() -> ProcessId {
        PROCESS_ID.get().cloned().unwrap_or(ProcessId::Harness)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessId::Harness => write!(f, "harness"),
            ProcessId::Helper => write!(f, "helper"),
            ProcessId::Node(port) => write!(f, "node_{port}"),
        }
    }
}

impl Default for ProcessId {
    fn default() -> Self {
        ProcessId::Harness
    }
}

/// Role a node reports for itself, queried live and never cached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRole {
    Leader,
    Follower,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Leader => write!(f, "leader"),
            NodeRole::Follower => write!(f, "follower"),
        }
    }
}

impl std::str::FromStr for NodeRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "leader" | "primary" => Ok(NodeRole::Leader),
            "follower" | "secondary" => Ok(NodeRole::Follower),
            _ => Err(format!("Unknown role: {s}")),
        }
    }
}

/// Status a node returns to a liveness probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub role: NodeRole,
    pub uptime_seconds: u64,
}

/// Acknowledgement a node returns when it accepts a shutdown command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownAck {
    /// Whether the node will terminate regardless of in-flight work
    pub forced: bool,
}

/// Shared error type for cross-package compatibility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedError {
    pub code: String,
    pub message: String,
}

impl SharedError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for SharedError {}
