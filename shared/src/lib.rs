//! Shared types for the step-down race harness
//!
//! Contains only truly shared pieces: the admin wire protocol spoken
//! between the harness and cluster nodes, process-aware logging, and the
//! identifiers every binary in the workspace needs.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

// Re-export the wire protocol at the crate root
pub use messages::{read_frame, write_frame, AdminRequest, AdminResponse};
