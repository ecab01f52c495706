//! Harness for racing a coordinated cluster shutdown against leader step-down
//!
//! The orchestrator shuts down every follower of an externally supplied
//! cluster, holds a configurable race window open, then shuts down the
//! leader, either with the same direct command or through an external
//! helper process. Every shutdown attempt is recorded as an outcome, never
//! propagated as a failure of the run itself.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::{LeaderShutdownMethod, RunConfig};
pub use error::{HarnessError, HarnessResult};
pub use orchestrator::RaceOrchestrator;
pub use report::{OutcomeKind, ProbeRecord, RunReport, ShutdownOutcome};
pub use traits::{Cluster, ClusterNode, HelperOutput, HelperRunner};
pub use traits::{MockCluster, MockClusterNode, MockHelperRunner};
