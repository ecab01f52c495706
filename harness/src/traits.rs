//! Trait definitions with mockall annotations for testing
//!
//! The cluster under test is an external collaborator: the harness only
//! ever sees it through these capability traits, so any concrete driver
//! (or a mock) can stand in for it.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::HarnessResult;
use shared::{NodeStatus, ShutdownAck};

/// One node of the cluster under test
///
/// The harness never creates or destroys nodes; it only probes them and
/// asks them to shut down. Both RPCs are expected to be bounded by the
/// driver's own timeout in addition to the harness-level one.
#[mockall::automock]
#[async_trait::async_trait]
pub trait ClusterNode: Send + Sync {
    /// Network endpoint of this node
    fn endpoint(&self) -> SocketAddr;

    /// Cheap liveness/status query; also reports the node's current role
    async fn probe(&self) -> HarnessResult<NodeStatus>;

    /// Ask the node to shut down
    async fn shutdown(&self, force: bool) -> HarnessResult<ShutdownAck>;
}

/// The cluster under test, borrowed for the duration of one run
#[mockall::automock]
#[async_trait::async_trait]
pub trait Cluster: Send + Sync {
    /// All nodes, in a stable listed order
    fn nodes(&self) -> Vec<Arc<dyn ClusterNode>>;

    /// The node currently acting as leader, resolved at call time
    async fn current_leader(&self) -> HarnessResult<Arc<dyn ClusterNode>>;
}

/// Captured output of one external helper invocation
#[derive(Debug, Clone)]
pub struct HelperOutput {
    /// Exit code; `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl HelperOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout and stderr merged for the diagnostic field
    pub fn combined(&self) -> String {
        let mut text = self.stdout.trim().to_string();
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            if !text.is_empty() {
                text.push_str(" | ");
            }
            text.push_str(stderr);
        }
        text
    }
}

/// Out-of-process leader shutdown path
#[mockall::automock]
#[async_trait::async_trait]
pub trait HelperRunner: Send + Sync {
    /// Render the command template against the leader's endpoint, spawn the
    /// process and wait for it, capturing its output
    async fn run_helper(
        &self,
        command_template: &str,
        leader: SocketAddr,
    ) -> HarnessResult<HelperOutput>;
}
