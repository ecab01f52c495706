//! Test helpers and mock builders for harness tests
//!
//! Mock node factories cover the behaviors a real cluster exhibits during
//! a shutdown race: acknowledging, dying mid-command, being unreachable,
//! and hanging past the RPC timeout.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use harness::{
    ClusterNode, HarnessError, HarnessResult, MockCluster, MockClusterNode, MockHelperRunner,
    RaceOrchestrator, RunConfig,
};
use shared::{NodeRole, NodeStatus, ShutdownAck};

/// Node that answers its probe and acknowledges shutdown
pub fn healthy_node(endpoint: SocketAddr, role: NodeRole) -> Arc<dyn ClusterNode> {
    let mut node = MockClusterNode::new();
    node.expect_endpoint().return_const(endpoint);
    node.expect_probe()
        .returning(move || Ok(NodeStatus { role, uptime_seconds: 1 }));
    node.expect_shutdown()
        .returning(|force| Ok(ShutdownAck { forced: force }));
    Arc::new(node)
}

/// Node that answers its probe but drops the connection on shutdown
pub fn dying_node(endpoint: SocketAddr, role: NodeRole) -> Arc<dyn ClusterNode> {
    let mut node = MockClusterNode::new();
    node.expect_endpoint().return_const(endpoint);
    node.expect_probe()
        .returning(move || Ok(NodeStatus { role, uptime_seconds: 1 }));
    node.expect_shutdown().returning(move |_| {
        Err(HarnessError::ConnectionLost {
            endpoint,
            message: "connection reset by peer".to_string(),
        })
    });
    Arc::new(node)
}

/// Node that refuses the shutdown command outright
pub fn rejecting_node(endpoint: SocketAddr, role: NodeRole) -> Arc<dyn ClusterNode> {
    let mut node = MockClusterNode::new();
    node.expect_endpoint().return_const(endpoint);
    node.expect_probe()
        .returning(move || Ok(NodeStatus { role, uptime_seconds: 1 }));
    node.expect_shutdown().returning(move |_| {
        Err(HarnessError::CommandRejected {
            endpoint,
            message: "shutdown rejected".to_string(),
        })
    });
    Arc::new(node)
}

/// Node that never answers anything, probes and shutdowns alike
pub fn deaf_node(endpoint: SocketAddr) -> Arc<dyn ClusterNode> {
    let mut node = MockClusterNode::new();
    node.expect_endpoint().return_const(endpoint);
    node.expect_probe().returning(move || {
        Err(HarnessError::ConnectionLost {
            endpoint,
            message: "connection refused".to_string(),
        })
    });
    node.expect_shutdown().returning(move |_| {
        Err(HarnessError::ConnectionLost {
            endpoint,
            message: "connection refused".to_string(),
        })
    });
    Arc::new(node)
}

/// Node whose shutdown RPC hangs past any sensible timeout
pub struct HangingNode {
    pub endpoint: SocketAddr,
    pub role: NodeRole,
}

#[async_trait::async_trait]
impl ClusterNode for HangingNode {
    fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    async fn probe(&self) -> HarnessResult<NodeStatus> {
        Ok(NodeStatus {
            role: self.role,
            uptime_seconds: 1,
        })
    }

    async fn shutdown(&self, _force: bool) -> HarnessResult<ShutdownAck> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        unreachable!("the harness-level RPC timeout should fire first")
    }
}

/// Cluster handle over pre-built mock nodes; `leader_index` picks which
/// node `current_leader` resolves to
pub fn cluster_of(nodes: Vec<Arc<dyn ClusterNode>>, leader_index: usize) -> MockCluster {
    let leader = nodes[leader_index].clone();
    let mut cluster = MockCluster::new();
    let listed = nodes.clone();
    cluster.expect_nodes().returning(move || listed.clone());
    cluster
        .expect_current_leader()
        .returning(move || Ok(leader.clone()));
    cluster
}

/// Orchestrator whose helper runner must never be invoked
pub fn direct_orchestrator(config: RunConfig) -> RaceOrchestrator<MockHelperRunner> {
    let mut helper = MockHelperRunner::new();
    helper.expect_run_helper().times(0);
    RaceOrchestrator::new(config, helper)
}
