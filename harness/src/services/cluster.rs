//! TCP cluster driver speaking the shared admin protocol
//!
//! One connection per RPC: connect, send one length-prefixed bincode
//! frame, read one back. A connection dying between the send and the
//! reply is reported as `ConnectionLost`, which is exactly the signature
//! a forced shutdown is expected to leave behind.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{HarnessError, HarnessResult};
use crate::traits::{Cluster, ClusterNode};
use shared::{read_frame, write_frame, AdminRequest, AdminResponse, NodeRole, NodeStatus, ShutdownAck, WireError};

/// Driver handle for one node's admin endpoint
#[derive(Debug, Clone)]
pub struct TcpNode {
    endpoint: SocketAddr,
    rpc_timeout: Duration,
}

impl TcpNode {
    pub fn new(endpoint: SocketAddr, rpc_timeout: Duration) -> Self {
        Self {
            endpoint,
            rpc_timeout,
        }
    }

    /// One RPC, bounded end to end by the node's timeout. A node that
    /// accepts the connection and then never replies must not stall the
    /// caller past `rpc_timeout`.
    async fn exchange(&self, request: &AdminRequest) -> HarnessResult<AdminResponse> {
        match timeout(self.rpc_timeout, self.exchange_inner(request)).await {
            Ok(reply) => reply,
            Err(_) => Err(HarnessError::RpcTimeout {
                endpoint: self.endpoint,
                timeout: self.rpc_timeout,
            }),
        }
    }

    async fn exchange_inner(&self, request: &AdminRequest) -> HarnessResult<AdminResponse> {
        let mut stream = TcpStream::connect(self.endpoint).await.map_err(|err| {
            HarnessError::ConnectionLost {
                endpoint: self.endpoint,
                message: err.to_string(),
            }
        })?;

        write_frame(&mut stream, request)
            .await
            .map_err(|err| self.map_wire(err))?;
        read_frame(&mut stream).await.map_err(|err| self.map_wire(err))
    }

    fn map_wire(&self, err: WireError) -> HarnessError {
        if err.is_connection_lost() {
            HarnessError::ConnectionLost {
                endpoint: self.endpoint,
                message: err.to_string(),
            }
        } else {
            HarnessError::WireError(err)
        }
    }

    fn rejected(&self, message: String) -> HarnessError {
        HarnessError::CommandRejected {
            endpoint: self.endpoint,
            message,
        }
    }
}

#[async_trait]
impl ClusterNode for TcpNode {
    fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    async fn probe(&self) -> HarnessResult<NodeStatus> {
        match self.exchange(&AdminRequest::Status).await? {
            AdminResponse::Status(status) => Ok(status),
            AdminResponse::Rejected(err) => Err(self.rejected(err.to_string())),
            other => Err(self.rejected(format!("unexpected reply to status: {other:?}"))),
        }
    }

    async fn shutdown(&self, force: bool) -> HarnessResult<ShutdownAck> {
        match self.exchange(&AdminRequest::Shutdown { force }).await? {
            AdminResponse::ShutdownAck(ack) => Ok(ack),
            AdminResponse::Rejected(err) => Err(self.rejected(err.to_string())),
            other => Err(self.rejected(format!("unexpected reply to shutdown: {other:?}"))),
        }
    }
}

/// Cluster handle over a fixed, ordered set of admin endpoints
pub struct TcpCluster {
    nodes: Vec<Arc<TcpNode>>,
}

impl TcpCluster {
    pub fn from_endpoints(
        endpoints: impl IntoIterator<Item = SocketAddr>,
        rpc_timeout: Duration,
    ) -> Self {
        Self {
            nodes: endpoints
                .into_iter()
                .map(|endpoint| Arc::new(TcpNode::new(endpoint, rpc_timeout)))
                .collect(),
        }
    }
}

#[async_trait]
impl Cluster for TcpCluster {
    fn nodes(&self) -> Vec<Arc<dyn ClusterNode>> {
        self.nodes
            .iter()
            .map(|node| node.clone() as Arc<dyn ClusterNode>)
            .collect()
    }

    /// First node that reports itself as leader, probed in listed order
    async fn current_leader(&self) -> HarnessResult<Arc<dyn ClusterNode>> {
        for node in &self.nodes {
            if let Ok(status) = node.probe().await {
                if status.role == NodeRole::Leader {
                    return Ok(node.clone() as Arc<dyn ClusterNode>);
                }
            }
        }
        Err(HarnessError::LeaderUnresolved)
    }
}
