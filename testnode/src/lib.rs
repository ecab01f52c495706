//! Fake cluster node speaking the admin protocol
//!
//! Stands in for a real replica when exercising the harness: it answers
//! status probes with a configured role and either acknowledges a shutdown
//! or drops the connection mid-command, the way a node dying on a forced
//! shutdown does.

use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::{TcpListener, TcpStream};

use shared::{
    process_info, process_warn, read_frame, write_frame, AdminRequest, AdminResponse, NodeRole,
    NodeStatus, ProcessId, SharedError, ShutdownAck, WireError,
};

/// How a test node reacts to admin commands
#[derive(Debug, Clone, Copy)]
pub struct NodeBehavior {
    pub role: NodeRole,
    /// Reply with an ack before going down, instead of dropping the connection
    pub ack_shutdown: bool,
    /// Refuse shutdown commands that do not carry the force flag
    pub reject_unforced: bool,
}

impl NodeBehavior {
    pub fn leader() -> Self {
        Self {
            role: NodeRole::Leader,
            ack_shutdown: true,
            reject_unforced: false,
        }
    }

    pub fn follower() -> Self {
        Self {
            role: NodeRole::Follower,
            ..Self::leader()
        }
    }

    /// Drop the connection on shutdown instead of acknowledging (fluent API)
    pub fn with_drop_on_shutdown(mut self) -> Self {
        self.ack_shutdown = false;
        self
    }

    /// Reject unforced shutdowns (fluent API)
    pub fn with_reject_unforced(mut self) -> Self {
        self.reject_unforced = true;
        self
    }
}

enum ConnectionVerdict {
    KeepServing,
    Shutdown,
}

/// A bound, not-yet-serving test node
pub struct TestNode {
    listener: TcpListener,
    behavior: NodeBehavior,
    started: Instant,
}

impl TestNode {
    pub async fn bind(addr: SocketAddr, behavior: NodeBehavior) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            behavior,
            started: Instant::now(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve admin connections until a shutdown command is accepted.
    /// One request per connection, matching how the harness drives nodes.
    pub async fn serve(self) -> std::io::Result<()> {
        loop {
            let (mut stream, peer) = self.listener.accept().await?;
            match self.handle_connection(&mut stream).await {
                Ok(ConnectionVerdict::KeepServing) => continue,
                Ok(ConnectionVerdict::Shutdown) => {
                    process_info!(
                        ProcessId::current(),
                        "Shutdown accepted from {}, going down",
                        peer
                    );
                    return Ok(());
                }
                Err(err) => {
                    // A broken client connection must not kill the node
                    process_warn!(ProcessId::current(), "Admin connection from {peer} failed: {err}");
                    continue;
                }
            }
        }
    }

    async fn handle_connection(
        &self,
        stream: &mut TcpStream,
    ) -> Result<ConnectionVerdict, WireError> {
        let request: AdminRequest = read_frame(stream).await?;
        match request {
            AdminRequest::Status => {
                let status = NodeStatus {
                    role: self.behavior.role,
                    uptime_seconds: self.started.elapsed().as_secs(),
                };
                write_frame(stream, &AdminResponse::Status(status)).await?;
                Ok(ConnectionVerdict::KeepServing)
            }
            AdminRequest::Shutdown { force } => {
                if self.behavior.reject_unforced && !force {
                    let err = SharedError::new("unforced", "shutdown requires the force flag on this node");
                    write_frame(stream, &AdminResponse::Rejected(err)).await?;
                    return Ok(ConnectionVerdict::KeepServing);
                }
                if self.behavior.ack_shutdown {
                    let ack = ShutdownAck { forced: force };
                    write_frame(stream, &AdminResponse::ShutdownAck(ack)).await?;
                }
                // Not acknowledging drops the connection with the command
                // still in flight, like a node that died on it
                Ok(ConnectionVerdict::Shutdown)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn spawn_node(behavior: NodeBehavior) -> SocketAddr {
        let node = TestNode::bind("127.0.0.1:0".parse().unwrap(), behavior)
            .await
            .unwrap();
        let addr = node.local_addr().unwrap();
        tokio::spawn(node.serve());
        addr
    }

    async fn roundtrip(addr: SocketAddr, request: AdminRequest) -> Result<AdminResponse, WireError> {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        write_frame(&mut stream, &request).await?;
        read_frame(&mut stream).await
    }

    #[tokio::test]
    async fn status_reports_the_configured_role() {
        let addr = spawn_node(NodeBehavior::leader()).await;
        let response = roundtrip(addr, AdminRequest::Status).await.unwrap();
        match response {
            AdminResponse::Status(status) => assert_eq!(status.role, NodeRole::Leader),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn acknowledging_node_replies_then_stops_serving() {
        let addr = spawn_node(NodeBehavior::follower()).await;
        let response = roundtrip(addr, AdminRequest::Shutdown { force: true })
            .await
            .unwrap();
        assert_eq!(
            response,
            AdminResponse::ShutdownAck(ShutdownAck { forced: true })
        );
    }

    #[tokio::test]
    async fn dropping_node_kills_the_connection_mid_command() {
        let addr = spawn_node(NodeBehavior::follower().with_drop_on_shutdown()).await;
        let err = roundtrip(addr, AdminRequest::Shutdown { force: true })
            .await
            .unwrap_err();
        assert!(err.is_connection_lost(), "expected connection-lost, got {err}");
    }

    #[tokio::test]
    async fn unforced_shutdown_can_be_rejected() {
        let addr = spawn_node(NodeBehavior::follower().with_reject_unforced()).await;
        let response = roundtrip(addr, AdminRequest::Shutdown { force: false })
            .await
            .unwrap();
        assert!(matches!(response, AdminResponse::Rejected(_)));

        // The node keeps serving after a rejected command
        let response = roundtrip(addr, AdminRequest::Status).await.unwrap();
        assert!(matches!(response, AdminResponse::Status(_)));
    }
}
