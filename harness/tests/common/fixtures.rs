//! Test fixtures and data for harness tests

use harness::{LeaderShutdownMethod, RunConfig};
use std::net::SocketAddr;
use std::time::Duration;

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Standard endpoints; never actually connected to by mock-based tests
    pub const LEADER: &'static str = "127.0.0.1:7001";
    pub const FOLLOWER_1: &'static str = "127.0.0.1:7002";
    pub const FOLLOWER_2: &'static str = "127.0.0.1:7003";

    pub fn leader_endpoint() -> SocketAddr {
        Self::LEADER.parse().unwrap()
    }

    pub fn follower_1() -> SocketAddr {
        Self::FOLLOWER_1.parse().unwrap()
    }

    pub fn follower_2() -> SocketAddr {
        Self::FOLLOWER_2.parse().unwrap()
    }

    /// Config with a short race window so the suite stays fast
    pub fn fast_config() -> RunConfig {
        RunConfig::default()
            .with_pre_shutdown_delay(Duration::from_millis(50))
            .with_rpc_timeout(Duration::from_millis(500))
            .with_leader_method(LeaderShutdownMethod::DirectCommand)
    }
}
