//! Concrete service implementations behind the capability traits

pub mod cluster;
pub mod helper;

pub use cluster::{TcpCluster, TcpNode};
pub use helper::ProcessHelperRunner;
