//! Standalone fake node binary for manual race reproductions

use clap::Parser;
use std::net::SocketAddr;

use shared::{logging, NodeRole, ProcessId};
use testnode::{NodeBehavior, TestNode};

/// Fake cluster node speaking the admin protocol
#[derive(Parser)]
#[command(name = "testnode")]
#[command(about = "Runs a fake cluster node until it is told to shut down")]
struct Args {
    /// Port to listen on
    #[arg(long)]
    port: u16,

    /// Role this node reports: leader or follower
    #[arg(long, default_value = "follower")]
    role: String,

    /// Drop the admin connection on shutdown instead of acknowledging
    #[arg(long)]
    drop_on_shutdown: bool,

    /// Reject shutdown commands without the force flag
    #[arg(long)]
    reject_unforced: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    ProcessId::init_node(args.port);
    logging::init_tracing_with_level(Some(&args.log_level));

    let role: NodeRole = match args.role.parse() {
        Ok(role) => role,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    let mut behavior = match role {
        NodeRole::Leader => NodeBehavior::leader(),
        NodeRole::Follower => NodeBehavior::follower(),
    };
    if args.drop_on_shutdown {
        behavior = behavior.with_drop_on_shutdown();
    }
    if args.reject_unforced {
        behavior = behavior.with_reject_unforced();
    }

    let addr: SocketAddr = ([127, 0, 0, 1], args.port).into();
    let node = TestNode::bind(addr, behavior).await?;
    logging::log_startup(&ProcessId::current(), &format!("{role} node on {addr}"));

    node.serve().await?;
    logging::log_shutdown(&ProcessId::current(), "shutdown command accepted");
    Ok(())
}
