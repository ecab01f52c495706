//! Main entry point for the step-down race harness
//!
//! Addresses an already-running cluster through its admin endpoints and
//! reproduces the race between coordinated shutdown and leader step-down.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;

use harness::{
    services::{ProcessHelperRunner, TcpCluster},
    HarnessError, HarnessResult, LeaderShutdownMethod, RaceOrchestrator, RunConfig,
};
use shared::{logging, ProcessId};

/// Reproduces a race between cluster-wide shutdown and leader step-down
#[derive(Parser)]
#[command(name = "stepdown-race")]
#[command(about = "Shuts down followers, waits, then shuts down the leader to race its step-down")]
pub struct Args {
    /// Comma-separated node admin endpoints, e.g. 127.0.0.1:7001,127.0.0.1:7002
    #[arg(long, value_delimiter = ',', required = true)]
    pub nodes: Vec<SocketAddr>,

    /// Race window between the last follower shutdown and the leader shutdown, in seconds
    #[arg(long, default_value_t = 7.0)]
    pub pre_shutdown_delay: f64,

    /// Send forced shutdowns
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub force: bool,

    /// How the leader is shut down: direct (same command as followers) or helper (external process)
    #[arg(long, default_value = "helper")]
    pub leader_method: String,

    /// Helper command template; {host}, {port} and {endpoint} are substituted
    #[arg(long, default_value = "stepdown-helper {port}")]
    pub helper_cmd: String,

    /// Per-RPC timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub rpc_timeout: u64,

    /// Print the run report as JSON instead of the summary table
    #[arg(long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() -> HarnessResult<()> {
    let args = Args::parse();

    ProcessId::init_harness();
    logging::init_tracing_with_level(Some(&args.log_level));
    logging::log_startup(&ProcessId::current(), "step-down race harness");

    let leader_method: LeaderShutdownMethod = args
        .leader_method
        .parse()
        .map_err(HarnessError::config)?;

    if !args.pre_shutdown_delay.is_finite() || args.pre_shutdown_delay < 0.0 {
        return Err(HarnessError::config(
            "pre_shutdown_delay must be a non-negative number of seconds",
        ));
    }

    let config = RunConfig::default()
        .with_pre_shutdown_delay(Duration::from_secs_f64(args.pre_shutdown_delay))
        .with_force_shutdown(args.force)
        .with_leader_method(leader_method)
        .with_helper_command(args.helper_cmd)
        .with_rpc_timeout(Duration::from_secs(args.rpc_timeout));

    let cluster = TcpCluster::from_endpoints(args.nodes, config.rpc_timeout);
    let mut orchestrator = RaceOrchestrator::new(config, ProcessHelperRunner::new());

    // Ctrl+C aborts at the next phase boundary; the run still returns its
    // partial report.
    let abort = orchestrator.abort_handle();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                logging::log_shutdown(&ProcessId::current(), "Received Ctrl+C signal");
                let _ = abort.send(()).await;
            }
            Err(err) => {
                logging::log_error(&ProcessId::current(), "Signal handling", &err);
            }
        }
    });

    // Fatal errors (unreachable cluster, unresolvable leader, bad config)
    // propagate for a nonzero exit; per-node failures are in the report.
    let report = orchestrator.run(&cluster).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary_table());
    }
    if report.aborted {
        logging::log_shutdown(&ProcessId::current(), "Run aborted before the leader shutdown");
    } else {
        logging::log_success(
            &ProcessId::current(),
            "Run completed; inspect the outcomes above for the race signature",
        );
    }
    Ok(())
}
