//! Out-of-process leader shutdown helper
//!
//! Sends a single shutdown command to one node over the admin protocol.
//! Losing the connection while waiting for the reply is the expected way
//! a forced shutdown ends, so it is reported on stdout and the helper
//! exits clean; protocol-level failures exit nonzero so the harness can
//! record them.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;

use shared::{logging, read_frame, write_frame, AdminRequest, AdminResponse, ProcessId, WireError};

/// Sends one shutdown command to a node's admin endpoint
#[derive(Parser)]
#[command(name = "stepdown-helper")]
#[command(about = "Shuts down a single node over the admin protocol")]
struct Args {
    /// Target as host:port, or a bare port on 127.0.0.1
    target: String,

    /// Send a forced shutdown
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    force: bool,

    /// Connect and reply timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_target(raw: &str) -> Result<SocketAddr, String> {
    if let Ok(addr) = raw.parse::<SocketAddr>() {
        return Ok(addr);
    }
    raw.parse::<u16>()
        .map(|port| SocketAddr::from(([127, 0, 0, 1], port)))
        .map_err(|_| format!("invalid target '{raw}': expected host:port or a port number"))
}

async fn send_shutdown(
    endpoint: SocketAddr,
    force: bool,
    timeout: Duration,
) -> Result<AdminResponse, WireError> {
    let timed_out = || {
        WireError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "no reply within the timeout",
        ))
    };

    let connected = tokio::time::timeout(timeout, TcpStream::connect(endpoint))
        .await
        .map_err(|_| timed_out())?;
    let mut stream = connected.map_err(WireError::Io)?;

    // The whole send-and-wait exchange shares one timeout; a node that
    // accepts the connection but never drains the request must not hang us
    tokio::time::timeout(timeout, async {
        write_frame(&mut stream, &AdminRequest::Shutdown { force }).await?;
        read_frame(&mut stream).await
    })
    .await
    .map_err(|_| timed_out())?
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    ProcessId::init_helper();
    logging::init_tracing_with_level(Some(&args.log_level));

    let endpoint = match parse_target(&args.target) {
        Ok(endpoint) => endpoint,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    match send_shutdown(endpoint, args.force, Duration::from_secs(args.timeout)).await {
        Ok(AdminResponse::ShutdownAck(ack)) => {
            println!("shutdown acknowledged by {endpoint} (forced: {})", ack.forced);
        }
        Ok(AdminResponse::Rejected(err)) => {
            eprintln!("shutdown rejected by {endpoint}: {err}");
            std::process::exit(2);
        }
        Ok(other) => {
            eprintln!("unexpected reply from {endpoint}: {other:?}");
            std::process::exit(2);
        }
        // The node dropping the connection (or never answering) is the
        // normal end of a forced shutdown; report it and exit clean.
        Err(err) if err.is_connection_lost() => {
            println!("connection to {endpoint} lost: {err}");
        }
        Err(err) => {
            eprintln!("helper failed against {endpoint}: {err}");
            std::process::exit(2);
        }
    }

    println!("exiting");
}
