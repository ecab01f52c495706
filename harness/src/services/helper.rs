//! External helper process invocation
//!
//! The leader can be shut down by shelling out to a helper instead of
//! sending the direct command. The helper is a black box to the harness:
//! it gets the leader's endpoint substituted into a command template, and
//! its exit status and output are captured into the run report.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{HarnessError, HarnessResult};
use crate::traits::{HelperOutput, HelperRunner};
use shared::{process_debug, ProcessId};

/// Render a helper command template against the leader's endpoint.
/// `{host}`, `{port}` and `{endpoint}` are substituted in every token.
pub fn render_command(template: &str, endpoint: SocketAddr) -> HarnessResult<Vec<String>> {
    let argv: Vec<String> = template
        .split_whitespace()
        .map(|token| {
            token
                .replace("{endpoint}", &endpoint.to_string())
                .replace("{host}", &endpoint.ip().to_string())
                .replace("{port}", &endpoint.port().to_string())
        })
        .collect();
    if argv.is_empty() {
        return Err(HarnessError::config("helper_command template is empty"));
    }
    Ok(argv)
}

/// Helper runner that spawns a real child process
#[derive(Debug, Default)]
pub struct ProcessHelperRunner;

impl ProcessHelperRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HelperRunner for ProcessHelperRunner {
    async fn run_helper(
        &self,
        command_template: &str,
        leader: SocketAddr,
    ) -> HarnessResult<HelperOutput> {
        let argv = render_command(command_template, leader)?;
        process_debug!(ProcessId::current(), "Invoking helper: {}", argv.join(" "));

        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| HarnessError::HelperFailed {
                message: format!("failed to spawn '{}': {err}", argv[0]),
            })?;

        Ok(HelperOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
