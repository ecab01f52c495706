//! Run configuration, immutable for the duration of one run

use std::fmt;
use std::time::Duration;

use crate::error::{HarnessError, HarnessResult};

/// How the leader is shut down once the race window closes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderShutdownMethod {
    /// Send the same shutdown command used for the followers
    DirectCommand,
    /// Shell out to an external helper process with the leader's endpoint
    ExternalHelper,
}

impl fmt::Display for LeaderShutdownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaderShutdownMethod::DirectCommand => write!(f, "direct"),
            LeaderShutdownMethod::ExternalHelper => write!(f, "helper"),
        }
    }
}

impl std::str::FromStr for LeaderShutdownMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(LeaderShutdownMethod::DirectCommand),
            "helper" | "external" => Ok(LeaderShutdownMethod::ExternalHelper),
            _ => Err(format!("Unknown leader method '{s}'. Valid options: direct, helper")),
        }
    }
}

/// Configuration for one race reproduction run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Race window between the last follower shutdown and the leader shutdown
    pub pre_shutdown_delay: Duration,

    /// Whether shutdown requests carry the force flag
    pub force_shutdown: bool,

    /// Code path used for the leader shutdown
    pub leader_method: LeaderShutdownMethod,

    /// Helper command template; {host}, {port} and {endpoint} are substituted
    pub helper_command: Option<String>,

    /// Bound on every individual probe or shutdown RPC
    pub rpc_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pre_shutdown_delay: Duration::from_secs(7),
            force_shutdown: true,
            leader_method: LeaderShutdownMethod::DirectCommand,
            helper_command: None,
            rpc_timeout: Duration::from_secs(10),
        }
    }
}

impl RunConfig {
    /// Configure the race window (fluent API)
    pub fn with_pre_shutdown_delay(mut self, delay: Duration) -> Self {
        self.pre_shutdown_delay = delay;
        self
    }

    /// Configure forced shutdown (fluent API)
    pub fn with_force_shutdown(mut self, force: bool) -> Self {
        self.force_shutdown = force;
        self
    }

    /// Configure the leader shutdown method (fluent API)
    pub fn with_leader_method(mut self, method: LeaderShutdownMethod) -> Self {
        self.leader_method = method;
        self
    }

    /// Configure the helper command template (fluent API)
    pub fn with_helper_command(mut self, template: impl Into<String>) -> Self {
        self.helper_command = Some(template.into());
        self
    }

    /// Configure the per-RPC timeout (fluent API)
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    /// Check the configuration is runnable before any node is contacted
    pub fn validate(&self) -> HarnessResult<()> {
        if self.rpc_timeout.is_zero() {
            return Err(HarnessError::config("rpc_timeout must be nonzero"));
        }
        if self.leader_method == LeaderShutdownMethod::ExternalHelper
            && self.helper_command.as_deref().map_or(true, |t| t.trim().is_empty())
        {
            return Err(HarnessError::config(
                "helper_command is required when leader_method is helper",
            ));
        }
        Ok(())
    }
}
