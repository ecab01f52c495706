//! Run report: what happened to every node that was addressed

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::net::SocketAddr;

use crate::error::HarnessError;
use shared::NodeRole;

/// Classification of one shutdown attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutcomeKind {
    /// The node replied before going down
    Acknowledged,
    /// The connection died while the command was in flight, the usual
    /// signature of a forced shutdown taking effect
    ConnectionLost,
    /// No reply within the configured RPC timeout
    TimedOut,
    /// Anything else: rejection, helper failure, codec trouble
    OtherError,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::Acknowledged => write!(f, "acknowledged"),
            OutcomeKind::ConnectionLost => write!(f, "connection-lost"),
            OutcomeKind::TimedOut => write!(f, "timed-out"),
            OutcomeKind::OtherError => write!(f, "other-error"),
        }
    }
}

impl OutcomeKind {
    /// Fold a per-node error into the outcome taxonomy
    pub fn classify(err: &HarnessError) -> Self {
        match err {
            HarnessError::RpcTimeout { .. } => OutcomeKind::TimedOut,
            HarnessError::ConnectionLost { .. } => OutcomeKind::ConnectionLost,
            HarnessError::WireError(wire) if wire.is_connection_lost() => OutcomeKind::ConnectionLost,
            _ => OutcomeKind::OtherError,
        }
    }
}

/// Result of one shutdown attempt, immutable once recorded
#[derive(Debug, Clone, Serialize)]
pub struct ShutdownOutcome {
    pub endpoint: SocketAddr,
    pub requested_at: DateTime<Utc>,
    pub kind: OutcomeKind,
    pub diagnostic: String,
}

/// Result of one liveness probe
#[derive(Debug, Clone, Serialize)]
pub struct ProbeRecord {
    pub endpoint: SocketAddr,
    /// Role the node reported; `None` when the probe failed
    pub role: Option<NodeRole>,
    pub diagnostic: String,
}

impl ProbeRecord {
    pub fn ok(&self) -> bool {
        self.role.is_some()
    }
}

/// Everything one run did, in the order it did it
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub probes: Vec<ProbeRecord>,
    /// Leader endpoint identified once at the start of the run
    pub leader: Option<SocketAddr>,
    /// Follower endpoints in listed order
    pub followers: Vec<SocketAddr>,
    /// One outcome per shutdown request, in send order, leader last
    pub outcomes: Vec<ShutdownOutcome>,
    /// True when an external abort stopped the run between phases
    pub aborted: bool,
}

impl RunReport {
    /// The leader's shutdown outcome, present once the run reached the
    /// final phase
    pub fn leader_outcome(&self) -> Option<&ShutdownOutcome> {
        let leader = self.leader?;
        self.outcomes.iter().rev().find(|o| o.endpoint == leader)
    }

    /// Outcomes of the follower shutdowns, in send order
    pub fn follower_outcomes(&self) -> impl Iterator<Item = &ShutdownOutcome> {
        self.outcomes
            .iter()
            .filter(move |o| Some(o.endpoint) != self.leader)
    }

    /// Human-readable summary printed at the end of a run
    pub fn summary_table(&self) -> String {
        let mut table = String::new();
        match self.leader {
            Some(leader) => table.push_str(&format!(
                "leader: {leader}, followers: {}, aborted: {}\n",
                self.followers.len(),
                if self.aborted { "yes" } else { "no" }
            )),
            None => table.push_str("leader: <not identified>\n"),
        }
        table.push_str(&format!(
            "{:<22} {:<9} {:<16} {:<27} diagnostic\n",
            "node", "phase", "outcome", "requested at"
        ));
        for outcome in &self.outcomes {
            let phase = if Some(outcome.endpoint) == self.leader {
                "leader"
            } else {
                "follower"
            };
            table.push_str(&format!(
                "{:<22} {:<9} {:<16} {:<27} {}\n",
                outcome.endpoint.to_string(),
                phase,
                outcome.kind.to_string(),
                outcome.requested_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                outcome.diagnostic
            ));
        }
        for probe in self.probes.iter().filter(|p| !p.ok()) {
            table.push_str(&format!(
                "probe failure on {}: {}\n",
                probe.endpoint, probe.diagnostic
            ));
        }
        table
    }
}
