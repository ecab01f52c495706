//! The race orchestrator
//!
//! Drives one reproduction run: probe every node, split the cluster into
//! leader and followers exactly once, shut the followers down in order,
//! hold the race window open, then shut the leader down through the
//! configured path. Strictly sequential: the interesting concurrency is
//! the step-down logic inside the cluster, not here.

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::config::{LeaderShutdownMethod, RunConfig};
use crate::error::{HarnessError, HarnessResult};
use crate::report::{OutcomeKind, ProbeRecord, RunReport, ShutdownOutcome};
use crate::traits::{Cluster, ClusterNode, HelperRunner};
use shared::{process_info, process_warn, ProcessId};

/// Orchestrates one shutdown-vs-step-down race reproduction
pub struct RaceOrchestrator<H>
where
    H: HelperRunner + Send + Sync + 'static,
{
    config: RunConfig,
    helper: H,

    /// Abort signal, honored between phases only
    abort_tx: mpsc::Sender<()>,
    abort_rx: mpsc::Receiver<()>,
}

impl<H> RaceOrchestrator<H>
where
    H: HelperRunner + Send + Sync + 'static,
{
    /// Create a new orchestrator with the injected helper runner
    pub fn new(config: RunConfig, helper: H) -> Self {
        let (abort_tx, abort_rx) = mpsc::channel(1);
        Self {
            config,
            helper,
            abort_tx,
            abort_rx,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Sender that aborts the run at the next phase boundary. Once the
    /// leader shutdown has started it runs to completion regardless.
    pub fn abort_handle(&self) -> mpsc::Sender<()> {
        self.abort_tx.clone()
    }

    /// Execute one reproduction run against a borrowed cluster handle.
    ///
    /// Individual node failures never abort the run; they are recorded as
    /// outcomes. The only fatal conditions are a cluster where no node
    /// answers the initial probe, an unidentifiable leader, and an invalid
    /// configuration.
    pub async fn run<C>(&mut self, cluster: &C) -> HarnessResult<RunReport>
    where
        C: Cluster + ?Sized,
    {
        self.config.validate()?;

        let mut report = RunReport::default();
        let nodes = cluster.nodes();

        process_info!(ProcessId::current(), "🔎 Probing {} nodes", nodes.len());
        for node in &nodes {
            let record = self.probe_node(node.as_ref()).await;
            match record.role {
                Some(role) => process_info!(
                    ProcessId::current(),
                    "Probe {}: {} ({})",
                    record.endpoint,
                    role,
                    record.diagnostic
                ),
                None => process_warn!(
                    ProcessId::current(),
                    "Probe {} failed: {}",
                    record.endpoint,
                    record.diagnostic
                ),
            }
            report.probes.push(record);
        }
        if !report.probes.iter().any(|p| p.ok()) {
            return Err(HarnessError::ClusterUnreachable { attempted: nodes.len() });
        }

        // The leader is identified exactly once and deliberately never
        // re-resolved: the race under reproduction lives in the gap between
        // this identification and the final shutdown, and an election in
        // that gap must go unnoticed here.
        let leader = cluster.current_leader().await?;
        let leader_endpoint = leader.endpoint();
        let followers: Vec<_> = nodes
            .iter()
            .filter(|n| n.endpoint() != leader_endpoint)
            .cloned()
            .collect();
        report.leader = Some(leader_endpoint);
        report.followers = followers.iter().map(|n| n.endpoint()).collect();
        process_info!(
            ProcessId::current(),
            "👑 Leader {} identified, {} followers",
            leader_endpoint,
            followers.len()
        );

        if self.take_abort() {
            report.aborted = true;
            return Ok(report);
        }

        process_info!(ProcessId::current(), "🛑 Shutting down followers");
        for follower in &followers {
            let outcome = self.shutdown_node(follower.as_ref()).await;
            process_info!(
                ProcessId::current(),
                "Follower {}: {} ({})",
                outcome.endpoint,
                outcome.kind,
                outcome.diagnostic
            );
            report.outcomes.push(outcome);
        }

        if self.take_abort() {
            report.aborted = true;
            return Ok(report);
        }

        // The race window. Plain sleep, no select: the delay must not be
        // interruptible or the timing stops being reproducible.
        process_info!(
            ProcessId::current(),
            "⏲️ Race window open, sleeping {:?}",
            self.config.pre_shutdown_delay
        );
        tokio::time::sleep(self.config.pre_shutdown_delay).await;
        process_info!(ProcessId::current(), "⏲️ Race window closed");

        if self.take_abort() {
            report.aborted = true;
            return Ok(report);
        }

        let outcome = match self.config.leader_method {
            LeaderShutdownMethod::DirectCommand => {
                process_info!(
                    ProcessId::current(),
                    "🛑 Shutting down leader {} via direct command",
                    leader_endpoint
                );
                self.shutdown_node(leader.as_ref()).await
            }
            LeaderShutdownMethod::ExternalHelper => {
                process_info!(
                    ProcessId::current(),
                    "🛑 Shutting down leader {} via external helper",
                    leader_endpoint
                );
                self.shutdown_leader_via_helper(leader_endpoint).await
            }
        };
        process_info!(
            ProcessId::current(),
            "Leader {}: {} ({})",
            outcome.endpoint,
            outcome.kind,
            outcome.diagnostic
        );
        report.outcomes.push(outcome);

        Ok(report)
    }

    async fn probe_node(&self, node: &dyn ClusterNode) -> ProbeRecord {
        let endpoint = node.endpoint();
        match timeout(self.config.rpc_timeout, node.probe()).await {
            Ok(Ok(status)) => ProbeRecord {
                endpoint,
                role: Some(status.role),
                diagnostic: format!("up {}s", status.uptime_seconds),
            },
            Ok(Err(err)) => ProbeRecord {
                endpoint,
                role: None,
                diagnostic: err.to_string(),
            },
            Err(_) => ProbeRecord {
                endpoint,
                role: None,
                diagnostic: format!("probe timed out after {:?}", self.config.rpc_timeout),
            },
        }
    }

    /// One shutdown RPC, bounded by the configured timeout, never retried.
    /// Failures are folded into the outcome taxonomy.
    async fn shutdown_node(&self, node: &dyn ClusterNode) -> ShutdownOutcome {
        let endpoint = node.endpoint();
        let requested_at = Utc::now();
        match timeout(
            self.config.rpc_timeout,
            node.shutdown(self.config.force_shutdown),
        )
        .await
        {
            Ok(Ok(ack)) => ShutdownOutcome {
                endpoint,
                requested_at,
                kind: OutcomeKind::Acknowledged,
                diagnostic: format!("acknowledged (forced: {})", ack.forced),
            },
            Ok(Err(err)) => ShutdownOutcome {
                endpoint,
                requested_at,
                kind: OutcomeKind::classify(&err),
                diagnostic: err.to_string(),
            },
            Err(_) => ShutdownOutcome {
                endpoint,
                requested_at,
                kind: OutcomeKind::TimedOut,
                diagnostic: format!("no reply within {:?}", self.config.rpc_timeout),
            },
        }
    }

    async fn shutdown_leader_via_helper(
        &self,
        endpoint: std::net::SocketAddr,
    ) -> ShutdownOutcome {
        let requested_at = Utc::now();
        // validate() guarantees the template is present for this method
        let template = self.config.helper_command.as_deref().unwrap_or_default();
        match self.helper.run_helper(template, endpoint).await {
            Ok(output) if output.success() => ShutdownOutcome {
                endpoint,
                requested_at,
                kind: OutcomeKind::Acknowledged,
                diagnostic: output.combined(),
            },
            Ok(output) => ShutdownOutcome {
                endpoint,
                requested_at,
                kind: OutcomeKind::OtherError,
                diagnostic: format!(
                    "helper exited with {:?}: {}",
                    output.exit_code,
                    output.combined()
                ),
            },
            Err(err) => ShutdownOutcome {
                endpoint,
                requested_at,
                kind: OutcomeKind::OtherError,
                diagnostic: err.to_string(),
            },
        }
    }

    fn take_abort(&mut self) -> bool {
        self.abort_rx.try_recv().is_ok()
    }
}
