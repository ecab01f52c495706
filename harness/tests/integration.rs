//! End-to-end tests for the race orchestrator
//!
//! Runs the full probe → followers → window → leader sequence against mock
//! clusters, real helper processes, and in-process fake TCP nodes.

use std::sync::Arc;
use std::time::Duration;

use harness::services::{ProcessHelperRunner, TcpCluster};
use harness::{
    HarnessError, HelperOutput, LeaderShutdownMethod, MockHelperRunner, OutcomeKind,
    RaceOrchestrator,
};
use shared::NodeRole;
use testnode::{NodeBehavior, TestNode};

mod common;
use common::{
    cluster_of, deaf_node, direct_orchestrator, dying_node, healthy_node, rejecting_node,
    HangingNode, TestFixtures,
};

/// Every addressed node gets exactly one outcome, followers first, leader last
#[tokio::test]
async fn run_records_one_outcome_per_node_leader_last() {
    let leader = healthy_node(TestFixtures::leader_endpoint(), NodeRole::Leader);
    let follower_1 = healthy_node(TestFixtures::follower_1(), NodeRole::Follower);
    let follower_2 = healthy_node(TestFixtures::follower_2(), NodeRole::Follower);
    let cluster = cluster_of(vec![follower_1, follower_2, leader], 2);

    let mut orchestrator = direct_orchestrator(TestFixtures::fast_config());
    let report = orchestrator.run(&cluster).await.unwrap();

    assert!(!report.aborted);
    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.outcomes[0].endpoint, TestFixtures::follower_1());
    assert_eq!(report.outcomes[1].endpoint, TestFixtures::follower_2());
    assert_eq!(
        report.outcomes[2].endpoint,
        TestFixtures::leader_endpoint()
    );
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.kind == OutcomeKind::Acknowledged));
    assert_eq!(report.leader, Some(TestFixtures::leader_endpoint()));
}

/// A follower failing its shutdown must not stop the rest of the sequence
#[tokio::test]
async fn follower_failure_does_not_abort_the_run() {
    let leader = healthy_node(TestFixtures::leader_endpoint(), NodeRole::Leader);
    let dying = dying_node(TestFixtures::follower_1(), NodeRole::Follower);
    let healthy = healthy_node(TestFixtures::follower_2(), NodeRole::Follower);
    let cluster = cluster_of(vec![dying, healthy, leader], 2);

    let mut orchestrator = direct_orchestrator(TestFixtures::fast_config());
    let report = orchestrator.run(&cluster).await.unwrap();

    let kinds: Vec<_> = report.outcomes.iter().map(|o| o.kind).collect();
    assert_eq!(
        kinds,
        vec![
            OutcomeKind::ConnectionLost,
            OutcomeKind::Acknowledged,
            OutcomeKind::Acknowledged,
        ]
    );
}

/// A rejected shutdown is an OtherError outcome, not a run failure
#[tokio::test]
async fn rejected_shutdown_is_recorded_as_other_error() {
    let leader = healthy_node(TestFixtures::leader_endpoint(), NodeRole::Leader);
    let rejecting = rejecting_node(TestFixtures::follower_1(), NodeRole::Follower);
    let cluster = cluster_of(vec![rejecting, leader], 1);

    let mut orchestrator = direct_orchestrator(TestFixtures::fast_config());
    let report = orchestrator.run(&cluster).await.unwrap();

    assert_eq!(report.outcomes[0].kind, OutcomeKind::OtherError);
    assert_eq!(report.outcomes[1].kind, OutcomeKind::Acknowledged);
}

/// When no node answers the probe, nothing is shut down and the run is fatal
#[tokio::test]
async fn totally_unreachable_cluster_is_fatal() {
    let node_1 = deaf_node(TestFixtures::follower_1());
    let node_2 = deaf_node(TestFixtures::follower_2());

    let mut cluster = harness::MockCluster::new();
    let listed = vec![node_1, node_2];
    cluster.expect_nodes().returning(move || listed.clone());
    cluster.expect_current_leader().times(0);

    let mut orchestrator = direct_orchestrator(TestFixtures::fast_config());
    let err = orchestrator.run(&cluster).await.unwrap_err();

    assert!(matches!(
        err,
        HarnessError::ClusterUnreachable { attempted: 2 }
    ));
    assert!(err.is_fatal());
}

/// The race window separates the last follower request from the leader request
#[tokio::test]
async fn race_window_delays_the_leader_shutdown() {
    let leader = healthy_node(TestFixtures::leader_endpoint(), NodeRole::Leader);
    let follower = healthy_node(TestFixtures::follower_1(), NodeRole::Follower);
    let cluster = cluster_of(vec![follower, leader], 1);

    let window = Duration::from_millis(300);
    let config = TestFixtures::fast_config().with_pre_shutdown_delay(window);
    let mut orchestrator = direct_orchestrator(config);
    let report = orchestrator.run(&cluster).await.unwrap();

    assert_eq!(report.outcomes.len(), 2);
    let follower_at = report.outcomes[0].requested_at;
    let leader_at = report.outcomes[1].requested_at;
    let gap = (leader_at - follower_at).num_milliseconds();
    assert!(gap >= 300, "race window too short: {gap}ms");
    assert!(gap < 5_000, "race window implausibly long: {gap}ms");
}

/// A helper process exiting nonzero records OtherError and keeps the report
#[tokio::test]
async fn failing_helper_is_an_outcome_not_a_crash() {
    let leader = healthy_node(TestFixtures::leader_endpoint(), NodeRole::Leader);
    let follower = healthy_node(TestFixtures::follower_1(), NodeRole::Follower);
    let cluster = cluster_of(vec![follower, leader], 1);

    let mut helper = MockHelperRunner::new();
    helper.expect_run_helper().times(1).returning(|_, _| {
        Ok(HelperOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "could not reach primary".to_string(),
        })
    });

    let config = TestFixtures::fast_config()
        .with_leader_method(LeaderShutdownMethod::ExternalHelper)
        .with_helper_command("stepdown-helper {port}");
    let mut orchestrator = RaceOrchestrator::new(config, helper);
    let report = orchestrator.run(&cluster).await.unwrap();

    let leader_outcome = report.leader_outcome().unwrap();
    assert_eq!(leader_outcome.kind, OutcomeKind::OtherError);
    assert!(leader_outcome.diagnostic.contains("could not reach primary"));
}

/// A helper that cannot even be spawned is likewise folded into the outcome
#[tokio::test]
async fn unspawnable_helper_is_an_outcome_not_a_crash() {
    let leader = healthy_node(TestFixtures::leader_endpoint(), NodeRole::Leader);
    let cluster = cluster_of(vec![leader], 0);

    let config = TestFixtures::fast_config()
        .with_leader_method(LeaderShutdownMethod::ExternalHelper)
        .with_helper_command("definitely-not-a-real-binary {port}");
    let mut orchestrator = RaceOrchestrator::new(config, ProcessHelperRunner::new());
    let report = orchestrator.run(&cluster).await.unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].kind, OutcomeKind::OtherError);
}

/// A successful real helper invocation lands as the leader's acknowledgement
#[tokio::test]
async fn real_helper_process_output_is_captured() {
    let leader = healthy_node(TestFixtures::leader_endpoint(), NodeRole::Leader);
    let cluster = cluster_of(vec![leader], 0);

    let config = TestFixtures::fast_config()
        .with_leader_method(LeaderShutdownMethod::ExternalHelper)
        .with_helper_command("echo sent shutdown to {endpoint}");
    let mut orchestrator = RaceOrchestrator::new(config, ProcessHelperRunner::new());
    let report = orchestrator.run(&cluster).await.unwrap();

    let outcome = report.leader_outcome().unwrap();
    assert_eq!(outcome.kind, OutcomeKind::Acknowledged);
    assert!(outcome.diagnostic.contains("127.0.0.1:7001"));
}

/// A shutdown RPC that hangs is recorded as TimedOut, never retried
#[tokio::test]
async fn hanging_shutdown_times_out_and_the_run_continues() {
    let leader = healthy_node(TestFixtures::leader_endpoint(), NodeRole::Leader);
    let hanging: Arc<dyn harness::ClusterNode> = Arc::new(HangingNode {
        endpoint: TestFixtures::follower_1(),
        role: NodeRole::Follower,
    });
    let cluster = cluster_of(vec![hanging, leader], 1);

    let config = TestFixtures::fast_config().with_rpc_timeout(Duration::from_millis(100));
    let mut orchestrator = direct_orchestrator(config);
    let report = orchestrator.run(&cluster).await.unwrap();

    assert_eq!(report.outcomes[0].kind, OutcomeKind::TimedOut);
    assert_eq!(report.outcomes[1].kind, OutcomeKind::Acknowledged);
}

/// Full TCP round trip against in-process fake nodes: the follower drops
/// its connection mid-command, the leader acknowledges
#[tokio::test]
async fn tcp_cluster_end_to_end() {
    let follower = TestNode::bind(
        "127.0.0.1:0".parse().unwrap(),
        NodeBehavior::follower().with_drop_on_shutdown(),
    )
    .await
    .unwrap();
    let leader = TestNode::bind("127.0.0.1:0".parse().unwrap(), NodeBehavior::leader())
        .await
        .unwrap();

    let follower_addr = follower.local_addr().unwrap();
    let leader_addr = leader.local_addr().unwrap();
    tokio::spawn(follower.serve());
    tokio::spawn(leader.serve());

    let cluster = TcpCluster::from_endpoints(
        vec![follower_addr, leader_addr],
        Duration::from_secs(2),
    );
    let mut orchestrator = direct_orchestrator(TestFixtures::fast_config());
    let report = orchestrator.run(&cluster).await.unwrap();

    assert_eq!(report.leader, Some(leader_addr));
    assert_eq!(report.followers, vec![follower_addr]);
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[0].endpoint, follower_addr);
    assert_eq!(report.outcomes[0].kind, OutcomeKind::ConnectionLost);
    assert_eq!(report.outcomes[1].endpoint, leader_addr);
    assert_eq!(report.outcomes[1].kind, OutcomeKind::Acknowledged);
}
