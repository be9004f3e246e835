use std::collections::BTreeMap;

use dtruss_core::{DirectedEdge, Supports, TrussnessPair, WorkerId};
use dtruss_graph::DirectedGraph;
use dtruss_part::{Fragment, Partition};
use dtruss_peel::{flow_decomposition, EngineConfig, RunConfig, Schedule, WorkerState};

fn e(u: u64, v: u64) -> DirectedEdge {
    DirectedEdge::from_raw(u, v)
}

fn fragment(pairs: &[(u64, u64)], owners: &[usize], worker: usize, workers: usize) -> Fragment {
    let graph = DirectedGraph::from_pairs(pairs).unwrap();
    let assignment: BTreeMap<_, _> = pairs
        .iter()
        .zip(owners)
        .map(|((u, v), owner)| (e(*u, *v), WorkerId::new(*owner)))
        .collect();
    Partition::from_assignment(workers, assignment)
        .unwrap()
        .fragment_for(&graph, WorkerId::new(worker))
        .unwrap()
}

#[test]
fn triangle_is_discounted_once_when_two_edges_leave_together() {
    // Worker 0 owns (3, 1); the two other cycle edges belong to peers.
    let mut state = WorkerState::new(fragment(&[(1, 2), (2, 3), (3, 1)], &[1, 2, 0], 0, 3));
    assert_eq!(state.supports(&e(3, 1)), Some(Supports::new(1, 0)));

    assert!(state.remove(&e(1, 2)).unwrap());
    assert_eq!(state.supports(&e(3, 1)), Some(Supports::new(0, 0)));
    assert!(state.remove(&e(2, 3)).unwrap());
    assert_eq!(state.supports(&e(3, 1)), Some(Supports::new(0, 0)));
}

#[test]
fn repeated_removal_is_ignored() {
    let mut state = WorkerState::new(fragment(&[(1, 2), (1, 3), (3, 2)], &[0, 0, 0], 0, 1));
    assert!(state.remove(&e(1, 3)).unwrap());
    assert!(!state.remove(&e(1, 3)).unwrap());
    assert_eq!(state.supports(&e(1, 2)), Some(Supports::new(0, 0)));
    assert_eq!(state.supports(&e(3, 2)), Some(Supports::new(0, 0)));
    assert_eq!(state.alive().len(), 2);
}

#[test]
fn candidates_and_routing_follow_thresholds() {
    let state = WorkerState::new(fragment(
        &[(1, 2), (2, 3), (3, 1), (3, 4)],
        &[0, 0, 1, 0],
        0,
        2,
    ));
    assert_eq!(state.candidates(TrussnessPair::new(0, 0)), Vec::new());
    assert_eq!(
        state.candidates(TrussnessPair::new(1, 0)),
        vec![e(3, 4)]
    );
    assert_eq!(
        state.routed(&[e(1, 2), e(3, 4)], WorkerId::new(1)),
        vec![e(1, 2), e(3, 4)]
    );
    assert_eq!(state.supports_for(WorkerId::new(1)).len(), 3);
}

#[test]
fn reconciliation_only_touches_replicas() {
    let mut state = WorkerState::new(fragment(&[(1, 2), (2, 3), (3, 4)], &[0, 1, 1], 0, 2));
    let changed = state.reconcile(&[
        (e(2, 3), Supports::new(5, 5)),
        (e(1, 2), Supports::new(9, 9)),
        (e(7, 8), Supports::new(1, 1)),
    ]);
    assert_eq!(changed, 1);
    assert_eq!(state.supports(&e(2, 3)), Some(Supports::new(5, 5)));
    assert_eq!(state.supports(&e(1, 2)), Some(Supports::new(0, 0)));
}

#[test]
fn flow_prepass_counts_only_fully_owned_triangles() {
    let pairs = [(1, 2), (1, 3), (3, 2), (4, 5), (4, 6), (6, 5)];
    let flow = flow_decomposition(&fragment(&pairs, &[0, 0, 0, 0, 0, 1], 0, 2)).unwrap();
    assert_eq!(flow.strata, BTreeMap::from([(1, 3)]));
    assert_eq!(flow.numbers.get(&e(4, 5)), None);
    assert_eq!(flow.numbers.get(&e(1, 2)), Some(&1));
}

#[test]
fn run_config_reads_from_yaml() {
    let yaml = "workers: 3\npartition:\n  type: stratified\nengine:\n  schedule:\n    type: fixed\n    k_c: 2\n    k_f: 1\n  flow_prepass: true\n";
    let config: RunConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.workers, 3);
    assert!(config.partition.needs_pairs());
    assert_eq!(config.engine.schedule, Schedule::Fixed { k_c: 2, k_f: 1 });
    assert_eq!(config.engine.sync_timeout_ms, 30_000);
    config.validate().unwrap();

    let defaults: RunConfig = serde_yaml::from_str("{}").unwrap();
    assert_eq!(defaults, RunConfig::default());

    let invalid = EngineConfig {
        sync_timeout_ms: 0,
        ..EngineConfig::default()
    };
    assert_eq!(invalid.validate().unwrap_err().code(), "invalid-timeout");
}

#[test]
fn stratified_config_turns_the_flow_prepass_on_unless_set() {
    let config = RunConfig::from_yaml("workers: 2\npartition:\n  type: stratified\n").unwrap();
    assert!(config.engine.flow_prepass);

    let explicit = RunConfig::from_yaml(
        "workers: 2\npartition:\n  type: stratified\nengine:\n  flow_prepass: false\n",
    )
    .unwrap();
    assert!(!explicit.engine.flow_prepass);

    let type_aware = RunConfig::from_yaml("workers: 2\n").unwrap();
    assert!(!type_aware.engine.flow_prepass);

    let err = RunConfig::from_yaml("workers: [").unwrap_err();
    assert_eq!(err.code(), "parse-config");
}

#[test]
fn removing_one_direction_keeps_the_reverse_triangles() {
    let mut state = WorkerState::new(fragment(
        &[(1, 2), (2, 1), (2, 3), (3, 1)],
        &[0, 0, 0, 0],
        0,
        1,
    ));
    assert_eq!(state.supports(&e(2, 3)), Some(Supports::new(1, 1)));

    assert!(state.remove(&e(2, 1)).unwrap());
    assert_eq!(state.supports(&e(1, 2)), Some(Supports::new(1, 0)));
    assert_eq!(state.supports(&e(2, 3)), Some(Supports::new(1, 0)));
    assert_eq!(state.supports(&e(3, 1)), Some(Supports::new(1, 0)));

    assert!(state.remove(&e(1, 2)).unwrap());
    assert_eq!(state.supports(&e(2, 3)), Some(Supports::new(0, 0)));
    assert_eq!(state.supports(&e(3, 1)), Some(Supports::new(0, 0)));
}
