use std::collections::BTreeMap;

use dtruss_core::{DirectedEdge, TrussnessPair, WorkerId};
use dtruss_graph::DirectedGraph;
use dtruss_part::{Partition, PartitionStrategy};
use dtruss_peel::{decompose, decompose_single, run_local, EngineConfig, RunConfig, Schedule};

fn e(u: u64, v: u64) -> DirectedEdge {
    DirectedEdge::from_raw(u, v)
}

#[test]
fn three_cycle_is_a_pure_cycle_truss() {
    let graph = DirectedGraph::from_pairs(&[(1, 2), (2, 3), (3, 1)]).unwrap();
    let pairs = decompose_single(&graph, &EngineConfig::default()).unwrap();
    assert_eq!(pairs.len(), 3);
    for pair in pairs.values() {
        assert_eq!(*pair, TrussnessPair::new(1, 0));
    }
}

#[test]
fn transitive_triangle_is_a_pure_flow_truss() {
    let graph = DirectedGraph::from_pairs(&[(1, 2), (1, 3), (3, 2)]).unwrap();
    let pairs = decompose_single(&graph, &EngineConfig::default()).unwrap();
    for pair in pairs.values() {
        assert_eq!(*pair, TrussnessPair::new(0, 1));
    }
}

#[test]
fn bi_linked_pair_splits_between_cycle_and_flow_trusses() {
    let graph = DirectedGraph::from_pairs(&[(1, 2), (2, 1), (2, 3), (3, 1)]).unwrap();
    let pairs = decompose_single(&graph, &EngineConfig::default()).unwrap();
    assert_eq!(
        pairs,
        BTreeMap::from([
            (e(1, 2), TrussnessPair::new(1, 0)),
            (e(2, 1), TrussnessPair::new(0, 1)),
            (e(2, 3), TrussnessPair::new(1, 1)),
            (e(3, 1), TrussnessPair::new(1, 1)),
        ])
    );
}

#[test]
fn fixed_thresholds_peel_to_a_single_fixed_point() {
    let graph = DirectedGraph::from_pairs(&[(1, 2), (2, 1), (2, 3), (3, 1)]).unwrap();
    let config = EngineConfig {
        schedule: Schedule::Fixed { k_c: 1, k_f: 1 },
        ..EngineConfig::default()
    };
    let outcomes = run_local(&graph, &Partition::single(&graph), &config).unwrap();
    let outcome = &outcomes[0];
    assert!(outcome.survivors.is_empty());
    assert!(outcome.pairs.is_empty());
    assert_eq!(outcome.peeled(), 4);
    assert_eq!(outcome.trace[0].peeled, 2);
    assert_eq!(outcome.trace[1].peeled, 2);

    let config = EngineConfig {
        schedule: Schedule::Fixed { k_c: 1, k_f: 0 },
        ..EngineConfig::default()
    };
    let outcomes = run_local(&graph, &Partition::single(&graph), &config).unwrap();
    assert_eq!(outcomes[0].survivors.len(), 3);
    assert!(!outcomes[0].survivors.contains(&e(2, 1)));
}

#[test]
fn empty_and_triangle_free_graphs_terminate() {
    let empty = DirectedGraph::from_edges(Vec::new()).unwrap();
    assert!(decompose_single(&empty, &EngineConfig::default())
        .unwrap()
        .is_empty());

    let path = DirectedGraph::from_pairs(&[(1, 2), (2, 3), (3, 4)]).unwrap();
    let pairs = decompose_single(&path, &EngineConfig::default()).unwrap();
    assert!(pairs.values().all(|pair| *pair == TrussnessPair::default()));
}

#[test]
fn stratified_run_matches_the_oracle_on_two_workers() {
    let graph =
        DirectedGraph::from_pairs(&[(1, 2), (2, 3), (3, 1), (4, 5), (4, 6), (6, 5)]).unwrap();
    let config = RunConfig {
        workers: 2,
        partition: PartitionStrategy::Stratified,
        engine: EngineConfig {
            flow_prepass: true,
            ..EngineConfig::default()
        },
    };
    let report = decompose(&graph, &config).unwrap();
    assert_eq!(report.fragment_sizes, vec![3, 3]);
    assert_eq!(report.maxima, TrussnessPair::new(1, 1));
    assert_eq!(
        report.pairs(),
        decompose_single(&graph, &EngineConfig::default()).unwrap()
    );
    assert_eq!(report.workers[0].worker, WorkerId::new(0));
    assert_eq!(report.workers[1].flow_strata, BTreeMap::from([(1, 3)]));
    assert_eq!(report.provenance.workers, 2);

    let json = report.to_json().unwrap();
    let parsed: dtruss_peel::DecompositionReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, report);
}

#[test]
fn flow_prepass_only_adds_strata() {
    let graph = DirectedGraph::from_pairs(&[
        (1, 2),
        (2, 1),
        (2, 3),
        (3, 1),
        (1, 4),
        (4, 3),
        (1, 3),
    ])
    .unwrap();
    let partition = Partition::single(&graph);
    let plain = EngineConfig::default();
    let with_prepass = EngineConfig {
        flow_prepass: true,
        ..EngineConfig::default()
    };
    let without = run_local(&graph, &partition, &plain).unwrap();
    let with = run_local(&graph, &partition, &with_prepass).unwrap();
    assert_eq!(with[0].pairs, without[0].pairs);
    assert_eq!(with[0].survivors, without[0].survivors);
    assert_eq!(with[0].trace, without[0].trace);
    assert!(without[0].flow.is_none());
    let flow = with[0].flow.as_ref().unwrap();
    assert!(!flow.strata.is_empty());
    assert_eq!(flow.strata.values().sum::<usize>(), flow.numbers.len());
}
