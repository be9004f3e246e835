use std::collections::{BTreeMap, BTreeSet};

use dtruss_core::{DirectedEdge, TrussError, TrussnessPair, WorkerId};
use dtruss_graph::{DirectedGraph, TriangleKind};
use dtruss_part::{
    stratified_partition, type_aware_partition, Partition, PartitionStrategy, TypeAwareOptions,
};

fn e(u: u64, v: u64) -> DirectedEdge {
    DirectedEdge::from_raw(u, v)
}

fn six_edge_graph() -> (DirectedGraph, BTreeMap<DirectedEdge, TrussnessPair>) {
    let graph =
        DirectedGraph::from_pairs(&[(1, 2), (2, 3), (3, 1), (4, 5), (4, 6), (6, 5)]).unwrap();
    let mut pairs = BTreeMap::new();
    for edge in [e(1, 2), e(2, 3), e(3, 1)] {
        pairs.insert(edge, TrussnessPair::new(1, 0));
    }
    for edge in [e(4, 5), e(4, 6), e(6, 5)] {
        pairs.insert(edge, TrussnessPair::new(0, 1));
    }
    (graph, pairs)
}

#[test]
fn stratified_two_workers_respects_budget() {
    let (graph, pairs) = six_edge_graph();
    let partition = stratified_partition(&graph, 2, &pairs).unwrap();
    partition.validate(&graph).unwrap();
    assert_eq!(partition.sizes(), vec![3, 3]);

    let first = partition.owned_by(WorkerId::new(0));
    let second = partition.owned_by(WorkerId::new(1));
    assert!(first.is_disjoint(&second));
    let union: BTreeSet<_> = first.union(&second).copied().collect();
    assert_eq!(&union, graph.edges());

    let budget = pairs.values().map(|p| p.k_f as u64).sum::<u64>() / 2;
    let first_weight: u64 = first.iter().map(|edge| pairs[edge].k_f as u64).sum();
    assert!(first_weight <= budget);
}

#[test]
fn stratified_leaves_middle_fragments_empty_when_strata_run_out() {
    let (graph, pairs) = six_edge_graph();
    let partition = stratified_partition(&graph, 4, &pairs).unwrap();
    partition.validate(&graph).unwrap();
    assert_eq!(partition.sizes(), vec![3, 0, 0, 3]);
}

#[test]
fn stratified_requires_a_pair_for_every_edge() {
    let (graph, mut pairs) = six_edge_graph();
    pairs.remove(&e(4, 6));
    let err = stratified_partition(&graph, 2, &pairs).unwrap_err();
    assert!(matches!(err, TrussError::Input(_)));
    assert_eq!(err.code(), "missing-trussness");
}

#[test]
fn invalid_parameters_are_partition_errors() {
    let (graph, pairs) = six_edge_graph();
    let err = stratified_partition(&graph, 0, &pairs).unwrap_err();
    assert!(matches!(err, TrussError::Partition(_)));

    let options = TypeAwareOptions {
        workers: 2,
        epsilon: 0.5,
        kind: TriangleKind::Cycle,
        seed: 1,
    };
    let err = type_aware_partition(&graph, options).unwrap_err();
    assert_eq!(err.code(), "invalid-epsilon");

    let options = TypeAwareOptions { workers: 0, ..options };
    assert_eq!(
        type_aware_partition(&graph, options).unwrap_err().code(),
        "invalid-workers"
    );
}

#[test]
fn type_aware_balances_triangle_free_graphs() {
    let pairs: Vec<(u64, u64)> = (0..10).map(|i| (i, i + 1)).collect();
    let graph = DirectedGraph::from_pairs(&pairs).unwrap();
    let options = TypeAwareOptions {
        workers: 2,
        epsilon: 1.0,
        kind: TriangleKind::Flow,
        seed: 9,
    };
    let partition = type_aware_partition(&graph, options).unwrap();
    partition.validate(&graph).unwrap();
    assert_eq!(partition.sizes(), vec![5, 5]);
}

#[test]
fn type_aware_is_deterministic_per_seed() {
    let graph = DirectedGraph::from_pairs(&[
        (1, 2),
        (2, 3),
        (3, 1),
        (1, 3),
        (3, 4),
        (4, 1),
        (2, 4),
        (5, 1),
        (5, 2),
    ])
    .unwrap();
    let options = TypeAwareOptions {
        workers: 3,
        epsilon: 1.5,
        kind: TriangleKind::Cycle,
        seed: 42,
    };
    let first = type_aware_partition(&graph, options).unwrap();
    let second = type_aware_partition(&graph, options).unwrap();
    assert_eq!(first, second);
    first.validate(&graph).unwrap();
}

#[test]
fn fragments_carry_boundary_edges_and_routing() {
    let graph = DirectedGraph::from_pairs(&[(1, 2), (2, 3), (3, 1), (4, 5)]).unwrap();
    let assignment = BTreeMap::from([
        (e(1, 2), WorkerId::new(0)),
        (e(2, 3), WorkerId::new(1)),
        (e(3, 1), WorkerId::new(1)),
        (e(4, 5), WorkerId::new(0)),
    ]);
    let partition = Partition::from_assignment(2, assignment).unwrap();

    let zero = partition.fragment_for(&graph, WorkerId::new(0)).unwrap();
    assert!(zero.owns(&e(1, 2)));
    assert_eq!(
        zero.ghosts(),
        &BTreeMap::from([(e(2, 3), WorkerId::new(1)), (e(3, 1), WorkerId::new(1))])
    );
    assert_eq!(
        zero.replicas(&e(1, 2)),
        Some(&BTreeSet::from([WorkerId::new(1)]))
    );
    assert_eq!(zero.replicas(&e(4, 5)), Some(&BTreeSet::new()));
    assert_eq!(zero.visible().count(), 4);

    let one = partition.fragment_for(&graph, WorkerId::new(1)).unwrap();
    assert_eq!(one.ghosts().keys().copied().collect::<Vec<_>>(), vec![e(1, 2)]);
    assert!(partition.fragment_for(&graph, WorkerId::new(2)).is_err());
}

#[test]
fn validate_rejects_incomplete_assignments() {
    let graph = DirectedGraph::from_pairs(&[(1, 2), (2, 3)]).unwrap();
    let partition =
        Partition::from_assignment(2, BTreeMap::from([(e(1, 2), WorkerId::new(0))])).unwrap();
    assert_eq!(partition.validate(&graph).unwrap_err().code(), "unassigned-edge");

    let err = Partition::from_assignment(1, BTreeMap::from([(e(1, 2), WorkerId::new(3))]))
        .unwrap_err();
    assert_eq!(err.code(), "worker-out-of-range");
}

#[test]
fn strategy_reads_from_yaml() {
    let strategy: PartitionStrategy =
        serde_yaml::from_str("type: type-aware\nepsilon: 2.0\ntriangle: flow\n").unwrap();
    assert_eq!(
        strategy,
        PartitionStrategy::TypeAware {
            epsilon: 2.0,
            triangle: TriangleKind::Flow,
            seed: 0,
        }
    );
    let strategy: PartitionStrategy = serde_yaml::from_str("type: stratified\n").unwrap();
    assert!(strategy.needs_pairs());
    assert!(!PartitionStrategy::default().needs_pairs());
}
