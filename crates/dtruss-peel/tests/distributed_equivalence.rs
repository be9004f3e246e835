use std::collections::{BTreeMap, BTreeSet};

use dtruss_core::rng::RngHandle;
use dtruss_core::{DirectedEdge, Supports, WorkerId};
use dtruss_graph::{gen_random_digraph, DirectedGraph, TriangleKind};
use dtruss_part::{stratified_partition, type_aware_partition, Partition, TypeAwareOptions};
use dtruss_peel::{
    decompose_single, run_local, EngineConfig, Schedule, WorkerOutcome, WorkerState,
};
use proptest::prelude::*;

fn random_graph(seed: u64, vertices: usize, reciprocity: f64) -> DirectedGraph {
    let mut rng = RngHandle::from_seed(seed);
    let edges = (vertices * 3).min(vertices * (vertices - 1));
    gen_random_digraph(vertices, edges, reciprocity, &mut rng).unwrap()
}

fn check_invariants(graph: &DirectedGraph, partition: &Partition, outcomes: &[WorkerOutcome], config: &EngineConfig) {
    let mut survivors = BTreeSet::new();
    for outcome in outcomes {
        let owned = partition.owned_by(outcome.worker);
        assert_eq!(outcome.owned, owned.len());
        for edge in &outcome.survivors {
            assert!(owned.contains(edge), "{edge} survived outside its fragment");
            assert!(survivors.insert(*edge), "{edge} survived twice");
        }
        for window in outcome.trace.windows(2) {
            let (before, after) = (&window[0], &window[1]);
            assert!(after.superstep > before.superstep);
            if before.pass == after.pass {
                assert!(after.alive <= before.alive);
                assert!(after.cycle_total <= before.cycle_total);
                assert!(after.flow_total <= before.flow_total);
            }
        }
        let edges: u64 = graph.edge_count() as u64;
        assert!(outcome.supersteps <= config.superstep_limit(edges));
    }
}

fn owned_supports(states: &[WorkerState]) -> BTreeMap<DirectedEdge, Supports> {
    states
        .iter()
        .flat_map(|state| {
            state
                .alive()
                .iter()
                .map(move |edge| (*edge, state.supports(edge).unwrap()))
        })
        .collect()
}

/// Drives every fragment through the sweep passes in lockstep, exchanging
/// peeled edges in memory, and checks each owned edge's supports after every
/// superstep against the previous superstep.
fn assert_edge_supports_never_grow(graph: &DirectedGraph, partition: &Partition) {
    let fragments = partition.fragments(graph).unwrap();
    for pass in Schedule::Sweep.passes() {
        let mut states: Vec<WorkerState> = fragments.iter().cloned().map(WorkerState::new).collect();
        let mut previous = owned_supports(&states);
        let mut level = 0u32;
        loop {
            assert!(level as usize <= graph.edge_count() + 1, "pass did not converge");
            let thresholds = pass.thresholds(level);
            let peeled: Vec<Vec<DirectedEdge>> =
                states.iter().map(|state| state.candidates(thresholds)).collect();
            for (state, edges) in states.iter_mut().zip(&peeled) {
                for edge in edges {
                    state.remove(edge).unwrap();
                }
            }
            let routed: Vec<Vec<DirectedEdge>> = (0..states.len())
                .map(|to| {
                    states
                        .iter()
                        .zip(&peeled)
                        .filter(|(from, _)| from.worker() != WorkerId::new(to))
                        .flat_map(|(from, edges)| from.routed(edges, WorkerId::new(to)))
                        .collect()
                })
                .collect();
            for (state, edges) in states.iter_mut().zip(&routed) {
                for edge in edges {
                    state.remove(edge).unwrap();
                }
            }

            let current = owned_supports(&states);
            for (edge, supports) in &current {
                let before = previous[edge];
                assert!(
                    supports.cycle <= before.cycle && supports.flow <= before.flow,
                    "{edge} grew from {before:?} to {supports:?}"
                );
            }
            previous = current;

            if peeled.iter().all(Vec::is_empty) {
                if previous.is_empty() {
                    break;
                }
                level += 1;
            }
        }
    }
}

#[test]
fn edge_supports_never_grow_on_a_split_mixed_graph() {
    // A 3-cycle sharing vertex 3 with a transitive triangle, plus a bi-linked pair.
    let pairs = [(1, 2), (2, 3), (3, 1), (3, 4), (4, 5), (3, 5), (5, 3), (2, 1)];
    let graph = DirectedGraph::from_pairs(&pairs).unwrap();
    let assignment: BTreeMap<DirectedEdge, WorkerId> = pairs
        .iter()
        .enumerate()
        .map(|(index, (u, v))| (DirectedEdge::from_raw(*u, *v), WorkerId::new(index % 3)))
        .collect();
    let partition = Partition::from_assignment(3, assignment).unwrap();
    assert_edge_supports_never_grow(&graph, &partition);
    assert_edge_supports_never_grow(&graph, &Partition::single(&graph));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn type_aware_fleet_matches_single_worker(
        seed in any::<u64>(),
        vertices in 3usize..10,
        workers in 1usize..5,
        reciprocity in 0.0f64..0.6,
    ) {
        let graph = random_graph(seed, vertices, reciprocity);
        let config = EngineConfig::default();
        let expected = decompose_single(&graph, &config).unwrap();
        prop_assert_eq!(expected.len(), graph.edge_count());

        let options = TypeAwareOptions { workers, epsilon: 1.5, kind: TriangleKind::Cycle, seed };
        let partition = type_aware_partition(&graph, options).unwrap();
        let outcomes = run_local(&graph, &partition, &config).unwrap();
        check_invariants(&graph, &partition, &outcomes, &config);

        let mut merged = std::collections::BTreeMap::new();
        for outcome in &outcomes {
            merged.extend(outcome.pairs.clone());
        }
        prop_assert_eq!(merged, expected.clone());
        for outcome in &outcomes {
            let maxima = expected
                .values()
                .fold(Default::default(), |acc: dtruss_core::TrussnessPair, pair| acc.max_components(*pair));
            prop_assert_eq!(outcome.maxima, maxima);
        }
    }

    #[test]
    fn stratified_fleet_matches_single_worker(
        seed in any::<u64>(),
        vertices in 3usize..10,
        workers in 1usize..5,
    ) {
        let graph = random_graph(seed, vertices, 0.3);
        let config = EngineConfig::default();
        let expected = decompose_single(&graph, &config).unwrap();
        let partition = stratified_partition(&graph, workers, &expected).unwrap();
        let outcomes = run_local(&graph, &partition, &config).unwrap();
        check_invariants(&graph, &partition, &outcomes, &config);

        let merged: std::collections::BTreeMap<DirectedEdge, _> = outcomes
            .iter()
            .flat_map(|outcome| outcome.pairs.clone())
            .collect();
        prop_assert_eq!(merged, expected);
    }

    #[test]
    fn edge_supports_never_grow_across_supersteps(
        seed in any::<u64>(),
        vertices in 3usize..9,
        workers in 1usize..4,
    ) {
        let graph = random_graph(seed, vertices, 0.4);
        let options = TypeAwareOptions { workers, epsilon: 1.5, kind: TriangleKind::Cycle, seed };
        let partition = type_aware_partition(&graph, options).unwrap();
        assert_edge_supports_never_grow(&graph, &partition);
    }

    #[test]
    fn fixed_thresholds_survivors_do_not_depend_on_worker_count(
        seed in any::<u64>(),
        vertices in 3usize..10,
        workers in 2usize..5,
        k_c in 0u32..3,
        k_f in 0u32..3,
    ) {
        let graph = random_graph(seed, vertices, 0.4);
        let config = EngineConfig {
            schedule: Schedule::Fixed { k_c, k_f },
            ..EngineConfig::default()
        };
        let single = run_local(&graph, &Partition::single(&graph), &config).unwrap();
        let options = TypeAwareOptions { workers, epsilon: 1.2, kind: TriangleKind::Flow, seed };
        let partition = type_aware_partition(&graph, options).unwrap();
        let outcomes = run_local(&graph, &partition, &config).unwrap();
        check_invariants(&graph, &partition, &outcomes, &config);

        let survivors: BTreeSet<DirectedEdge> = outcomes
            .iter()
            .flat_map(|outcome| outcome.survivors.iter().copied())
            .collect();
        prop_assert_eq!(&survivors, &single[0].survivors);
        for edge in &survivors {
            prop_assert!(graph.contains(edge));
        }
    }
}
