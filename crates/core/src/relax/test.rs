use super::*;
use crate::collective::LocalGroup;
use std::time::Duration;

const TIMEOUT: Option<Duration> = Some(Duration::from_secs(10));

fn relax_all(graph: &Graph, source: usize, size: usize) -> Vec<Relaxed> {
    LocalGroup::run(size, TIMEOUT, |m| relax(graph, source, &m))
        .unwrap()
        .into_iter()
        .map(|r| r.unwrap())
        .collect()
}

fn hops(v: &[Option<u32>]) -> DistanceVector {
    v.iter().copied().map(Distance::from).collect()
}

#[test]
fn owned_vertices_round_robin() {
    assert_eq!(
        vec![1, 4, 7],
        owned_vertices(9, 1, 3).collect::<Vec<_>>()
    );
    assert_eq!(vec![0, 1, 2], owned_vertices(3, 0, 1).collect::<Vec<_>>());
    assert_eq!(0, owned_vertices(2, 4, 5).count());
}

#[test]
fn five_cycle_any_size() {
    let graph = hopdist_test_utils::five_cycle();
    let expected = hops(&[Some(0), Some(1), Some(2), Some(2), Some(1)]);

    for size in 1..=5 {
        for r in relax_all(&graph, 0, size) {
            assert_eq!(expected, r.distances, "size {size}");
            assert!(r.rounds <= graph.vertex_count());
        }
    }
}

#[test]
fn empty_graph_terminates_immediately() {
    for r in relax_all(&Graph::empty(), 0, 3) {
        assert_eq!(0, r.rounds);
        assert!(r.distances.is_empty());
    }
}

#[test]
fn isolated_source() {
    let graph = Graph::from_edges(3, [(1, 2)], Directedness::Undirected)
        .unwrap();
    for r in relax_all(&graph, 0, 2) {
        assert_eq!(hops(&[Some(0), None, None]), r.distances);
        assert_eq!(1, r.rounds);
    }
}

#[test]
fn directed_edges_are_respected() {
    // 0 -> 1 -> 2, and 3 -> 0 which 0 can not walk backwards
    let graph = Graph::from_edges(
        4,
        [(0, 1), (1, 2), (3, 0)],
        Directedness::Directed,
    )
    .unwrap();
    for r in relax_all(&graph, 0, 3) {
        assert_eq!(hops(&[Some(0), Some(1), Some(2), None]), r.distances);
    }
}

#[test]
fn source_out_of_range() {
    let graph = hopdist_test_utils::five_cycle();
    let out =
        LocalGroup::run(2, TIMEOUT, |m| relax(&graph, 5, &m)).unwrap();
    for r in out {
        assert!(r.unwrap_err().to_string().contains("out of range"));
    }
}

#[test]
fn converged_vector_is_a_fixed_point() {
    let graph = hopdist_test_utils::five_cycle();
    let mut distances = relax_all(&graph, 0, 2).remove(0).distances;
    let before = distances.clone();
    assert_eq!(0, relax_round(&graph, 0..graph.vertex_count(), &mut distances));
    assert_eq!(before, distances);
}

#[test]
fn path_graph_hits_the_round_bound() {
    // a path scanned against its direction needs one round per edge,
    // plus the final quiet round
    let n = 6;
    let graph = Graph::from_edges(
        n,
        (1..n).map(|i| (i, i - 1)),
        Directedness::Directed,
    )
    .unwrap();
    for size in [1, 2, 4] {
        for r in relax_all(&graph, n - 1, size) {
            assert_eq!(n, r.rounds, "size {size}");
            let expected = (0..n as u32).rev().map(Some).collect::<Vec<_>>();
            assert_eq!(hops(&expected), r.distances);
        }
    }
}
