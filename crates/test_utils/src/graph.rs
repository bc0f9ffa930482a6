//! Test utilities associated with graphs.

use hopdist_api::*;
use rand::{Rng, SeedableRng};

/// The 5-vertex cycle `0-1-2-3-4-0` as an undirected adjacency matrix.
/// From vertex 0 the hop counts are `[0, 1, 2, 2, 1]`.
pub fn five_cycle() -> Graph {
    Graph::from_adjacency_matrix(&[
        [0_u8, 1, 0, 0, 1],
        [1, 0, 1, 0, 0],
        [0, 1, 0, 1, 0],
        [0, 0, 1, 0, 1],
        [1, 0, 0, 1, 0],
    ])
    .unwrap()
}

/// Parameters for [random_graph].
#[derive(Debug, Clone, Copy)]
pub struct RandomGraph {
    /// Rng seed, the same seed always yields the same graph.
    pub seed: u64,

    /// Vertex count.
    pub vertex_count: usize,

    /// Chance that any given pair is connected.
    pub edge_probability: f64,

    /// Whether each sampled pair is one or two edges.
    pub directedness: Directedness,
}

/// Generate an Erdos-Renyi style graph.
pub fn random_graph(p: RandomGraph) -> Graph {
    let mut rng = rand::rngs::StdRng::seed_from_u64(p.seed);
    let n = p.vertex_count;
    let mut edges = Vec::new();
    for a in 0..n {
        for b in 0..n {
            if a == b {
                continue;
            }
            if p.directedness == Directedness::Undirected && b < a {
                continue;
            }
            if rng.gen_bool(p.edge_probability) {
                edges.push((a, b));
            }
        }
    }
    Graph::from_edges(n, edges, p.directedness).unwrap()
}

/// Serial breadth-first hop counts, used as the oracle for the
/// distributed relaxation.
pub fn bfs_reference(graph: &Graph, source: usize) -> DistanceVector {
    let mut out = DistanceVector::unreachable(graph.vertex_count());
    if source >= graph.vertex_count() {
        return out;
    }
    out.lower(source, Distance::ZERO);

    let mut queue = std::collections::VecDeque::from([source]);
    while let Some(i) = queue.pop_front() {
        let next = out.get(i).successor();
        for &j in graph.neighbors(i) {
            if !out.get(j).is_reachable() && out.lower(j, next) {
                queue.push_back(j);
            }
        }
    }
    out
}
