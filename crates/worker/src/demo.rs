//! Built-in graphs, one per worker id.

use hopdist_api::*;

/// Undirected 5-cycle `0-1-2-3-4-0`.
const FIVE_CYCLE: [[u8; 5]; 5] = [
    [0, 1, 0, 0, 1],
    [1, 0, 1, 0, 0],
    [0, 1, 0, 1, 0],
    [0, 0, 1, 0, 1],
    [1, 0, 0, 1, 0],
];

/// Undirected 6-cycle `0-1-3-5-4-2-0`.
const SIX_CYCLE: [[u8; 6]; 6] = [
    [0, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 0, 0],
    [1, 0, 0, 0, 1, 0],
    [0, 1, 0, 0, 0, 1],
    [0, 0, 1, 0, 0, 1],
    [0, 0, 0, 1, 1, 0],
];

/// The graph worker `worker_id` relaxes when no graph file is given.
///
/// Worker 1 gets the 5-cycle, every other id the 6-cycle.
pub fn demo_graph(worker_id: WorkerId) -> Graph {
    let graph = if worker_id.0 == 1 {
        Graph::from_adjacency_matrix(&FIVE_CYCLE)
    } else {
        Graph::from_adjacency_matrix(&SIX_CYCLE)
    };
    graph.expect("demo matrices are square")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn worker_one_gets_the_shared_five_cycle() {
        assert_eq!(hopdist_test_utils::five_cycle(), demo_graph(WorkerId(1)));
    }

    #[test]
    fn worker_one_gets_five() {
        let g = demo_graph(WorkerId(1));
        assert_eq!(5, g.vertex_count());
        assert_eq!(10, g.edge_count());
    }

    #[test]
    fn everyone_else_gets_six() {
        for id in [0, 2, 3, 99] {
            let g = demo_graph(WorkerId(id));
            assert_eq!(6, g.vertex_count());
            assert!(g.has_edge(3, 5));
            assert!(g.has_edge(5, 3));
        }
    }

    #[test]
    fn six_is_symmetric() {
        let g = demo_graph(WorkerId(2));
        for i in 0..6 {
            for &j in g.neighbors(i) {
                assert!(g.has_edge(j, i));
            }
        }
    }
}
