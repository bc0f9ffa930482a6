//! The immutable input graph.

use crate::*;

/// Whether edge list entries describe one or both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directedness {
    /// `(a, b)` is only the edge `a -> b`.
    Directed,

    /// `(a, b)` is both `a -> b` and `b -> a`.
    Undirected,
}

/// An unweighted graph over vertices `0..n`.
///
/// Stored as sorted, de-duplicated out-neighbor lists. Once built
/// it is never mutated, so every rank can hold its own replica.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    vertex_count: usize,
    adjacency: Vec<Vec<usize>>,
}

impl Graph {
    /// A graph with no vertices.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from a square 0/1 matrix. A non-zero `rows[i][j]`
    /// is the edge `i -> j`.
    pub fn from_adjacency_matrix<R: AsRef<[u8]>>(rows: &[R]) -> HdResult<Self> {
        let n = rows.len();
        let mut adjacency = Vec::with_capacity(n);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != n {
                return Err(HdError::other(format!(
                    "adjacency matrix is not square: row {i} has {} columns, expected {n}",
                    row.len(),
                )));
            }
            adjacency.push(
                row.iter()
                    .enumerate()
                    .filter(|(_, e)| **e != 0)
                    .map(|(j, _)| j)
                    .collect(),
            );
        }
        Ok(Self {
            vertex_count: n,
            adjacency,
        })
    }

    /// Build from an edge list over `n` vertices.
    pub fn from_edges<I>(
        n: usize,
        edges: I,
        directedness: Directedness,
    ) -> HdResult<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut adjacency = vec![Vec::new(); n];
        for (a, b) in edges {
            if a >= n || b >= n {
                return Err(HdError::other(format!(
                    "edge ({a}, {b}) out of range for {n} vertices"
                )));
            }
            adjacency[a].push(b);
            if directedness == Directedness::Undirected {
                adjacency[b].push(a);
            }
        }
        Self::from_adjacency_lists(adjacency)
    }

    /// Build from out-neighbor lists. Lists are sorted and de-duplicated.
    pub fn from_adjacency_lists(
        mut adjacency: Vec<Vec<usize>>,
    ) -> HdResult<Self> {
        let n = adjacency.len();
        for (i, list) in adjacency.iter_mut().enumerate() {
            list.sort_unstable();
            list.dedup();
            if let Some(j) = list.last() {
                if *j >= n {
                    return Err(HdError::other(format!(
                        "vertex {i} has neighbor {j} out of range for {n} vertices"
                    )));
                }
            }
        }
        Ok(Self {
            vertex_count: n,
            adjacency,
        })
    }

    /// Parse either `{"vertexCount": n, "adjacency": [[j, ..], ..]}`
    /// or a bare 0/1 adjacency matrix `[[0, 1], [1, 0]]`.
    pub fn from_json(slice: &[u8]) -> HdResult<Self> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Lists {
            vertex_count: usize,
            adjacency: Vec<Vec<usize>>,
        }

        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Encoded {
            Lists(Lists),
            Matrix(Vec<Vec<u8>>),
        }

        let enc: Encoded = serde_json::from_slice(slice)
            .map_err(|err| HdError::other_src("invalid graph json", err))?;

        match enc {
            Encoded::Matrix(rows) => Self::from_adjacency_matrix(&rows),
            Encoded::Lists(Lists {
                vertex_count,
                adjacency,
            }) => {
                if adjacency.len() != vertex_count {
                    return Err(HdError::other(format!(
                        "vertexCount {vertex_count} does not match {} adjacency lists",
                        adjacency.len(),
                    )));
                }
                Self::from_adjacency_lists(adjacency)
            }
        }
    }

    /// Vertex count.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Total directed edge count.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Out-neighbors of `i`; empty if out of range.
    pub fn neighbors(&self, i: usize) -> &[usize] {
        self.adjacency.get(i).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if `i -> j` is an edge.
    pub fn has_edge(&self, i: usize, j: usize) -> bool {
        self.neighbors(i).binary_search(&j).is_ok()
    }
}
