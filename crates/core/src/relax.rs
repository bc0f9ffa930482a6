//! Synchronous hop-count relaxation over a round-robin partition.
//!
//! Every rank keeps a full replica of the distance vector but only
//! scans the vertices it owns (`i % size == rank`). After each scan the
//! replicas are merged through one broadcast per rank, and a sum
//! reduction of the local change counts decides whether another round
//! is needed. The reduction happens before the first scan too, so a
//! graph without a source terminates with zero rounds.

use crate::collective::{Collective, ROOT};
use hopdist_api::*;

/// The outcome of a converged relaxation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relaxed {
    /// Final hop counts, identical on every rank.
    pub distances: DistanceVector,

    /// Scanning rounds run, including the final round that found
    /// nothing to change.
    pub rounds: usize,
}

/// The vertices `rank` owns in a group of `size`.
pub fn owned_vertices(
    n: usize,
    rank: usize,
    size: usize,
) -> impl Iterator<Item = usize> {
    (rank..n).step_by(size.max(1))
}

/// Scan `owned` vertices once, lowering neighbor distances.
/// Returns the number of entries lowered.
pub fn relax_round<I>(
    graph: &Graph,
    owned: I,
    distances: &mut DistanceVector,
) -> u64
where
    I: IntoIterator<Item = usize>,
{
    let mut changes = 0;
    for i in owned {
        let d = distances.get(i);
        if !d.is_reachable() {
            continue;
        }
        let next = d.successor();
        for &j in graph.neighbors(i) {
            if distances.lower(j, next) {
                changes += 1;
            }
        }
    }
    changes
}

/// Run the relaxation protocol as one participant of `collective`.
///
/// Every rank of the group must call this with an identical `graph`
/// and `source`.
pub fn relax<C>(
    graph: &Graph,
    source: usize,
    collective: &C,
) -> HdResult<Relaxed>
where
    C: Collective + ?Sized,
{
    let n = graph.vertex_count();
    let rank = collective.rank();
    let size = collective.size();

    if size == 0 || rank >= size {
        return Err(HdError::other(format!(
            "invalid collective position: rank {rank} of {size}"
        )));
    }

    if n > 0 && source >= n {
        return Err(HdError::other(format!(
            "source vertex {source} out of range for {n} vertices"
        )));
    }

    tracing::debug!(rank, size, n, source, "starting relaxation");

    let seed = if rank == ROOT {
        Some(DistanceVector::seeded(n, source))
    } else {
        None
    };
    let mut distances = collective.broadcast(seed, ROOT)?;

    if distances.len() != n {
        return Err(HdError::other(format!(
            "root broadcast {} distances, local graph has {n} vertices",
            distances.len(),
        )));
    }

    let seeded = if rank == ROOT && n > 0 { 1 } else { 0 };
    let mut changes = collective.all_reduce_sum(seeded)?;
    let mut rounds = 0;

    while changes != 0 {
        rounds += 1;

        let local =
            relax_round(graph, owned_vertices(n, rank, size), &mut distances);

        distances = merge_replicas(collective, distances)?;

        changes = collective.all_reduce_sum(local)?;

        tracing::trace!(rank, rounds, local, changes, "relaxation round");
    }

    tracing::debug!(
        rank,
        rounds,
        reachable = distances.reachable_count(),
        "relaxation converged",
    );

    Ok(Relaxed { distances, rounds })
}

/// Exchange replicas, one broadcast rooted at each rank, and fold
/// them together with element-wise min.
fn merge_replicas<C>(
    collective: &C,
    mine: DistanceVector,
) -> HdResult<DistanceVector>
where
    C: Collective + ?Sized,
{
    let rank = collective.rank();
    let mut merged = mine.clone();
    let mut mine = Some(mine);

    for root in 0..collective.size() {
        let value = if root == rank { mine.take() } else { None };
        let theirs = collective.broadcast(value, root)?;
        if root != rank {
            merged.merge_min(&theirs);
        }
    }

    Ok(merged)
}

#[cfg(test)]
mod test;
