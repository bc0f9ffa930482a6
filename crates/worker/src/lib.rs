#![deny(missing_docs)]
//! hopdist worker: runs one relaxation group and hands the group's
//! result to the aggregator.
//!
//! The group is in-process, one thread per rank over a
//! [hopdist_core::LocalGroup]. Every rank relaxes, only the root
//! delivers.

use hopdist_api::*;
use hopdist_core::*;
use hopdist_delivery_client::*;
use std::time::Duration;

mod demo;
pub use demo::*;

/// What one worker process computes.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Label for the delivered result.
    pub worker_id: WorkerId,

    /// Number of ranks in the group.
    pub group_size: usize,

    /// Source vertex.
    pub source: usize,

    /// Give up on a collective after this long. `None` waits forever.
    pub collective_timeout: Option<Duration>,

    /// The graph every rank relaxes.
    pub graph: Graph,
}

impl WorkerConfig {
    /// The built-in graph for `worker_id`, source 0.
    pub fn demo(worker_id: WorkerId, group_size: usize) -> Self {
        Self {
            worker_id,
            group_size,
            source: 0,
            collective_timeout: None,
            graph: demo_graph(worker_id),
        }
    }
}

/// Worker failure.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// Relaxation did not complete.
    #[error("relaxation failed: {0}")]
    Compute(HdError),

    /// Relaxation completed but the result never reached the aggregator.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl WorkerError {
    /// Process exit status to report this error with.
    ///
    /// A computed result that never reached the aggregator gets its own
    /// code so an orchestrator can tell it apart from other failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Delivery(DeliveryError::Exhausted { .. }) => 2,
            _ => 1,
        }
    }
}

/// Load a graph from a json file, see [Graph::from_json].
pub fn load_graph(path: &std::path::Path) -> HdResult<Graph> {
    let raw = std::fs::read(path).map_err(|err| {
        HdError::other_src(format!("read graph file {}", path.display()), err)
    })?;
    Graph::from_json(&raw)
}

/// Relax `config.graph` on a group of `config.group_size` ranks and
/// return the root's result.
pub fn compute(config: &WorkerConfig) -> HdResult<Relaxed> {
    let worker_id = config.worker_id;

    let per_rank = LocalGroup::run(
        config.group_size,
        config.collective_timeout,
        |member| {
            let identity = WorkerIdentity {
                rank: member.rank(),
                worker_id,
            };
            tracing::debug!(?identity, "rank starting");
            relax(&config.graph, config.source, &member)
        },
    )?;

    let mut root = None;
    for (rank, res) in per_rank.into_iter().enumerate() {
        let relaxed = res?;
        match &root {
            None => root = Some(relaxed),
            Some(r) if *r != relaxed => {
                return Err(HdError::desync(format!(
                    "rank {rank} finished with a different result than the root"
                )));
            }
            Some(_) => (),
        }
    }

    root.ok_or_else(|| HdError::other("empty worker group"))
}

/// Compute, then deliver the root's result.
pub fn run(
    config: &WorkerConfig,
    delivery: &DeliveryConfig,
) -> Result<(ResultMessage, DeliveryReport), WorkerError> {
    tracing::info!(
        worker_id = %config.worker_id,
        group_size = config.group_size,
        vertices = config.graph.vertex_count(),
        edges = config.graph.edge_count(),
        "computing distances",
    );

    let relaxed = compute(config).map_err(WorkerError::Compute)?;

    tracing::info!(
        worker_id = %config.worker_id,
        rounds = relaxed.rounds,
        distances = %relaxed.distances,
        "finished computing",
    );

    let message = ResultMessage::new(config.worker_id, relaxed.distances);
    let report = blocking_submit(delivery, &message)?;

    Ok((message, report))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn demo_one_distances() {
        for size in 1..=5 {
            let r = compute(&WorkerConfig::demo(WorkerId(1), size)).unwrap();
            assert_eq!("[0, 1, 2, 2, 1]", r.distances.to_string());
        }
    }

    #[test]
    fn demo_two_distances() {
        for size in 1..=6 {
            let r = compute(&WorkerConfig::demo(WorkerId(2), size)).unwrap();
            assert_eq!("[0, 1, 1, 2, 2, 3]", r.distances.to_string());
        }
    }

    #[test]
    fn bad_source_is_a_compute_error() {
        let config = WorkerConfig {
            source: 17,
            ..WorkerConfig::demo(WorkerId(1), 2)
        };
        assert!(compute(&config).is_err());
    }

    #[test]
    fn empty_group_is_a_compute_error() {
        assert!(compute(&WorkerConfig::demo(WorkerId(1), 0)).is_err());
    }

    #[test]
    fn exit_codes_are_distinct() {
        let compute = WorkerError::Compute(HdError::other("x"));
        let encode = WorkerError::Delivery(DeliveryError::Encode(
            HdError::other("x"),
        ));
        let exhausted = WorkerError::Delivery(DeliveryError::Exhausted {
            attempts: 3,
            last_error: HdError::other("x"),
            log: Vec::new(),
        });
        assert_eq!(1, compute.exit_code());
        assert_eq!(1, encode.exit_code());
        assert_eq!(2, exhausted.exit_code());
    }
}
