#![deny(missing_docs)]
//! hopdist core: single-source hop-count relaxation over a graph whose
//! vertices are partitioned across a fixed group of ranks.
//!
//! The ranks coordinate only through a [collective::Collective]
//! channel offering broadcast and sum all-reduce. An in-process
//! implementation, [collective::LocalGroup], runs one rank per thread.

use hopdist_api::WorkerId;

pub mod collective;
pub use collective::{Collective, DynCollective, LocalGroup, LocalMember};

pub mod relax;
pub use relax::{relax, Relaxed};

/// Who a worker is.
///
/// `rank` drives partitioning and collective addressing, `worker_id`
/// only labels the result sent to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerIdentity {
    /// Position within the collective group.
    pub rank: usize,

    /// Orchestrator-supplied result label.
    pub worker_id: WorkerId,
}

impl WorkerIdentity {
    /// True if this worker is the one that delivers the group's result.
    pub fn is_root(&self) -> bool {
        self.rank == collective::ROOT
    }
}
