//! Group-synchronous collective operations.
//!
//! The collective channel is the only way ranks talk to each other
//! during relaxation. Both operations are barriers: nobody leaves
//! until everybody has entered.

use hopdist_api::*;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// The rank that seeds the initial distance vector.
pub const ROOT: usize = 0;

/// Collective operations over a fixed group of `size` ranks.
pub trait Collective: Send + Sync {
    /// This participant's position in the group.
    fn rank(&self) -> usize;

    /// The number of participants.
    fn size(&self) -> usize;

    /// Every participant ends with the root's value.
    /// `root` must pass `Some`; everyone else's value is ignored.
    fn broadcast(
        &self,
        value: Option<DistanceVector>,
        root: usize,
    ) -> HdResult<DistanceVector>;

    /// Every participant ends with the sum of all `local` values.
    fn all_reduce_sum(&self, local: u64) -> HdResult<u64>;
}

/// Trait-object type for [Collective].
pub type DynCollective = Arc<dyn Collective + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
    Broadcast { root: usize },
    AllReduceSum,
}

impl OpKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Broadcast { .. } => "broadcast",
            Self::AllReduceSum => "all_reduce_sum",
        }
    }
}

#[derive(Clone)]
enum Outcome {
    Vector(DistanceVector),
    Sum(u64),
}

#[derive(Default)]
struct State {
    generation: u64,
    arrived: usize,
    op: Option<OpKind>,
    desync: Option<String>,
    root_value: Option<DistanceVector>,
    sum: u64,
    completed: Option<HdResult<Outcome>>,
    poisoned: Option<&'static str>,
}

struct Rendezvous {
    size: usize,
    timeout: Option<Duration>,
    state: Mutex<State>,
    cvar: Condvar,
}

impl Rendezvous {
    fn enter(
        &self,
        rank: usize,
        op: OpKind,
        value: Option<DistanceVector>,
        local: u64,
    ) -> HdResult<Outcome> {
        let mut state = self.state.lock().unwrap();

        if let Some(op) = state.poisoned {
            return Err(HdError::CollectiveTimeout { op, rank });
        }

        let current = state.op;
        match current {
            None => state.op = Some(op),
            Some(cur) if cur != op => {
                if state.desync.is_none() {
                    state.desync = Some(format!(
                        "rank {rank} entered {op:?} while group is in {cur:?}"
                    ));
                }
            }
            _ => (),
        }

        match op {
            OpKind::Broadcast { root } if root == rank => match value {
                Some(value) => state.root_value = Some(value),
                None => {
                    if state.desync.is_none() {
                        state.desync = Some(format!(
                            "broadcast root {rank} supplied no value"
                        ));
                    }
                }
            },
            OpKind::Broadcast { .. } => (),
            OpKind::AllReduceSum => {
                state.sum = state.sum.saturating_add(local);
            }
        }

        state.arrived += 1;
        let my_gen = state.generation;

        if state.arrived == self.size {
            // last arrival completes the operation for everyone
            let result = match (state.desync.take(), state.op) {
                (Some(ctx), _) => Err(HdError::desync(ctx)),
                (None, Some(OpKind::AllReduceSum)) => {
                    Ok(Outcome::Sum(state.sum))
                }
                (None, _) => match state.root_value.take() {
                    Some(v) => Ok(Outcome::Vector(v)),
                    None => Err(HdError::desync("broadcast root never arrived")),
                },
            };

            state.generation += 1;
            state.arrived = 0;
            state.op = None;
            state.root_value = None;
            state.sum = 0;
            state.completed = Some(result.clone());

            self.cvar.notify_all();
            return result;
        }

        let deadline = self.timeout.map(|t| Instant::now() + t);

        while state.generation == my_gen && state.poisoned.is_none() {
            state = match deadline {
                None => self.cvar.wait(state).unwrap(),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        tracing::warn!(
                            rank,
                            op = op.name(),
                            arrived = state.arrived,
                            size = self.size,
                            "collective timed out, poisoning group",
                        );
                        state.poisoned = Some(op.name());
                        self.cvar.notify_all();
                        break;
                    }
                    self.cvar.wait_timeout(state, deadline - now).unwrap().0
                }
            };
        }

        if state.generation == my_gen {
            let op = state.poisoned.unwrap_or(op.name());
            return Err(HdError::CollectiveTimeout { op, rank });
        }

        // nobody can complete the next generation until we arrive in it,
        // so the completed slot still holds our result
        match state.completed.as_ref() {
            Some(result) => result.clone(),
            None => Err(HdError::other("collective result missing")),
        }
    }
}

/// An in-process collective group, one member per OS thread.
///
/// This stands in for a group of separate worker processes. The members
/// share nothing but a rendezvous mailbox; distance state is only ever
/// exchanged by value through [Collective::broadcast].
///
/// If `timeout` is `None` a member that never arrives stalls the whole
/// group forever. With a timeout, the first rank to give up poisons the
/// group and every later collective call fails with
/// [HdError::CollectiveTimeout].
pub struct LocalGroup;

impl LocalGroup {
    /// Create the member handles of a new group, ordered by rank.
    pub fn new(
        size: usize,
        timeout: Option<Duration>,
    ) -> HdResult<Vec<LocalMember>> {
        if size == 0 {
            return Err(HdError::other("collective group size must be >= 1"));
        }

        let rendezvous = Arc::new(Rendezvous {
            size,
            timeout,
            state: Mutex::new(State::default()),
            cvar: Condvar::new(),
        });

        Ok((0..size)
            .map(|rank| LocalMember {
                rank,
                rendezvous: rendezvous.clone(),
            })
            .collect())
    }

    /// Run `f` once per rank, each on its own thread, and collect the
    /// results ordered by rank.
    pub fn run<T, F>(
        size: usize,
        timeout: Option<Duration>,
        f: F,
    ) -> HdResult<Vec<T>>
    where
        T: Send,
        F: Fn(LocalMember) -> T + Sync,
    {
        let members = Self::new(size, timeout)?;
        let f = &f;

        std::thread::scope(|s| {
            let handles = members
                .into_iter()
                .map(|member| {
                    let rank = member.rank;
                    std::thread::Builder::new()
                        .name(format!("hopdist-rank-{rank}"))
                        .spawn_scoped(s, move || f(member))
                        .map_err(|err| {
                            HdError::other_src(
                                format!("failed to spawn rank {rank}"),
                                err,
                            )
                        })
                })
                .collect::<Vec<_>>();

            let mut out = Vec::with_capacity(size);
            let mut first_err = None;
            for (rank, handle) in handles.into_iter().enumerate() {
                match handle {
                    Ok(handle) => match handle.join() {
                        Ok(r) => out.push(r),
                        Err(_) => {
                            if first_err.is_none() {
                                first_err = Some(HdError::other(format!(
                                    "rank {rank} panicked"
                                )));
                            }
                        }
                    },
                    Err(err) => {
                        if first_err.is_none() {
                            first_err = Some(err);
                        }
                    }
                }
            }

            match first_err {
                Some(err) => Err(err),
                None => Ok(out),
            }
        })
    }
}

/// One rank's handle into a [LocalGroup].
pub struct LocalMember {
    rank: usize,
    rendezvous: Arc<Rendezvous>,
}

impl std::fmt::Debug for LocalMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalMember")
            .field("rank", &self.rank)
            .field("size", &self.rendezvous.size)
            .finish()
    }
}

impl Collective for LocalMember {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.rendezvous.size
    }

    fn broadcast(
        &self,
        value: Option<DistanceVector>,
        root: usize,
    ) -> HdResult<DistanceVector> {
        if root >= self.rendezvous.size {
            return Err(HdError::other(format!(
                "broadcast root {root} out of range for group of {}",
                self.rendezvous.size,
            )));
        }
        let value = if root == self.rank { value } else { None };
        match self.rendezvous.enter(
            self.rank,
            OpKind::Broadcast { root },
            value,
            0,
        )? {
            Outcome::Vector(v) => Ok(v),
            Outcome::Sum(_) => Err(HdError::desync("broadcast produced a sum")),
        }
    }

    fn all_reduce_sum(&self, local: u64) -> HdResult<u64> {
        match self.rendezvous.enter(
            self.rank,
            OpKind::AllReduceSum,
            None,
            local,
        )? {
            Outcome::Sum(s) => Ok(s),
            Outcome::Vector(_) => {
                Err(HdError::desync("all_reduce_sum produced a vector"))
            }
        }
    }
}
