//! Result registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use hopdist_api::{ResultMessage, WorkerId};

/// The received results, keyed by worker id.
///
/// A single mutex guards the map. It is held for exactly one insert
/// or one snapshot and never across network io.
#[derive(Clone, Default)]
pub struct Registry(Arc<Mutex<HashMap<WorkerId, ResultMessage>>>);

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("len", &self.len()).finish()
    }
}

impl Registry {
    /// Store a result, replacing any earlier result from the same
    /// worker. Returns the replaced result.
    pub fn insert(&self, result: ResultMessage) -> Option<ResultMessage> {
        self.0.lock().unwrap().insert(result.worker_id, result)
    }

    /// Get the result of one worker.
    pub fn get(&self, worker_id: WorkerId) -> Option<ResultMessage> {
        self.0.lock().unwrap().get(&worker_id).cloned()
    }

    /// The number of distinct workers that have reported.
    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    /// True if nothing has been received yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out every result, ordered by worker id.
    pub fn snapshot(&self) -> Vec<ResultMessage> {
        // minimize mutex lock time, sort after releasing it
        let mut out =
            self.0.lock().unwrap().values().cloned().collect::<Vec<_>>();
        out.sort_unstable_by_key(|r| r.worker_id);
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hopdist_api::{Distance, DistanceVector};

    fn result(id: u64, d: &[Option<u32>]) -> ResultMessage {
        ResultMessage::new(
            WorkerId(id),
            d.iter().copied().map(Distance::from).collect::<DistanceVector>(),
        )
    }

    #[test]
    fn later_submission_overwrites() {
        let r = Registry::default();
        assert!(r.is_empty());

        assert!(r.insert(result(1, &[Some(0)])).is_none());
        let replaced = r.insert(result(1, &[Some(0), None])).unwrap();

        assert_eq!(result(1, &[Some(0)]), replaced);
        assert_eq!(1, r.len());
        assert_eq!(Some(result(1, &[Some(0), None])), r.get(WorkerId(1)));
    }

    #[test]
    fn snapshot_is_ordered() {
        let r = Registry::default();
        r.insert(result(3, &[]));
        r.insert(result(1, &[]));
        r.insert(result(2, &[]));
        let ids = r
            .snapshot()
            .into_iter()
            .map(|r| r.worker_id.0)
            .collect::<Vec<_>>();
        assert_eq!(vec![1, 2, 3], ids);
    }

    #[test]
    fn happy_multi_thread_sanity() {
        const COUNT: u64 = 10;
        let r = Registry::default();
        let b = Arc::new(std::sync::Barrier::new(COUNT as usize));

        let all = (0..COUNT)
            .map(|i| {
                let r = r.clone();
                let b = b.clone();
                std::thread::spawn(move || {
                    b.wait();
                    r.insert(result(i % 5, &[Some(i as u32)]));
                })
            })
            .collect::<Vec<_>>();

        for t in all {
            t.join().unwrap();
        }

        assert_eq!(5, r.len());
    }
}
