//! Completion monitor.

use std::sync::atomic::{AtomicBool, Ordering};

use hopdist_api::ResultMessage;

use crate::*;

/// Polls a [Registry] until enough distinct workers have reported.
///
/// This is a level-triggered check on a timer, not a subscription.
/// Worker counts are small and nothing here is latency sensitive.
#[derive(Debug)]
pub struct CompletionMonitor {
    registry: Registry,
    target: usize,
    poll_interval: std::time::Duration,
}

impl CompletionMonitor {
    /// Construct a new monitor over `registry`.
    pub fn new(
        registry: Registry,
        target: usize,
        poll_interval: std::time::Duration,
    ) -> Self {
        Self {
            registry,
            target,
            poll_interval,
        }
    }

    /// Check once. If the target is met, report and return a snapshot
    /// of every result.
    pub fn poll_once(&self) -> Option<Vec<ResultMessage>> {
        let len = self.registry.len();
        tracing::trace!(len, target = self.target, "current results count");

        if len < self.target {
            return None;
        }

        let all = self.registry.snapshot();

        tracing::info!(count = all.len(), "all results received");
        for r in all.iter() {
            tracing::info!(
                worker_id = %r.worker_id,
                graph_size = r.graph_size,
                distances = %r.distances,
                "final result",
            );
        }

        Some(all)
    }

    /// Poll every `poll_interval` until the target is met, then stop.
    ///
    /// Returns `None` if `cont` is cleared first.
    pub fn run(&self, cont: &AtomicBool) -> Option<Vec<ResultMessage>> {
        while cont.load(Ordering::SeqCst) {
            if let Some(all) = self.poll_once() {
                return Some(all);
            }
            std::thread::sleep(self.poll_interval);
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hopdist_api::{DistanceVector, WorkerId};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn below_target_reports_nothing() {
        let r = Registry::default();
        let m = CompletionMonitor::new(r.clone(), 2, Duration::from_millis(1));
        assert!(m.poll_once().is_none());
        r.insert(ResultMessage::new(WorkerId(1), DistanceVector::default()));
        assert!(m.poll_once().is_none());
        r.insert(ResultMessage::new(WorkerId(2), DistanceVector::default()));
        assert_eq!(2, m.poll_once().unwrap().len());
    }

    #[test]
    fn overwrite_does_not_count_twice() {
        let r = Registry::default();
        let m = CompletionMonitor::new(r.clone(), 2, Duration::from_millis(1));
        r.insert(ResultMessage::new(WorkerId(1), DistanceVector::default()));
        r.insert(ResultMessage::new(WorkerId(1), DistanceVector::default()));
        assert!(m.poll_once().is_none());
    }

    #[test]
    fn run_stops_when_cleared() {
        let m = CompletionMonitor::new(
            Registry::default(),
            1,
            Duration::from_millis(5),
        );
        let cont = Arc::new(AtomicBool::new(true));

        let c2 = cont.clone();
        let t = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            c2.store(false, Ordering::SeqCst);
        });

        assert!(m.run(&cont).is_none());
        t.join().unwrap();
    }

    #[test]
    fn run_returns_once_target_met() {
        let r = Registry::default();
        let m = CompletionMonitor::new(r.clone(), 1, Duration::from_millis(5));
        let cont = AtomicBool::new(true);

        let t = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            r.insert(ResultMessage::new(WorkerId(9), DistanceVector::default()));
        });

        let all = m.run(&cont).unwrap();
        assert_eq!(WorkerId(9), all[0].worker_id);
        t.join().unwrap();
    }
}
