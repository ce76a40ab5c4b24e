//! Process-wide store of captured decision traces.
//!
//! Appends from concurrent runs are independent; each report is inserted
//! whole. Reports from different runs carry no relative order beyond the
//! insertion order used for eviction.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::machine::RunReport;

/// Bounded map from run id to its report.
#[derive(Clone)]
pub struct TraceStore {
    reports: Arc<DashMap<Uuid, Arc<RunReport>>>,
    order: Arc<Mutex<VecDeque<Uuid>>>,
    capacity: usize,
}

impl TraceStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            reports: Arc::new(DashMap::new()),
            order: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    /// Store a report, evicting the oldest ones beyond capacity.
    pub fn insert(&self, report: RunReport) {
        let run_id = report.run_id;
        let replaced = self.reports.insert(run_id, Arc::new(report)).is_some();

        let mut order = self.order.lock().unwrap_or_else(|e| e.into_inner());
        if !replaced {
            order.push_back(run_id);
        }
        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                self.reports.remove(&oldest);
                tracing::trace!(run_id = %oldest, "Evicted stored trace");
            }
        }
    }

    pub fn get(&self, run_id: &Uuid) -> Option<Arc<RunReport>> {
        self.reports.get(run_id).map(|r| Arc::clone(r.value()))
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Trace;
    use std::thread;

    fn report(run_id: Uuid) -> RunReport {
        RunReport::new(run_id, Some(200), Trace::default())
    }

    #[test]
    fn test_insert_and_get() {
        let store = TraceStore::new(4);
        let id = Uuid::new_v4();
        store.insert(report(id));
        assert_eq!(store.get(&id).map(|r| r.status), Some(Some(200)));
        assert!(store.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_evicts_oldest() {
        let store = TraceStore::new(2);
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            store.insert(report(*id));
        }
        assert_eq!(store.len(), 2);
        assert!(store.get(&ids[0]).is_none());
        assert!(store.get(&ids[2]).is_some());
    }

    #[test]
    fn test_concurrent_inserts() {
        let store = TraceStore::new(1000);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        store.insert(report(Uuid::new_v4()));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 400);
    }
}
