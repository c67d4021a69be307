//! In-memory, append-only store of completed scan reports.
//!
//! Durable persistence is a host concern; this store only has to be
//! append-safe under concurrent `store` calls and deterministic in ordering
//! (insertion order, not `scanned_at`, so clock skew never reorders `list`).

use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::scanner::ScanReport;

#[derive(Default)]
struct StoreInner {
    /// Reports in insertion order.
    reports: Vec<(String, ScanReport)>,
    /// Report ID -> index into `reports`.
    by_id: HashMap<String, usize>,
}

/// ID-indexed report store with "latest by skill name" lookup.
#[derive(Default)]
pub struct ReportStore {
    inner: RwLock<StoreInner>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a report and return its freshly generated ID.
    pub fn store(&self, report: ScanReport) -> String {
        let id = Uuid::new_v4().to_string();
        let mut inner = self.inner.write();
        let index = inner.reports.len();
        inner.reports.push((id.clone(), report));
        inner.by_id.insert(id.clone(), index);
        id
    }

    pub fn get(&self, id: &str) -> Option<ScanReport> {
        let inner = self.inner.read();
        inner
            .by_id
            .get(id)
            .map(|&index| inner.reports[index].1.clone())
    }

    /// Most-recent-first by insertion order, at most `limit` when given.
    pub fn list(&self, limit: Option<usize>) -> Vec<ScanReport> {
        let inner = self.inner.read();
        let iter = inner.reports.iter().rev().map(|(_, r)| r.clone());
        match limit {
            Some(n) => iter.take(n).collect(),
            None => iter.collect(),
        }
    }

    /// Latest stored report for the given skill name.
    pub fn get_by_skill_name(&self, name: &str) -> Option<ScanReport> {
        let inner = self.inner.read();
        inner
            .reports
            .iter()
            .rev()
            .find(|(_, r)| r.skill_name == name)
            .map(|(_, r)| r.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;
    use pretty_assertions::assert_eq;

    fn report(name: &str, source: &str) -> ScanReport {
        let files = vec![("index.js".to_string(), source.to_string())];
        Scanner::new().scan_skill(name, &files, vec![])
    }

    #[test]
    fn store_then_get_round_trips() {
        let store = ReportStore::new();
        let r = report("alpha", "const x = 1;\n");
        let id = store.store(r.clone());
        assert_eq!(store.get(&id), Some(r));
    }

    #[test]
    fn get_unknown_id_is_none() {
        let store = ReportStore::new();
        assert_eq!(store.get("no-such-id"), None);
    }

    #[test]
    fn ids_are_unique_per_store_call() {
        let store = ReportStore::new();
        let a = store.store(report("a", ""));
        let b = store.store(report("a", ""));
        assert_ne!(a, b);
    }

    #[test]
    fn list_is_most_recent_first_and_bounded() {
        let store = ReportStore::new();
        store.store(report("one", ""));
        store.store(report("two", ""));
        store.store(report("three", ""));

        let all = store.list(None);
        let names: Vec<&str> = all.iter().map(|r| r.skill_name.as_str()).collect();
        assert_eq!(names, vec!["three", "two", "one"]);

        let limited = store.list(Some(2));
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].skill_name, "three");
    }

    #[test]
    fn get_by_skill_name_returns_latest() {
        let store = ReportStore::new();
        store.store(report("dup", "const x = 1;\n"));
        store.store(report("other", ""));
        store.store(report("dup", "eval('2')\n"));

        let latest = store.get_by_skill_name("dup").unwrap();
        assert_eq!(latest.total_findings, 1);
        assert_eq!(store.get_by_skill_name("missing"), None);
    }

    #[test]
    fn concurrent_stores_do_not_collide() {
        use std::sync::Arc;

        let store = Arc::new(ReportStore::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                let mut ids = Vec::new();
                for _ in 0..50 {
                    ids.push(store.store(report(&format!("skill-{i}"), "")));
                }
                ids
            }));
        }

        let mut all_ids: Vec<String> = Vec::new();
        for h in handles {
            all_ids.extend(h.join().unwrap());
        }
        all_ids.sort();
        all_ids.dedup();
        assert_eq!(all_ids.len(), 400);
        assert_eq!(store.len(), 400);
    }
}
