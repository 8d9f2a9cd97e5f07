//! Prefetch ledger
//!
//! Set of routes whose loader has completed successfully. Insertion is the
//! only mutation in normal operation and each path enters at most once;
//! [`PrefetchLedger::clear`] exists for test isolation.

use crate::types::RoutePath;
use dashmap::DashSet;

/// Dedup ledger of completed prefetches
#[derive(Debug, Default)]
pub struct PrefetchLedger {
    completed: DashSet<RoutePath>,
}

impl PrefetchLedger {
    /// Create empty ledger
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if path has completed
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.completed.contains(path)
    }

    /// Record completion
    ///
    /// Returns `true` only for the first insertion of `path`.
    #[inline]
    pub fn mark_completed(&self, path: RoutePath) -> bool {
        self.completed.insert(path)
    }

    /// Number of completed paths
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.completed.len()
    }

    /// Check if nothing has completed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Completed paths, sorted
    #[must_use]
    pub fn snapshot(&self) -> Vec<RoutePath> {
        let mut paths: Vec<_> = self.completed.iter().map(|p| p.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Forget every completion
    #[inline]
    pub fn clear(&self) {
        self.completed.clear();
    }
}
