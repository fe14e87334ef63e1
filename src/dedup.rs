//! Dedup cache: fingerprints of tasks that have already succeeded.
//!
//! Scoped to the process lifetime, so a fingerprint that succeeded in an
//! earlier run is treated as a no-op success in later runs rather than
//! re-triggering the download. No eviction; unbounded growth is an
//! accepted trade-off at session-scale batch sizes.

use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::task::Fingerprint;

/// Set of fingerprints whose dispatch succeeded at least once.
#[derive(Debug, Default)]
pub struct DedupCache {
    done: RwLock<HashSet<Fingerprint>>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Has this fingerprint already been processed successfully?
    pub async fn has(&self, fingerprint: Fingerprint) -> bool {
        self.done.read().await.contains(&fingerprint)
    }

    /// Permanently record a successful fingerprint.
    pub async fn mark_done(&self, fingerprint: Fingerprint) {
        self.done.write().await.insert(fingerprint);
    }

    /// Number of cached fingerprints.
    pub async fn len(&self) -> usize {
        self.done.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.done.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mark_and_check() {
        let cache = DedupCache::new();
        let fp = Fingerprint::of("doc 1");

        assert!(!cache.has(fp).await);
        cache.mark_done(fp).await;
        assert!(cache.has(fp).await);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn identical_content_collapses() {
        let cache = DedupCache::new();
        cache.mark_done(Fingerprint::of("doc 1")).await;
        cache.mark_done(Fingerprint::of("  doc 1 ")).await;
        assert_eq!(cache.len().await, 1);
    }
}
