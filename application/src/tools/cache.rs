//! Per-run result cache.
//!
//! Memoizes successful tool results by [`CacheKey`]. Failures are never
//! stored, so a repeated call after a failure reaches the remote service
//! again. There is no expiry: a cache lives exactly as long as its run.

use costpilot_domain::{CacheKey, ToolResult};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<CacheKey, ToolResult>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

/// A cache answer, tagged with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup {
    pub result: ToolResult,
    pub cached: bool,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<ToolResult> {
        self.lock().get(key).cloned()
    }

    /// Return the stored result for `key`, or run `compute` and store its
    /// result if it is a success.
    ///
    /// The lock is not held while `compute` runs, so two concurrent misses on
    /// the same key may both compute; the later success overwrites the
    /// earlier one.
    pub async fn get_or_compute<F, Fut>(&self, key: CacheKey, compute: F) -> CacheLookup
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ToolResult>,
    {
        if let Some(result) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Using cached data for {}", key);
            return CacheLookup {
                result,
                cached: true,
            };
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let result = compute().await;
        if result.is_success() {
            self.lock().insert(key, result.clone());
        }
        CacheLookup {
            result,
            cached: false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, ToolResult>> {
        // A panic mid-insert cannot leave a half-written entry behind.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costpilot_domain::Arguments;
    use serde_json::json;
    use std::sync::atomic::AtomicU32;

    fn key(region: &str) -> CacheKey {
        let mut args = Arguments::new();
        args.insert("region".into(), json!(region));
        CacheKey::new("get_ec2_instances", &args)
    }

    #[tokio::test]
    async fn success_is_memoized() {
        let cache = ResultCache::new();
        let computed = AtomicU32::new(0);

        for _ in 0..3 {
            let lookup = cache
                .get_or_compute(key("us-east-1"), || {
                    computed.fetch_add(1, Ordering::SeqCst);
                    async { ToolResult::success(json!({"data": [1, 2, 3]})) }
                })
                .await;
            assert!(lookup.result.is_success());
        }

        assert_eq!(computed.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 1);
    }

    #[tokio::test]
    async fn failure_is_not_stored() {
        let cache = ResultCache::new();
        let computed = AtomicU32::new(0);

        for _ in 0..2 {
            let lookup = cache
                .get_or_compute(key("us-east-1"), || {
                    computed.fetch_add(1, Ordering::SeqCst);
                    async { ToolResult::failure("AccessDenied", "no", false) }
                })
                .await;
            assert!(!lookup.cached);
        }

        assert_eq!(computed.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn distinct_keys_are_independent() {
        let cache = ResultCache::new();
        cache
            .get_or_compute(key("us-east-1"), || async { ToolResult::success(json!(1)) })
            .await;
        let lookup = cache
            .get_or_compute(key("eu-west-1"), || async { ToolResult::success(json!(2)) })
            .await;

        assert!(!lookup.cached);
        assert_eq!(lookup.result.data(), Some(&json!(2)));
        assert_eq!(cache.get(&key("us-east-1")).and_then(|r| r.data().cloned()), Some(json!(1)));
    }
}
