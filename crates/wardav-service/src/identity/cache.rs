//! Time-bucketed memoization with single-flight semantics.
//!
//! ## Summary
//! Entries are keyed by `(bucket, key)` where `bucket = now / width`. Within
//! one bucket, concurrent callers for the same key share one `OnceCell`, so at
//! most one initializer runs and everyone who joined it observes its result,
//! error included. A failed entry is dropped once settled; the next caller
//! starts a fresh attempt.
//!
//! The first access in a new bucket drops every entry from older buckets.
//! Once `max_entries` is reached, unseen keys still collapse while in flight
//! but their results are not kept.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::OnceCell;

use super::clock::Clock;

type Slot<V, E> = Arc<OnceCell<Result<V, E>>>;

pub struct BucketCache<K, V, E> {
    entries: DashMap<(u64, K), Slot<V, E>>,
    clock: Arc<dyn Clock>,
    bucket_secs: u64,
    max_entries: usize,
    swept_bucket: AtomicU64,
}

impl<K, V, E> BucketCache<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    /// ## Summary
    /// Creates an empty cache. A zero `bucket_secs` or `max_entries` is
    /// raised to one.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, bucket_secs: u64, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            bucket_secs: bucket_secs.max(1),
            max_entries: max_entries.max(1),
            swept_bucket: AtomicU64::new(0),
        }
    }

    /// Returns the bucket the clock currently falls into.
    #[must_use]
    pub fn current_bucket(&self) -> u64 {
        self.clock.now_secs() / self.bucket_secs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// ## Summary
    /// Returns the value memoized for `key` in the current bucket, running
    /// `init` if there is none yet.
    ///
    /// Callers arriving while `init` is in flight wait for it and receive a
    /// clone of its result, whether value or error.
    ///
    /// ## Errors
    /// Returns the error produced by `init`. The entry is removed once the
    /// error is delivered, so it is never served to later callers.
    pub async fn get_or_try_insert_with<F, Fut>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let bucket = self.current_bucket();
        self.evict_stale(bucket);

        let cache_key = (bucket, key);
        let existing = self
            .entries
            .get(&cache_key)
            .map(|slot| Arc::clone(slot.value()));

        let (slot, keep) = match existing {
            Some(slot) => (slot, true),
            None => {
                let full = self.entries.len() >= self.max_entries;
                if full {
                    tracing::warn!(
                        max_entries = self.max_entries,
                        "Identity cache full, result will not be kept"
                    );
                }
                let slot = Arc::clone(self.entries.entry(cache_key.clone()).or_default().value());
                // A sweep for a newer bucket may have run between reading the
                // clock and inserting; such an entry would outlive its bucket.
                let stale = self.swept_bucket.load(Ordering::Acquire) > bucket;
                (slot, !(full || stale))
            }
        };

        let result = slot.get_or_init(init).await.clone();
        if !keep || result.is_err() {
            self.entries
                .remove_if(&cache_key, |_, current| Arc::ptr_eq(current, &slot));
        }
        result
    }

    fn evict_stale(&self, bucket: u64) {
        let swept = self.swept_bucket.load(Ordering::Acquire);
        if bucket <= swept {
            return;
        }
        if self
            .swept_bucket
            .compare_exchange(swept, bucket, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let before = self.entries.len();
            self.entries
                .retain(|(entry_bucket, _), _| *entry_bucket >= bucket);
            tracing::trace!(
                bucket,
                evicted = before.saturating_sub(self.entries.len()),
                "Evicted stale identity cache buckets"
            );
        }
    }
}
