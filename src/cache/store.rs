//! Read-through cache of resolved property values.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use lru::LruCache;
use metrics::counter;
use tracing::{debug, info};

use crate::domain::values::SettingValue;

use super::config::CacheConfig;
use super::keys::SettingsKey;
use super::lock::mutex_lock;
use super::tags::TagIndex;

const SOURCE: &str = "cache::store";

const METRIC_HIT: &str = "settlekeep_cache_hit_total";
const METRIC_MISS: &str = "settlekeep_cache_miss_total";
const METRIC_EVICT: &str = "settlekeep_cache_evict_total";
const METRIC_LOAD_FAILED: &str = "settlekeep_cache_load_failed_total";

/// Per-tag counter, bumped by invalidations that race with a running load.
type Epoch = u64;

#[derive(Default)]
struct InFlight {
    loads: usize,
    epoch: Epoch,
}

struct CacheState {
    entries: LruCache<SettingsKey, SettingValue>,
    tags: TagIndex,
    in_flight: HashMap<String, InFlight>,
}

impl CacheState {
    fn begin_load(&mut self, tag: &str) -> Epoch {
        let slot = self.in_flight.entry(tag.to_string()).or_default();
        slot.loads += 1;
        slot.epoch
    }

    fn finish_load(&mut self, tag: &str) {
        if let Some(slot) = self.in_flight.get_mut(tag) {
            slot.loads -= 1;
            if slot.loads == 0 {
                self.in_flight.remove(tag);
            }
        }
    }

    fn epoch(&self, tag: &str) -> Epoch {
        self.in_flight
            .get(tag)
            .map(|slot| slot.epoch)
            .unwrap_or_default()
    }
}

/// Ends an in-flight load when dropped, including when the caller's future is cancelled.
struct LoadGuard<'a> {
    cache: &'a SettingsCache,
    tag: &'a str,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        mutex_lock(&self.cache.state, SOURCE, "finish_load").finish_load(self.tag);
    }
}

/// Tag-aware settings cache.
///
/// The lock is never held while a loader runs. A load whose tag was
/// invalidated in the meantime returns its value but does not store it.
pub struct SettingsCache {
    enabled: bool,
    state: Mutex<CacheState>,
}

impl SettingsCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            enabled: config.enabled,
            state: Mutex::new(CacheState {
                entries: LruCache::new(config.max_entries_non_zero()),
                tags: TagIndex::default(),
                in_flight: HashMap::new(),
            }),
        }
    }

    /// Returns the cached value or runs `loader` and caches its success.
    ///
    /// Loader errors are returned unchanged and nothing is cached.
    pub async fn get_or_load<F, Fut, E>(&self, key: &SettingsKey, loader: F) -> Result<SettingValue, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SettingValue, E>>,
    {
        if !self.enabled {
            return loader().await;
        }

        let epoch = {
            let mut state = mutex_lock(&self.state, SOURCE, "get_or_load");
            if let Some(value) = state.entries.get(key) {
                counter!(METRIC_HIT).increment(1);
                debug!(cache_key = %key, result = "hit", "Settings cache lookup");
                return Ok(value.clone());
            }
            state.begin_load(key.tag())
        };
        let _guard = LoadGuard {
            cache: self,
            tag: key.tag(),
        };

        counter!(METRIC_MISS).increment(1);
        debug!(cache_key = %key, result = "miss", "Settings cache lookup");

        match loader().await {
            Ok(value) => {
                self.store(key, value.clone(), epoch);
                Ok(value)
            }
            Err(err) => {
                counter!(METRIC_LOAD_FAILED).increment(1);
                Err(err)
            }
        }
    }

    fn store(&self, key: &SettingsKey, value: SettingValue, loaded_at: Epoch) {
        let mut state = mutex_lock(&self.state, SOURCE, "store");
        if state.epoch(key.tag()) != loaded_at {
            debug!(
                cache_key = %key,
                result = "stale_discarded",
                "Settings cache skipped a load that raced with invalidation"
            );
            return;
        }

        state.tags.register(key);
        if let Some((evicted, _)) = state.entries.push(key.clone(), value)
            && evicted != *key
        {
            state.tags.unregister(&evicted);
            counter!(METRIC_EVICT).increment(1);
            debug!(cache_key = %evicted, result = "evicted", "Settings cache eviction");
        }
    }

    /// Drops every entry created under `tag`. Unknown tags are a no-op.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        let mut state = mutex_lock(&self.state, SOURCE, "invalidate_tag");
        if let Some(slot) = state.in_flight.get_mut(tag) {
            slot.epoch += 1;
        }

        let keys = state.tags.take(tag);
        for key in &keys {
            state.entries.pop(key);
        }

        info!(tag, removed = keys.len(), "Settings cache tag invalidated");
        keys.len()
    }

    pub fn contains(&self, key: &SettingsKey) -> bool {
        mutex_lock(&self.state, SOURCE, "contains")
            .entries
            .contains(key)
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.state, SOURCE, "len").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn tracked_tags(&self) -> usize {
        mutex_lock(&self.state, SOURCE, "tracked_tags").in_flight.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use super::*;

    fn cache(max_entries: usize) -> SettingsCache {
        SettingsCache::new(&CacheConfig {
            enabled: true,
            max_entries,
        })
    }

    async fn load(
        cache: &SettingsCache,
        key: &SettingsKey,
        value: i64,
        calls: &AtomicUsize,
    ) -> SettingValue {
        cache
            .get_or_load(key, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(SettingValue::Integer(value))
            })
            .await
            .expect("load")
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = cache(8);
        let calls = AtomicUsize::new(0);
        let key = SettingsKey::new("Billing", "vat");

        assert_eq!(load(&cache, &key, 21, &calls).await, SettingValue::Integer(21));
        assert_eq!(load(&cache, &key, 99, &calls).await, SettingValue::Integer(21));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&key));
    }

    #[tokio::test]
    async fn failed_loads_are_not_cached() {
        let cache = cache(8);
        let key = SettingsKey::new("Billing", "vat");

        let result = cache
            .get_or_load(&key, || async { Err::<SettingValue, _>("store down") })
            .await;
        assert_eq!(result, Err("store down"));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn invalidate_tag_drops_only_that_class() {
        let cache = cache(8);
        let calls = AtomicUsize::new(0);
        let vat = SettingsKey::new("Billing", "vat");
        let currency = SettingsKey::new("Billing", "currency");
        let sender = SettingsKey::new("Mailer", "sender");

        load(&cache, &vat, 1, &calls).await;
        load(&cache, &currency, 2, &calls).await;
        load(&cache, &sender, 3, &calls).await;

        assert_eq!(cache.invalidate_tag("Billing"), 2);
        assert!(!cache.contains(&vat));
        assert!(!cache.contains(&currency));
        assert!(cache.contains(&sender));
        assert_eq!(cache.invalidate_tag("Unknown"), 0);

        load(&cache, &vat, 4, &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn eviction_cleans_tag_index() {
        let cache = cache(1);
        let calls = AtomicUsize::new(0);
        let first = SettingsKey::new("Billing", "vat");
        let second = SettingsKey::new("Mailer", "sender");

        load(&cache, &first, 1, &calls).await;
        load(&cache, &second, 2, &calls).await;
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains(&first));

        assert_eq!(cache.invalidate_tag("Billing"), 0);
        assert_eq!(cache.invalidate_tag("Mailer"), 1);
    }

    #[tokio::test]
    async fn disabled_cache_always_loads() {
        let cache = SettingsCache::new(&CacheConfig::disabled());
        let calls = AtomicUsize::new(0);
        let key = SettingsKey::new("Billing", "vat");

        load(&cache, &key, 1, &calls).await;
        load(&cache, &key, 1, &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn load_racing_with_invalidation_is_not_stored() {
        let cache = Arc::new(cache(8));
        let key = SettingsKey::new("Billing", "vat");
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let task = {
            let cache = cache.clone();
            let key = key.clone();
            let started = started.clone();
            let release = release.clone();
            tokio::spawn(async move {
                cache
                    .get_or_load(&key, || async move {
                        started.notify_one();
                        release.notified().await;
                        Ok::<_, ()>(SettingValue::Integer(1))
                    })
                    .await
            })
        };

        started.notified().await;
        cache.invalidate_tag("Billing");
        release.notify_one();

        assert_eq!(task.await.expect("join"), Ok(SettingValue::Integer(1)));
        assert!(!cache.contains(&key));
        assert_eq!(cache.tracked_tags(), 0);
    }

    #[tokio::test]
    async fn invalidating_unknown_tags_keeps_no_state() {
        let cache = cache(8);
        let calls = AtomicUsize::new(0);
        let key = SettingsKey::new("Billing", "vat");

        for i in 0..1000 {
            assert_eq!(cache.invalidate_tag(&format!("Unknown{i}")), 0);
        }
        assert_eq!(cache.tracked_tags(), 0);

        load(&cache, &key, 1, &calls).await;
        assert_eq!(cache.invalidate_tag("Billing"), 1);
        assert_eq!(cache.tracked_tags(), 0);

        let failed = cache
            .get_or_load(&key, || async { Err::<SettingValue, _>("store down") })
            .await;
        assert!(failed.is_err());
        assert_eq!(cache.tracked_tags(), 0);

        load(&cache, &key, 2, &calls).await;
        assert!(cache.contains(&key));
    }
}
