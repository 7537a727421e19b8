//! Tag index for grouped invalidation.

use std::collections::{HashMap, HashSet};

use super::keys::SettingsKey;

/// Tracks tag → keys so a whole class can be dropped at once.
///
/// Not synchronised on its own; lives inside the cache state mutex.
#[derive(Debug, Default)]
pub(crate) struct TagIndex {
    tag_to_keys: HashMap<String, HashSet<SettingsKey>>,
}

impl TagIndex {
    pub(crate) fn register(&mut self, key: &SettingsKey) {
        self.tag_to_keys
            .entry(key.tag().to_string())
            .or_default()
            .insert(key.clone());
    }

    /// Called when an entry is evicted.
    pub(crate) fn unregister(&mut self, key: &SettingsKey) {
        if let Some(keys) = self.tag_to_keys.get_mut(key.tag()) {
            keys.remove(key);
            if keys.is_empty() {
                self.tag_to_keys.remove(key.tag());
            }
        }
    }

    /// Removes the tag and returns every key that carried it.
    pub(crate) fn take(&mut self, tag: &str) -> HashSet<SettingsKey> {
        self.tag_to_keys.remove(tag).unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn tag_count(&self) -> usize {
        self.tag_to_keys.len()
    }
}
