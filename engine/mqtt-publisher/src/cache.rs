//! Last-published payload cache
//!
//! Maps a publish key to the payload text last sent under it. Lives as long as the
//! process; nothing is persisted, so the first cycle after a restart republishes all.

use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Default)]
pub struct PublishCache {
    entries: HashMap<String, String>,
}

impl PublishCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// True only when a payload is cached for `key` and it equals `payload`
    pub fn is_unchanged(&self, key: &str, payload: &str) -> bool {
        let unchanged = self.entries.get(key).is_some_and(|cached| cached == payload);
        trace!("Cache {} for key: {}", if unchanged { "hit" } else { "miss" }, key);
        unchanged
    }

    /// Remember `payload` as the last one published under `key`
    pub fn store(&mut self, key: &str, payload: String) {
        self.entries.insert(key.to_string(), payload);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cache_reports_change() {
        let cache = PublishCache::new();
        assert!(!cache.is_unchanged("Avanza/ISK", "{}"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_store_and_compare() {
        let mut cache = PublishCache::new();
        cache.store("Avanza/ISK", r#"{"capital":10000}"#.to_string());

        assert!(cache.is_unchanged("Avanza/ISK", r#"{"capital":10000}"#));
        assert!(!cache.is_unchanged("Avanza/ISK", r#"{"capital":10010}"#));
        assert!(!cache.is_unchanged("Avanza/KF", r#"{"capital":10000}"#));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cache = PublishCache::new();
        cache.store("a", "1".to_string());
        cache.store("b", "2".to_string());

        assert_eq!(cache.remove("a").as_deref(), Some("1"));
        assert_eq!(cache.get("b"), Some("2"));

        cache.clear();
        assert!(cache.is_empty());
    }
}
