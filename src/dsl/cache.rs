//! Compiled filter cache - one compile per distinct (profile, source)

use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

use super::filter::Filter;
use super::profile::ProfileId;
use crate::error::Result;

/// Memoizes compiled filters so repeated queries are parsed once.
///
/// Keyed by profile, then by source text, so a hit looks up the borrowed
/// `&str` without building an owned key.
#[derive(Debug, Default)]
pub struct FilterCache {
    filters: RwLock<AHashMap<ProfileId, AHashMap<String, Arc<Filter>>>>,
}

impl FilterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the compiled filter for `source`, compiling it on first use.
    /// Failed compiles are not cached.
    #[inline]
    pub fn get_or_parse(&self, source: &str, profile: ProfileId) -> Result<Arc<Filter>> {
        // Fast path: read lock only
        if let Some(filter) = self.get(source, profile) {
            return Ok(filter);
        }

        let filter = Arc::new(Filter::compile(source, profile)?);

        let mut filters = self.filters.write();
        let entry = filters
            .entry(profile)
            .or_default()
            .entry(source.to_string())
            .or_insert(filter);
        Ok(entry.clone())
    }

    /// Cached filter for `source`, if it was compiled before.
    pub fn get(&self, source: &str, profile: ProfileId) -> Option<Arc<Filter>> {
        self.filters
            .read()
            .get(&profile)
            .and_then(|by_source| by_source.get(source))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.filters.read().values().map(|by_source| by_source.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.filters.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_hit() {
        let cache = FilterCache::new();

        let first = cache.get_or_parse("has Konami", ProfileId::Substring).unwrap();
        assert_eq!(cache.len(), 1);

        let second = cache.get_or_parse("has Konami", ProfileId::Substring).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_profile_is_part_of_the_key() {
        let cache = FilterCache::new();
        cache.get_or_parse("has Konami", ProfileId::Substring).unwrap();
        cache.get_or_parse("has Konami", ProfileId::SetMembership).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = FilterCache::new();
        assert!(cache.get_or_parse("has", ProfileId::Substring).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = FilterCache::new();
        cache.get_or_parse("year == 1990", ProfileId::NumericYear).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lookup_by_borrowed_source() {
        let cache = FilterCache::new();
        assert!(cache.get("has Konami", ProfileId::Substring).is_none());

        let compiled = cache.get_or_parse("has Konami", ProfileId::Substring).unwrap();
        let source = String::from("has Konami");
        let cached = cache.get(source.as_str(), ProfileId::Substring).unwrap();
        assert!(Arc::ptr_eq(&compiled, &cached));
        assert!(cache.get("has Konami", ProfileId::SetMembership).is_none());
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = FilterCache::new();
        let first = cache.get_or_parse("year >= 1980", ProfileId::NumericYear).unwrap();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let hit = cache.get_or_parse("year >= 1980", ProfileId::NumericYear).unwrap();
                    assert!(Arc::ptr_eq(&first, &hit));
                });
            }
        });
        assert_eq!(cache.len(), 1);
    }
}
