use crate::errors::MiniDbResult;
use crate::filter::{all, Filter};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Caches compiled filters by their exact source text.
///
/// A capacity of zero disables caching; every call then parses the text.
/// Texts that fail to parse are never cached.
pub struct FilterCache {
    entries: Option<Mutex<LruCache<String, Filter>>>,
    max_depth: usize,
}

impl FilterCache {
    pub fn new(capacity: usize, max_depth: usize) -> Self {
        FilterCache {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            max_depth,
        }
    }

    /// Returns the compiled filter for `text`, parsing it on a cache miss.
    pub fn get_or_compile(&self, text: &str) -> MiniDbResult<Filter> {
        if text.trim().is_empty() {
            return Ok(all());
        }

        let entries = match &self.entries {
            Some(entries) => entries,
            None => return Filter::parse_with_depth(text, self.max_depth),
        };

        if let Some(filter) = entries.lock().get(text) {
            return Ok(filter.clone());
        }

        // parse without holding the lock
        let filter = Filter::parse_with_depth(text, self.max_depth)?;
        log::debug!("Compiled filter {}", filter);
        entries.lock().put(text.to_string(), filter.clone());
        Ok(filter)
    }

    /// Resolves an optional filter argument; `None` matches all.
    pub fn resolve(&self, text: Option<&str>) -> MiniDbResult<Filter> {
        match text {
            Some(text) => self.get_or_compile(text),
            None => Ok(all()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map(|e| e.lock().len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries
            .as_ref()
            .map(|e| e.lock().cap().get())
            .unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;
    use crate::doc;

    #[test]
    fn caches_by_text() {
        let cache = FilterCache::new(4, 64);
        let first = cache.get_or_compile("$.a == 1").unwrap();
        let second = cache.get_or_compile("$.a == 1").unwrap();
        assert_eq!(cache.len(), 1);
        assert!(first.same_as(&second));

        // different text, same meaning, separate entry
        cache.get_or_compile("$.a==1").unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = FilterCache::new(2, 64);
        cache.get_or_compile("# == 0").unwrap();
        cache.get_or_compile("# == 1").unwrap();
        cache.get_or_compile("# == 0").unwrap();
        cache.get_or_compile("# == 2").unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn parse_failures_are_not_cached() {
        let cache = FilterCache::new(4, 64);
        assert!(cache.get_or_compile("$.a ==").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn empty_and_absent_match_all() {
        let cache = FilterCache::new(4, 64);
        assert!(cache.get_or_compile("").unwrap().is_match_all());
        assert!(cache.resolve(None).unwrap().is_match_all());
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity_disables_cache() {
        let cache = FilterCache::new(0, 64);
        let filter = cache.get_or_compile("$.x").unwrap();
        assert!(filter.matches(&Value::from(doc! { x: 1 }), 0));
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.capacity(), 0);
    }

    #[test]
    fn depth_limit_applies() {
        let cache = FilterCache::new(4, 2);
        assert!(cache.get_or_compile("!!!$.a").is_err());

        cache.clear();
        assert!(cache.is_empty());
    }
}
