//! Parsed stylesheet cache keyed by content hash.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::Stylesheet;
use crate::error::Result;
use crate::util::content_hash;

/// Parsed stylesheets keyed by the SHA-1 of their text.
///
/// Grading many submissions against the same provided stylesheets (resets,
/// font sheets) parses each once. The cache is an explicit value: share it
/// by reference across runs, or don't use one at all.
#[derive(Debug, Default)]
pub struct StylesheetCache {
    entries: Mutex<HashMap<String, Arc<Stylesheet>>>,
}

impl StylesheetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached parse of `css`, parsing it on a miss.
    ///
    /// Parse failures are not cached.
    pub fn get_or_parse(&self, css: &str) -> Result<Arc<Stylesheet>> {
        let key = content_hash(css);
        if let Some(sheet) = self.lock().get(&key) {
            tracing::trace!(%key, "stylesheet cache hit");
            return Ok(Arc::clone(sheet));
        }

        // Parse outside the lock; a racing insert of the same key is harmless.
        let sheet = Arc::new(Stylesheet::parse(css)?);
        self.lock().insert(key, Arc::clone(&sheet));
        Ok(sheet)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Stylesheet>>> {
        // Entries are immutable once inserted, so a poisoned map is still sound.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_text_parsed_once() {
        let cache = StylesheetCache::new();
        let a = cache.get_or_parse("p { color: red }").unwrap();
        let b = cache.get_or_parse("p { color: red }").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        cache.get_or_parse("p { color: blue }").unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_errors_not_cached() {
        let cache = StylesheetCache::new();
        assert!(cache.get_or_parse("p { color }").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = StylesheetCache::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| cache.get_or_parse("a { top: 0 }").unwrap());
            }
        });
        assert_eq!(cache.len(), 1);
    }
}
