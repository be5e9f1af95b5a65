//! Template store
//!
//! Caches parsed definitions by namespace location, including negative
//! lookups. Entries live until [`TemplateStore::reload`] or
//! [`TemplateStore::invalidate`]; there is no TTL.

use crate::definition::TemplateDefinition;
use crate::source::TemplateSource;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Snapshot of one cached location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    pub location: String,
    /// `false` for a cached negative lookup
    pub present: bool,
}

/// Caching front for a [`TemplateSource`]
#[derive(Debug, Clone)]
pub struct TemplateStore {
    source: Arc<dyn TemplateSource>,
    entries: Arc<DashMap<String, Option<Arc<TemplateDefinition>>>>,
}

impl TemplateStore {
    /// Create store over a source
    #[must_use]
    pub fn new(source: Arc<dyn TemplateSource>) -> Self {
        Self {
            source,
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Underlying source
    #[inline]
    #[must_use]
    pub fn source(&self) -> &Arc<dyn TemplateSource> {
        &self.source
    }

    /// Definition at `location`, if it exists and parses
    ///
    /// Parse failures are logged and cached as absent. Source I/O failures
    /// are logged and reported as absent without caching.
    pub async fn get(&self, location: &str) -> Option<Arc<TemplateDefinition>> {
        if let Some(entry) = self.entries.get(location) {
            debug!(location, present = entry.is_some(), "template cache hit");
            return entry.value().clone();
        }

        let loaded = match self.source.fetch(location).await {
            Ok(Some(raw)) => match TemplateDefinition::parse(location, &raw) {
                Ok(def) => Some(Arc::new(def)),
                Err(error) => {
                    warn!(location, %error, "template failed to parse, treating as absent");
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                warn!(location, %error, "template source failed, treating as absent");
                return None;
            }
        };

        debug!(location, present = loaded.is_some(), "template cache fill");
        self.entries.insert(location.to_string(), loaded.clone());
        loaded
    }

    /// Load a set of locations ahead of time; returns how many exist
    pub async fn preload<I, S>(&self, locations: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut found = 0;
        for location in locations {
            if self.get(location.as_ref()).await.is_some() {
                found += 1;
            }
        }
        found
    }

    /// Drop one cached location
    pub fn invalidate(&self, location: &str) {
        self.entries.remove(location);
    }

    /// Drop every cached location
    pub fn reload(&self) {
        self.entries.clear();
    }

    /// Cached locations, sorted
    #[must_use]
    pub fn cached(&self) -> Vec<CachedEntry> {
        let mut out: Vec<CachedEntry> = self
            .entries
            .iter()
            .map(|e| CachedEntry {
                location: e.key().clone(),
                present: e.value().is_some(),
            })
            .collect();
        out.sort_by(|a, b| a.location.cmp(&b.location));
        out
    }

    /// Number of cached locations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::source::MemoryTemplateSource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingSource {
        inner: MemoryTemplateSource,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl TemplateSource for CountingSource {
        async fn fetch(&self, location: &str) -> Result<Option<String>, LoadError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(location).await
        }

        async fn list(&self) -> Result<Vec<String>, LoadError> {
            self.inner.list().await
        }
    }

    #[derive(Debug)]
    struct BrokenSource;

    #[async_trait]
    impl TemplateSource for BrokenSource {
        async fn fetch(&self, location: &str) -> Result<Option<String>, LoadError> {
            Err(LoadError::io_error(
                location,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            ))
        }

        async fn list(&self) -> Result<Vec<String>, LoadError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn caches_hits_and_misses() {
        let source = Arc::new(CountingSource::default());
        source.inner.insert("jira/ticket/generic", "# {{ title }}");
        let store = TemplateStore::new(source.clone());

        assert!(store.get("jira/ticket/generic").await.is_some());
        assert!(store.get("jira/ticket/generic").await.is_some());
        assert!(store.get("jira/ticket/react").await.is_none());
        assert!(store.get("jira/ticket/react").await.is_none());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);

        assert_eq!(
            store.cached(),
            vec![
                CachedEntry {
                    location: "jira/ticket/generic".into(),
                    present: true
                },
                CachedEntry {
                    location: "jira/ticket/react".into(),
                    present: false
                },
            ]
        );
    }

    #[tokio::test]
    async fn reload_picks_up_new_templates() {
        let source = Arc::new(CountingSource::default());
        let store = TemplateStore::new(source.clone());
        assert!(store.get("custom/defaults/ticket").await.is_none());

        source.inner.insert("custom/defaults/ticket", "body");
        assert!(store.get("custom/defaults/ticket").await.is_none());

        store.reload();
        assert!(store.is_empty());
        assert!(store.get("custom/defaults/ticket").await.is_some());

        source.inner.remove("custom/defaults/ticket");
        store.invalidate("custom/defaults/ticket");
        assert!(store.get("custom/defaults/ticket").await.is_none());
    }

    #[tokio::test]
    async fn unparseable_templates_are_absent() {
        let source = Arc::new(MemoryTemplateSource::new().with_template("a/b/c", "{% if %}"));
        let store = TemplateStore::new(source);
        assert!(store.get("a/b/c").await.is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn source_errors_are_absent_and_not_cached() {
        let store = TemplateStore::new(Arc::new(BrokenSource));
        assert!(store.get("a/b/c").await.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn preload_counts_existing() {
        let source = Arc::new(MemoryTemplateSource::new().with_template("x/y/z", "z"));
        let store = TemplateStore::new(source);
        assert_eq!(store.preload(["x/y/z", "x/y/generic"]).await, 1);
        assert_eq!(store.len(), 2);
    }
}
