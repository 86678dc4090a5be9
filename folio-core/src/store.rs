//! Where documents live between renders.
//!
//! The engine itself never touches storage; applications hand it parts read
//! from a `DocumentStore` and cache what comes back.

use folio_types::{Metadata, Parts};
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, VecDeque};
use std::num::NonZeroUsize;
use thiserror::Error;
use tracing::debug;

use crate::config::EngineConfig;
use crate::slug::slugify;
use crate::wiki::{RenderOptions, Wiki};

/// Length of each user's recently-changed list.
pub const LAST_CHANGED_MAX: usize = 10;

const HTML_CACHE_CAPACITY: usize = 256;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid user slug: '{0}'")]
    InvalidUser(String),

    #[error("Invalid document slug: '{0}'")]
    InvalidDocument(String),
}

pub trait DocumentStore: Send + Sync {
    fn get(&self, user: &str, doc: &str) -> Option<Parts>;

    /// Save a document. Its cached HTML is dropped and it moves to the
    /// front of the user's recently-changed list.
    fn set(&self, user: &str, doc: &str, parts: Parts, metadata: Metadata) -> Result<(), StoreError>;

    fn cache_get(&self, user: &str, doc: &str) -> Option<String>;

    fn cache_set(&self, user: &str, doc: &str, html: String);

    fn metadata_get(&self, user: &str, doc: &str) -> Option<Metadata>;

    fn metadata_set(&self, user: &str, doc: &str, metadata: Metadata);

    /// Document slugs, most recently changed first.
    fn last_changed_list(&self, user: &str) -> Vec<String>;
}

type Key = (String, String);

fn key(user: &str, doc: &str) -> Key {
    (user.to_string(), doc.to_string())
}

/// In-process store; safe to share between threads.
pub struct MemoryStore {
    documents: RwLock<BTreeMap<Key, Parts>>,
    metadata: RwLock<BTreeMap<Key, Metadata>>,
    last_changed: RwLock<BTreeMap<String, VecDeque<String>>>,
    html: Mutex<LruCache<Key, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(HTML_CACHE_CAPACITY)
    }

    /// `capacity` rendered documents are cached; at least one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            documents: RwLock::new(BTreeMap::new()),
            metadata: RwLock::new(BTreeMap::new()),
            last_changed: RwLock::new(BTreeMap::new()),
            html: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("documents", &self.documents.read().len())
            .field("cached", &self.html.lock().len())
            .finish()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, user: &str, doc: &str) -> Option<Parts> {
        self.documents.read().get(&key(user, doc)).cloned()
    }

    fn set(&self, user: &str, doc: &str, parts: Parts, metadata: Metadata) -> Result<(), StoreError> {
        if user.is_empty() || slugify(user) != user {
            return Err(StoreError::InvalidUser(user.to_string()));
        }
        if doc.is_empty() || slugify(doc) != doc {
            return Err(StoreError::InvalidDocument(doc.to_string()));
        }
        self.documents.write().insert(key(user, doc), parts);
        self.metadata.write().insert(key(user, doc), metadata);
        self.html.lock().pop(&key(user, doc));

        let mut last_changed = self.last_changed.write();
        let list = last_changed.entry(user.to_string()).or_default();
        list.retain(|slug| slug != doc);
        list.push_front(doc.to_string());
        list.truncate(LAST_CHANGED_MAX);
        debug!(user, doc, "stored document");
        Ok(())
    }

    fn cache_get(&self, user: &str, doc: &str) -> Option<String> {
        self.html.lock().get(&key(user, doc)).cloned()
    }

    fn cache_set(&self, user: &str, doc: &str, html: String) {
        self.html.lock().put(key(user, doc), html);
    }

    fn metadata_get(&self, user: &str, doc: &str) -> Option<Metadata> {
        self.metadata.read().get(&key(user, doc)).cloned()
    }

    fn metadata_set(&self, user: &str, doc: &str, metadata: Metadata) {
        self.metadata.write().insert(key(user, doc), metadata);
    }

    fn last_changed_list(&self, user: &str) -> Vec<String> {
        self.last_changed
            .read()
            .get(user)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Cached HTML for a stored document, rendering and caching it on a miss.
/// `None` when there is no such document.
pub fn render_stored(
    store: &dyn DocumentStore,
    user: &str,
    doc: &str,
    config: &EngineConfig,
) -> crate::error::Result<Option<String>> {
    if let Some(html) = store.cache_get(user, doc) {
        return Ok(Some(html));
    }
    let Some(parts) = store.get(user, doc) else {
        return Ok(None);
    };
    let mut config = config.clone();
    config.user = user.to_string();
    config.document = doc.to_string();
    let html = Wiki::new(config).process(&parts, RenderOptions::default())?;
    store.cache_set(user, doc, html.clone());
    Ok(Some(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(slug: &str) -> Metadata {
        Metadata {
            title: slug.to_string(),
            user: "ann".to_string(),
            slug: slug.to_string(),
            summary: String::new(),
            author: String::new(),
            email: String::new(),
            license: String::new(),
            publish: "YES".to_string(),
            todo: String::new(),
            date: String::new(),
            date_utc: None,
            word_count: 0,
            url: format!("/read/ann/{}", slug),
        }
    }

    fn document(text: &str) -> Parts {
        let mut parts = Parts::new();
        parts.insert("a".to_string(), text.to_string());
        parts
    }

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("ann", "doc", document("A\n\nText"), metadata("doc")).unwrap();
        assert_eq!(store.get("ann", "doc").unwrap()["a"], "A\n\nText");
        assert_eq!(store.metadata_get("ann", "doc").unwrap().slug, "doc");
        assert!(store.get("bob", "doc").is_none());
    }

    #[test]
    fn test_invalid_slugs() {
        let store = MemoryStore::new();
        assert_eq!(
            store.set("Ann Smith", "doc", Parts::new(), metadata("doc")),
            Err(StoreError::InvalidUser("Ann Smith".to_string()))
        );
        assert_eq!(
            store.set("ann", "", Parts::new(), metadata("doc")),
            Err(StoreError::InvalidDocument(String::new()))
        );
    }

    #[test]
    fn test_last_changed_is_capped_and_ordered() {
        let store = MemoryStore::new();
        for n in 0..12 {
            let slug = format!("doc-{}", n);
            store.set("ann", &slug, Parts::new(), metadata(&slug)).unwrap();
        }
        store.set("ann", "doc-5", Parts::new(), metadata("doc-5")).unwrap();
        let list = store.last_changed_list("ann");
        assert_eq!(list.len(), LAST_CHANGED_MAX);
        assert_eq!(list[0], "doc-5");
        assert_eq!(list[1], "doc-11");
        assert_eq!(list.iter().filter(|s| *s == "doc-5").count(), 1);
    }

    #[test]
    fn test_set_invalidates_cache() {
        let store = MemoryStore::new();
        let config = EngineConfig::default();
        store.set("ann", "doc", document("A\n\nFirst"), metadata("doc")).unwrap();
        let first = render_stored(&store, "ann", "doc", &config).unwrap().unwrap();
        assert!(first.contains("First"));
        assert!(first.contains("/edit/ann/doc/a"));
        assert_eq!(store.cache_get("ann", "doc"), Some(first));

        store.set("ann", "doc", document("A\n\nSecond"), metadata("doc")).unwrap();
        assert!(store.cache_get("ann", "doc").is_none());
        let second = render_stored(&store, "ann", "doc", &config).unwrap().unwrap();
        assert!(second.contains("Second"));
        assert!(render_stored(&store, "ann", "missing", &config).unwrap().is_none());
    }
}
