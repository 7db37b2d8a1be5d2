//! Per-run in-memory cache of raw search-result documents.
//!
//! Keyed by normalised keyword, valued by the raw HTML body. The cache
//! is owned by one run's context and dropped with it — nothing is shared
//! across runs or persisted. A retry explicitly invalidates its keyword's
//! entry before refetching, so retries always hit the network.

use std::sync::Arc;

use moka::future::Cache;

/// Keyword → raw document cache scoped to a single run.
#[derive(Debug, Clone)]
pub struct DocumentCache {
    inner: Cache<String, Arc<String>>,
}

impl DocumentCache {
    /// Create a cache holding at most `capacity` documents.
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Look up the cached document for a keyword.
    pub async fn get(&self, keyword: &str) -> Option<Arc<String>> {
        self.inner.get(&normalize_key(keyword)).await
    }

    /// Store a keyword's raw document.
    pub async fn insert(&self, keyword: &str, document: String) {
        self.inner
            .insert(normalize_key(keyword), Arc::new(document))
            .await;
    }

    /// Drop a keyword's entry so the next fetch hits the network.
    pub async fn invalidate(&self, keyword: &str) {
        self.inner.invalidate(&normalize_key(keyword)).await;
    }
}

/// Keywords differing only in surrounding whitespace or ASCII case share
/// one cache entry.
fn normalize_key(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn miss_returns_none() {
        let cache = DocumentCache::new(16);
        assert!(cache.get("never inserted").await.is_none());
    }

    #[tokio::test]
    async fn insert_and_retrieve() {
        let cache = DocumentCache::new(16);
        cache.insert("camping chairs", "<html>doc</html>".into()).await;

        let doc = cache.get("camping chairs").await.expect("should be cached");
        assert_eq!(doc.as_str(), "<html>doc</html>");
    }

    #[tokio::test]
    async fn key_normalises_case_and_whitespace() {
        let cache = DocumentCache::new(16);
        cache.insert("  Camping Chairs ", "<html/>".into()).await;
        assert!(cache.get("camping chairs").await.is_some());
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = DocumentCache::new(16);
        cache.insert("keyword", "<html/>".into()).await;
        cache.invalidate("keyword").await;
        assert!(cache.get("keyword").await.is_none());
    }

    #[tokio::test]
    async fn invalidate_leaves_other_keywords_alone() {
        let cache = DocumentCache::new(16);
        cache.insert("alpha", "<a/>".into()).await;
        cache.insert("beta", "<b/>".into()).await;
        cache.invalidate("alpha").await;
        assert!(cache.get("alpha").await.is_none());
        assert!(cache.get("beta").await.is_some());
    }

    #[tokio::test]
    async fn overwrite_same_keyword_updates_document() {
        let cache = DocumentCache::new(16);
        cache.insert("keyword", "old".into()).await;
        cache.insert("keyword", "new".into()).await;
        let doc = cache.get("keyword").await.expect("should be cached");
        assert_eq!(doc.as_str(), "new");
    }

    #[test]
    fn cache_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DocumentCache>();
    }
}
