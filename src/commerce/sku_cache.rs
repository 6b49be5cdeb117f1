use crate::{cli::globals::GlobalArgs, APP_USER_AGENT};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, instrument};

/// Source of the restricted product codes.
#[async_trait]
pub trait SkuSource: Send + Sync {
    /// # Errors
    /// Returns an error when the source is unreachable or returns an
    /// unexpected document.
    async fn fetch(&self) -> Result<Vec<String>>;
}

/// Fetches restricted SKUs from a JSON endpoint. Accepts either a plain
/// array of codes or an array of objects carrying a `sku` field.
#[derive(Debug, Clone)]
pub struct HttpSkuSource {
    client: Client,
    url: String,
}

impl HttpSkuSource {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(globals: &GlobalArgs) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            url: globals.sku_source_url.clone(),
        })
    }
}

#[async_trait]
impl SkuSource for HttpSkuSource {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Vec<String>> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            error!("Failed to fetch restricted SKUs: {status}");
            return Err(anyhow!("SKU source status {status}"));
        }

        let body: Value = response.json().await?;

        let entries = body
            .as_array()
            .ok_or_else(|| anyhow!("SKU source did not return an array"))?;

        let skus = entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(code) => Some(code.clone()),
                Value::Object(map) => map
                    .get("sku")
                    .and_then(Value::as_str)
                    .map(ToString::to_string),
                _ => None,
            })
            .collect();

        Ok(skus)
    }
}

/// Process-lifetime set of restricted product codes.
///
/// The set is populated on first use and kept for the life of the process.
/// The load is single-flight: the write lock is held across the fetch so
/// concurrent first callers wait for one outcome instead of issuing
/// duplicate loads. Once loaded the set is immutable and queries only take
/// the read lock. An empty set after a failed load is retried on the next
/// call.
#[derive(Clone)]
pub struct SkuCache {
    source: Arc<dyn SkuSource>,
    set: Arc<RwLock<HashSet<String>>>,
}

impl SkuCache {
    #[must_use]
    pub fn new(source: Arc<dyn SkuSource>) -> Self {
        Self {
            source,
            set: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Populate the set from the source if it has not been loaded yet.
    ///
    /// # Errors
    /// Propagates the source failure; the set stays empty so a later call
    /// retries the load.
    pub async fn ensure_loaded(&self) -> Result<()> {
        if !self.set.read().await.is_empty() {
            return Ok(());
        }

        let mut set = self.set.write().await;
        // Another loader may have won while we waited for the write lock
        if !set.is_empty() {
            return Ok(());
        }

        let skus = self.source.fetch().await?;
        set.extend(skus.into_iter().map(|sku| sku.to_uppercase()));

        info!("Loaded {} restricted SKUs", set.len());

        Ok(())
    }

    /// Case-insensitive membership test.
    pub async fn contains(&self, sku: &str) -> bool {
        let set = self.set.read().await;
        set.contains(&sku.to_uppercase())
    }

    /// The subset of `skus` present in the restricted set, preserving the
    /// caller's order. Inputs are expected to be uppercased already.
    pub async fn restricted_among(&self, skus: &[String]) -> Vec<String> {
        let set = self.set.read().await;
        skus.iter()
            .filter(|sku| set.contains(*sku))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        skus: Vec<String>,
        fail_first: bool,
    }

    impl CountingSource {
        fn new(skus: &[&str]) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                skus: skus.iter().map(ToString::to_string).collect(),
                fail_first: false,
            }
        }

        fn failing_first(skus: &[&str]) -> Self {
            Self {
                fail_first: true,
                ..Self::new(skus)
            }
        }
    }

    #[async_trait]
    impl SkuSource for CountingSource {
        async fn fetch(&self) -> Result<Vec<String>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && call == 0 {
                return Err(anyhow!("source unavailable"));
            }
            Ok(self.skus.clone())
        }
    }

    #[tokio::test]
    async fn test_loads_once() {
        let source = Arc::new(CountingSource::new(&["beer01", "WINE02"]));
        let cache = SkuCache::new(source.clone());

        cache.ensure_loaded().await.unwrap();
        cache.ensure_loaded().await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains("BEER01").await);
        assert!(cache.contains("beer01").await);
        assert!(cache.contains("wine02").await);
        assert!(!cache.contains("TOY03").await);
    }

    #[tokio::test]
    async fn test_concurrent_first_load_is_single_flight() {
        let source = Arc::new(CountingSource::new(&["BEER01"]));
        let cache = SkuCache::new(source.clone());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.ensure_loaded().await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_after_failed_load() {
        let source = Arc::new(CountingSource::failing_first(&["BEER01"]));
        let cache = SkuCache::new(source.clone());

        assert!(cache.ensure_loaded().await.is_err());
        assert!(!cache.contains("BEER01").await);

        cache.ensure_loaded().await.unwrap();
        assert!(cache.contains("BEER01").await);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_queries_after_load() {
        let source = Arc::new(CountingSource::new(&["BEER01", "WINE02"]));
        let cache = SkuCache::new(source.clone());
        cache.ensure_loaded().await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.ensure_loaded().await.unwrap();
                cache.contains("beer01").await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_restricted_among_preserves_order() {
        let source = Arc::new(CountingSource::new(&["BEER01", "WINE02"]));
        let cache = SkuCache::new(source);
        cache.ensure_loaded().await.unwrap();

        let cart = vec![
            "TOY03".to_string(),
            "WINE02".to_string(),
            "BEER01".to_string(),
        ];
        assert_eq!(
            cache.restricted_among(&cart).await,
            vec!["WINE02".to_string(), "BEER01".to_string()]
        );
    }
}
