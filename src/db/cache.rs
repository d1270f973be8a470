use moka::future::Cache as MokaCache;
use moka::Expiry;
use std::fmt::Display;
use std::time::{Duration, Instant};

use crate::error::{AppError, AppResult};
use crate::models::MediaKind;

const DEFAULT_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// One catalog page for one filter set
    CatalogPage {
        kind: MediaKind,
        fingerprint: String,
    },
    Genres,
    ProviderCatalog,
    TitleProviders(MediaKind, u64),
}

impl CacheKey {
    /// Prefix shared by every cached page of `kind`'s catalog
    pub fn catalog_prefix(kind: MediaKind) -> String {
        format!("catalog:{}:", kind)
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::CatalogPage { kind, fingerprint } => {
                write!(f, "{}{}", Self::catalog_prefix(*kind), fingerprint)
            }
            CacheKey::Genres => write!(f, "genres:combined"),
            CacheKey::ProviderCatalog => write!(f, "providers:catalog"),
            CacheKey::TitleProviders(kind, id) => write!(f, "providers:{}:{}", kind, id),
        }
    }
}

/// Serialized value plus the TTL it was stored with
#[derive(Clone)]
struct CacheEntry {
    json: String,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, CacheEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory response cache shared by the aggregator and the reference lookups
///
/// Values are stored as JSON so any serde type can share one cache, each with
/// its own time-to-live.
#[derive(Clone)]
pub struct Cache {
    inner: MokaCache<String, CacheEntry>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Cache {
    pub fn new(max_capacity: u64) -> Self {
        let inner = MokaCache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .support_invalidation_closures()
            .build();

        Self { inner }
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` on a miss or once the entry's TTL has elapsed.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        match self.inner.get(&key.to_string()).await {
            Some(entry) => {
                let data = serde_json::from_str(&entry.json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Stores a value for `ttl` seconds. Serialization failures are logged and skipped.
    pub async fn insert<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Cache serialization error");
                return;
            }
        };

        let entry = CacheEntry {
            json,
            ttl: Duration::from_secs(ttl),
        };
        self.inner.insert(key.to_string(), entry).await;
    }

    /// Drops every cached page of `kind`'s catalog stored so far
    pub fn invalidate_catalog(&self, kind: MediaKind) -> AppResult<()> {
        let prefix = CacheKey::catalog_prefix(kind);
        self.inner
            .invalidate_entries_if(move |key, _| key.starts_with(&prefix))
            .map_err(|e| AppError::Internal(format!("Cache invalidation error: {}", e)))?;

        tracing::debug!(kind = %kind, "Invalidated cached catalog pages");
        Ok(())
    }
}
