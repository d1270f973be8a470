use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use icu_collator::{Collator, CollatorOptions};
use icu_locid::Locale;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    models::{Genre, MediaKind, RegionProviders, StreamingService},
    services::providers::MetadataGateway,
};

const REFERENCE_CACHE_TTL: u64 = 86400; // 24 hours

/// Small reference tables: genres, the provider catalog and per-title providers
///
/// Lookups never fail the caller. A failed fetch is logged, answered with an
/// empty result and left out of the cache so the next call tries again.
pub struct ReferenceLookup {
    gateway: Arc<dyn MetadataGateway>,
    cache: Cache,
    region: String,
    /// Language tag names are collated in, e.g. `tr-TR`
    language: String,
}

impl ReferenceLookup {
    pub fn new(
        gateway: Arc<dyn MetadataGateway>,
        cache: Cache,
        region: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            cache,
            region: region.into(),
            language: language.into(),
        }
    }

    /// Movie and TV genres merged by id and sorted by name
    pub async fn genres(&self) -> Vec<Genre> {
        self.fetch_genres().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Genre lookup failed");
            Vec::new()
        })
    }

    /// Providers offered for movies or TV in the region, best ranked first
    pub async fn streaming_services(&self) -> Vec<StreamingService> {
        self.fetch_services().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Provider catalog lookup failed");
            Vec::new()
        })
    }

    /// Where one title can be watched in the region
    pub async fn title_providers(&self, kind: MediaKind, id: u64) -> RegionProviders {
        self.fetch_title_providers(kind, id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, kind = %kind, id, "Title provider lookup failed");
                RegionProviders::default()
            })
    }

    async fn fetch_genres(&self) -> AppResult<Vec<Genre>> {
        let key = CacheKey::Genres;
        cached!(self.cache, key, REFERENCE_CACHE_TTL, async {
            tokio::try_join!(
                self.gateway.genres(MediaKind::Movie),
                self.gateway.genres(MediaKind::Tv),
            )
            .map(|(movie, tv)| merge_genres(movie, tv, &self.language))
        })
    }

    async fn fetch_services(&self) -> AppResult<Vec<StreamingService>> {
        let key = CacheKey::ProviderCatalog;
        cached!(self.cache, key, REFERENCE_CACHE_TTL, async {
            tokio::try_join!(
                self.gateway.watch_providers(MediaKind::Movie),
                self.gateway.watch_providers(MediaKind::Tv),
            )
            .map(|(movie, tv)| merge_services(movie, tv, &self.region, &self.language))
        })
    }

    async fn fetch_title_providers(&self, kind: MediaKind, id: u64) -> AppResult<RegionProviders> {
        let key = CacheKey::TitleProviders(kind, id);
        cached!(
            self.cache,
            key,
            REFERENCE_CACHE_TTL,
            self.gateway.title_providers(kind, id)
        )
    }
}

/// Collator for display names in `language`; `None` when the tag or its data is unusable
fn name_collator(language: &str) -> Option<Collator> {
    let locale: Locale = match language.parse() {
        Ok(locale) => locale,
        Err(e) => {
            tracing::warn!(language = %language, error = %e, "Invalid language tag for collation");
            return None;
        }
    };

    Collator::try_new(&(&locale).into(), CollatorOptions::new())
        .map_err(|e| {
            tracing::warn!(language = %language, error = %e, "No collation data for language");
        })
        .ok()
}

fn compare_names(collator: Option<&Collator>, a: &str, b: &str) -> Ordering {
    match collator {
        Some(collator) => collator.compare(a, b),
        None => a.cmp(b),
    }
}

/// Movie genres first, then TV genres not already present, sorted by name in `language`
pub fn merge_genres(movie: Vec<Genre>, tv: Vec<Genre>, language: &str) -> Vec<Genre> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Genre> = movie
        .into_iter()
        .chain(tv)
        .filter(|genre| seen.insert(genre.id))
        .collect();

    let collator = name_collator(language);
    merged.sort_by(|a, b| compare_names(collator.as_ref(), &a.name, &b.name));
    merged
}

/// Union by provider id, TV entries replacing movie ones, ordered by regional priority then name
pub fn merge_services(
    movie: Vec<StreamingService>,
    tv: Vec<StreamingService>,
    region: &str,
    language: &str,
) -> Vec<StreamingService> {
    let mut merged: Vec<StreamingService> = Vec::with_capacity(movie.len() + tv.len());
    for service in movie.into_iter().chain(tv) {
        match merged
            .iter_mut()
            .find(|s| s.provider_id == service.provider_id)
        {
            Some(existing) => *existing = service,
            None => merged.push(service),
        }
    }

    let collator = name_collator(language);
    merged.sort_by(|a, b| {
        a.priority_in(region)
            .cmp(&b.priority_in(region))
            .then_with(|| compare_names(collator.as_ref(), &a.provider_name, &b.provider_name))
    });
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::ProviderRef;
    use crate::services::providers::MockMetadataGateway;
    use std::collections::HashMap;

    fn genre(id: u32, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    fn service(id: u32, name: &str, tr_priority: Option<i32>) -> StreamingService {
        let mut display_priorities = HashMap::new();
        if let Some(priority) = tr_priority {
            display_priorities.insert("TR".to_string(), priority);
        }
        StreamingService {
            provider_id: id,
            provider_name: name.to_string(),
            logo_path: None,
            display_priority: None,
            display_priorities,
        }
    }

    fn lookup(mock: MockMetadataGateway) -> ReferenceLookup {
        ReferenceLookup::new(Arc::new(mock), Cache::default(), "TR", "tr-TR")
    }

    #[test]
    fn test_merge_genres_dedups_and_sorts() {
        let movie = vec![genre(28, "Action"), genre(18, "Drama")];
        let tv = vec![genre(18, "Drama"), genre(10765, "Sci-Fi & Fantasy"), genre(16, "Animation")];

        let merged = merge_genres(movie, tv, "en-US");
        let names: Vec<&str> = merged.iter().map(|g| g.name.as_str()).collect();

        assert_eq!(names, vec!["Action", "Animation", "Drama", "Sci-Fi & Fantasy"]);
    }

    #[test]
    fn test_merge_genres_collates_turkish_names() {
        let movie = vec![
            genre(28, "Aksiyon"),
            genre(18, "Dram"),
            genre(35, "Komedi"),
            genre(80, "Suç"),
        ];
        let tv = vec![genre(10762, "Çocuklar"), genre(10768, "Savaş & Politik")];

        let merged = merge_genres(movie, tv, "tr-TR");
        let names: Vec<&str> = merged.iter().map(|g| g.name.as_str()).collect();

        assert_eq!(
            names,
            vec!["Aksiyon", "Çocuklar", "Dram", "Komedi", "Savaş & Politik", "Suç"]
        );
    }

    #[test]
    fn test_invalid_language_falls_back_to_code_point_order() {
        let merged = merge_genres(vec![genre(2, "b"), genre(1, "a")], vec![], "not a tag!");
        let names: Vec<&str> = merged.iter().map(|g| g.name.as_str()).collect();

        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_merge_services_orders_by_region_priority() {
        let movie = vec![service(8, "Netflix", Some(2)), service(337, "Disney Plus", None)];
        let tv = vec![service(119, "Amazon Prime Video", Some(1)), service(8, "Netflix", Some(3))];

        let merged = merge_services(movie, tv, "TR", "tr-TR");
        let ids: Vec<u32> = merged.iter().map(|s| s.provider_id).collect();

        assert_eq!(ids, vec![119, 8, 337]);
        assert_eq!(merged[1].priority_in("TR"), 3);
    }

    #[test]
    fn test_merge_services_breaks_ties_by_collated_name() {
        let movie = vec![service(1, "TV+", Some(5)), service(2, "Exxen", Some(5))];
        let tv = vec![service(3, "Şahane TV", Some(5)), service(4, "Çizgi Film", Some(5))];

        let merged = merge_services(movie, tv, "TR", "tr-TR");
        let names: Vec<&str> = merged.iter().map(|s| s.provider_name.as_str()).collect();

        assert_eq!(names, vec!["Çizgi Film", "Exxen", "Şahane TV", "TV+"]);
    }

    #[tokio::test]
    async fn test_genres_are_cached() {
        let mut mock = MockMetadataGateway::new();
        mock.expect_genres()
            .times(2)
            .returning(|kind| match kind {
                MediaKind::Movie => Ok(vec![genre(28, "Action")]),
                MediaKind::Tv => Ok(vec![genre(16, "Animation")]),
            });

        let lookup = lookup(mock);
        let first = lookup.genres().await;
        let second = lookup.genres().await;

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failed_genre_lookup_is_empty() {
        let mut mock = MockMetadataGateway::new();
        mock.expect_genres()
            .returning(|kind| match kind {
                MediaKind::Movie => Err(AppError::ExternalApi("down".to_string())),
                MediaKind::Tv => Ok(vec![genre(16, "Animation")]),
            });

        let lookup = lookup(mock);
        assert!(lookup.genres().await.is_empty());
        assert!(lookup.genres().await.is_empty());
    }

    #[tokio::test]
    async fn test_streaming_services_merge_catalogs() {
        let mut mock = MockMetadataGateway::new();
        mock.expect_watch_providers()
            .times(2)
            .returning(|kind| match kind {
                MediaKind::Movie => Ok(vec![service(8, "Netflix", Some(2))]),
                MediaKind::Tv => Ok(vec![service(8, "Netflix", Some(2)), service(1899, "Max", Some(1))]),
            });

        let services = lookup(mock).streaming_services().await;
        let names: Vec<&str> = services.iter().map(|s| s.provider_name.as_str()).collect();

        assert_eq!(names, vec!["Max", "Netflix"]);
    }

    #[tokio::test]
    async fn test_title_providers_cached_per_title() {
        let mut mock = MockMetadataGateway::new();
        mock.expect_title_providers()
            .withf(|kind, id| *kind == MediaKind::Movie && *id == 550)
            .times(1)
            .returning(|_, _| {
                Ok(RegionProviders {
                    link: None,
                    flatrate: vec![ProviderRef {
                        provider_id: 8,
                        provider_name: "Netflix".to_string(),
                        logo_path: None,
                        display_priority: Some(1),
                    }],
                    rent: vec![],
                    buy: vec![],
                })
            });

        let lookup = lookup(mock);
        let first = lookup.title_providers(MediaKind::Movie, 550).await;
        let second = lookup.title_providers(MediaKind::Movie, 550).await;

        assert_eq!(first.flatrate.len(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_title_provider_failure_is_empty() {
        let mut mock = MockMetadataGateway::new();
        mock.expect_title_providers()
            .returning(|_, _| Err(AppError::ExternalApi("down".to_string())));

        let providers = lookup(mock).title_providers(MediaKind::Tv, 1399).await;
        assert!(providers.is_empty());
    }
}
