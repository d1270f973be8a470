use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Datelike;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::{
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        MediaFilter, MediaItem, MediaKind, PagedResult, SortConfig, SortDirection, SortKey,
        UserPreferences,
    },
    services::providers::{CatalogQuery, MetadataGateway},
};

const CATALOG_CACHE_TTL: u64 = 300; // 5 minutes

/// Days from 0001-01-01 to 1970-01-01; undated titles sort as if released at the epoch
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// What the recommendations screen asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub page: u32,
    pub media_type: MediaFilter,
    pub genre_id: Option<u32>,
    pub sort: Option<SortConfig>,
}

impl Default for RecommendationRequest {
    fn default() -> Self {
        Self {
            page: 1,
            media_type: MediaFilter::Both,
            genre_id: None,
            sort: None,
        }
    }
}

/// Recommendation aggregator
///
/// Fans out to the movie and TV catalogs, then merges both pages into one
/// ranked list. Catalog pages are cached per filter set. Every fetch runs
/// under a child of the current generation token; [`Recommender::refresh`]
/// cancels that generation so superseded fetches are aborted instead of
/// landing in the cache after newer ones.
pub struct Recommender {
    gateway: Arc<dyn MetadataGateway>,
    cache: Cache,
    generation: RwLock<CancellationToken>,
}

impl Recommender {
    pub fn new(gateway: Arc<dyn MetadataGateway>, cache: Cache) -> Self {
        Self {
            gateway,
            cache,
            generation: RwLock::new(CancellationToken::new()),
        }
    }

    /// One page of recommendations for the active preferences
    ///
    /// With a single kind the upstream page is returned untouched. With both,
    /// the pages are merged and sorted; `total_pages` is the larger of the two
    /// catalogs' page counts. If either catalog fails the whole request fails.
    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
        prefs: &UserPreferences,
    ) -> AppResult<PagedResult<MediaItem>> {
        let query =
            CatalogQuery::from_preferences(request.page, prefs, request.genre_id, request.sort);
        let token = self.generation.read().await.child_token();

        tracing::debug!(
            media_type = ?request.media_type,
            page = query.page,
            providers = ?query.providers,
            genre_id = ?query.genre_id,
            sort = ?request.sort,
            "Fetching recommendations"
        );

        let result = match request.media_type {
            MediaFilter::Movie => self.fetch_catalog(MediaKind::Movie, &query, &token).await,
            MediaFilter::Tv => self.fetch_catalog(MediaKind::Tv, &query, &token).await,
            MediaFilter::Both => tokio::try_join!(
                self.fetch_catalog(MediaKind::Movie, &query, &token),
                self.fetch_catalog(MediaKind::Tv, &query, &token),
            )
            .map(|(movies, shows)| merge_pages(query.page, movies, shows, request.sort)),
        };

        match &result {
            Ok(page) => tracing::info!(
                media_type = ?request.media_type,
                page = page.page,
                results = page.results.len(),
                total_pages = page.total_pages,
                "Recommendations ready"
            ),
            Err(AppError::Cancelled) => {
                tracing::info!(page = query.page, "Recommendation fetch superseded")
            }
            Err(e) => tracing::error!(error = %e, page = query.page, "Recommendation fetch failed"),
        }

        result
    }

    /// Aborts in-flight fetches and drops every cached catalog page
    pub async fn refresh(&self) -> AppResult<()> {
        let mut generation = self.generation.write().await;
        generation.cancel();
        *generation = CancellationToken::new();

        self.cache.invalidate_catalog(MediaKind::Movie)?;
        self.cache.invalidate_catalog(MediaKind::Tv)?;
        drop(generation);

        tracing::info!("Recommendation cache invalidated");
        Ok(())
    }

    /// [`Recommender::refresh`] followed by a fresh [`Recommender::recommend`]
    pub async fn refresh_and_recommend(
        &self,
        request: &RecommendationRequest,
        prefs: &UserPreferences,
    ) -> AppResult<PagedResult<MediaItem>> {
        self.refresh().await?;
        self.recommend(request, prefs).await
    }

    async fn fetch_catalog(
        &self,
        kind: MediaKind,
        query: &CatalogQuery,
        token: &CancellationToken,
    ) -> AppResult<PagedResult<MediaItem>> {
        let key = CacheKey::CatalogPage {
            kind,
            fingerprint: query.fingerprint(),
        };

        if let Some(cached) = self.cache.get_from_cache(&key).await? {
            tracing::debug!(key = %key, "Cache hit");
            return Ok(cached);
        }
        tracing::debug!(key = %key, "Cache miss");

        let page = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(AppError::Cancelled),
            page = self.gateway.catalog_page(kind, query) => page?,
        };

        // Held across check and insert; refresh needs the write side to cancel
        let _generation = self.generation.read().await;
        if token.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        self.cache.insert(&key, &page, CATALOG_CACHE_TTL).await;

        Ok(page)
    }
}

/// Concatenates a movie page and a TV page and sorts the union
///
/// Without a sort the union is ordered by rating, highest first.
pub fn merge_pages(
    page: u32,
    movies: PagedResult<MediaItem>,
    shows: PagedResult<MediaItem>,
    sort: Option<SortConfig>,
) -> PagedResult<MediaItem> {
    let total_pages = movies.total_pages.max(shows.total_pages);
    let total_results = movies.total_results + shows.total_results;

    let mut results = movies.results;
    results.extend(shows.results);
    sort_items(&mut results, &sort.unwrap_or_default());

    PagedResult {
        page,
        results,
        total_pages,
        total_results,
    }
}

/// Stable sort; items with equal keys keep their relative order
pub fn sort_items(items: &mut [MediaItem], sort: &SortConfig) {
    items.sort_by(|a, b| compare_items(a, b, sort));
}

/// Orders two items by the sort key in the sort direction
///
/// Missing ratings, popularity and vote counts are already zero on
/// [`MediaItem`]; a missing date compares as the Unix epoch.
pub fn compare_items(a: &MediaItem, b: &MediaItem, sort: &SortConfig) -> Ordering {
    let ordering = sort_value(a, sort.key).total_cmp(&sort_value(b, sort.key));
    match sort.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

fn sort_value(item: &MediaItem, key: SortKey) -> f64 {
    match key {
        SortKey::VoteAverage => item.vote_average,
        SortKey::Popularity => item.popularity,
        SortKey::VoteCount => item.vote_count as f64,
        SortKey::ReleaseDate => item
            .release_date
            .map(|d| d.num_days_from_ce())
            .unwrap_or(UNIX_EPOCH_DAYS_FROM_CE) as f64,
    }
}
