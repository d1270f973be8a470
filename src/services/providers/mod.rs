//! Remote metadata gateway abstraction
//!
//! The aggregator and lookups talk to the metadata API only through
//! [`MetadataGateway`], so tests can substitute a mock and the concrete
//! client stays a thin typed wrapper over HTTP.

use crate::{
    error::AppResult,
    models::{
        Genre, MediaDetails, MediaItem, MediaKind, PagedResult, RegionProviders, SortConfig,
        StreamingService, UserPreferences, YearRange,
    },
};

pub mod tmdb;

pub use tmdb::TmdbGateway;

/// Typed parameters of one catalog listing request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogQuery {
    pub page: u32,
    /// Pipe-delimited provider ids
    pub providers: Option<String>,
    pub genre_id: Option<u32>,
    pub year_range: Option<YearRange>,
    pub sort: Option<SortConfig>,
}

impl CatalogQuery {
    /// Builds the filter set for `page` from the active preferences
    pub fn from_preferences(
        page: u32,
        prefs: &UserPreferences,
        genre_id: Option<u32>,
        sort: Option<SortConfig>,
    ) -> Self {
        Self {
            page: page.max(1),
            providers: prefs.providers_filter(),
            genre_id,
            year_range: Some(prefs.year_range),
            sort,
        }
    }

    /// Any filter present selects the discover endpoint over the popular listing
    pub fn has_filters(&self) -> bool {
        self.providers.is_some()
            || self.genre_id.is_some()
            || self.year_range.is_some()
            || self.sort.is_some()
    }

    /// Query parameters in `kind`'s discover vocabulary, excluding the fixed ones
    pub fn params(&self, kind: MediaKind, region: &str) -> Vec<(String, String)> {
        let mut params = vec![("page".to_string(), self.page.max(1).to_string())];

        if let Some(providers) = &self.providers {
            let cleaned = providers
                .split('|')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .collect::<Vec<_>>()
                .join("|");
            params.push(("with_watch_providers".to_string(), cleaned));
            params.push(("watch_region".to_string(), region.to_string()));
        }

        if let Some(genre_id) = self.genre_id {
            params.push(("with_genres".to_string(), genre_id.to_string()));
        }

        if let Some(range) = self.year_range {
            let field = match kind {
                MediaKind::Movie => "primary_release_date",
                MediaKind::Tv => "first_air_date",
            };
            params.push((format!("{}.gte", field), format!("{}-01-01", range.start_year)));
            params.push((format!("{}.lte", field), format!("{}-12-31", range.end_year)));
        }

        if let Some(sort) = self.sort {
            params.push(("sort_by".to_string(), sort.to_query(kind)));
        }

        params
    }

    /// Stable identity of this filter set, used as the cache key suffix
    pub fn fingerprint(&self) -> String {
        let years = self
            .year_range
            .map(|r| format!("{}-{}", r.start_year, r.end_year))
            .unwrap_or_default();

        format!(
            "p{}:w{}:g{}:y{}:s{}",
            self.page,
            self.providers.as_deref().unwrap_or(""),
            self.genre_id.map(|g| g.to_string()).unwrap_or_default(),
            years,
            self.sort.map(|s| s.to_string()).unwrap_or_default(),
        )
    }
}

/// Trait for metadata sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataGateway: Send + Sync {
    /// One page of `kind`'s catalog; popular listing without filters, discover with them.
    /// Every item comes back tagged with `kind`.
    async fn catalog_page(
        &self,
        kind: MediaKind,
        query: &CatalogQuery,
    ) -> AppResult<PagedResult<MediaItem>>;

    /// Detail view with credits and the region's providers
    async fn details(&self, kind: MediaKind, id: u64) -> AppResult<MediaDetails>;

    /// Multi search restricted to movies and TV shows
    async fn search(&self, query: &str, page: u32) -> AppResult<PagedResult<MediaItem>>;

    async fn genres(&self, kind: MediaKind) -> AppResult<Vec<Genre>>;

    /// Provider catalog for `kind` in the configured region
    async fn watch_providers(&self, kind: MediaKind) -> AppResult<Vec<StreamingService>>;

    /// Availability of one title in the configured region; empty when the region is absent
    async fn title_providers(&self, kind: MediaKind, id: u64) -> AppResult<RegionProviders>;

    /// Gateway name for logging and debugging
    fn name(&self) -> &'static str;
}
