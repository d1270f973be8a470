use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;

pub mod sort;
pub mod streaming_service;
pub mod title;
pub mod user_preferences;

pub use sort::{SortConfig, SortDirection, SortKey};
pub use streaming_service::{ProviderRef, RegionProviders, StreamingService};
pub use title::{
    CastMember, CrewMember, Genre, MediaDetails, MediaFilter, MediaItem, MediaKind, PagedResult,
};
pub use user_preferences::{ThemeMode, UserPreferences, YearRange};

/// Cast entries kept on a detail view
const CAST_LIMIT: usize = 20;

// ============================================================================
// TMDB API Types
// ============================================================================

/// Raw listing item. Movies carry `title`/`release_date`, TV shows carry
/// `name`/`first_air_date`; `media_type` is only present on multi search.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApiMediaItem {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub original_title: Option<String>,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub popularity: Option<f64>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub media_type: Option<String>,
}

impl ApiMediaItem {
    /// Kind declared by the API itself, if any
    pub fn declared_kind(&self) -> Option<MediaKind> {
        self.media_type.as_deref().and_then(MediaKind::from_tag)
    }

    /// Normalizes into a [`MediaItem`] tagged with `kind`
    pub fn into_media_item(self, kind: MediaKind) -> MediaItem {
        let (title, original_title, date) = match kind {
            MediaKind::Movie => (
                self.title.or(self.name),
                self.original_title.or(self.original_name),
                self.release_date,
            ),
            MediaKind::Tv => (
                self.name.or(self.title),
                self.original_name.or(self.original_title),
                self.first_air_date,
            ),
        };

        MediaItem {
            id: self.id,
            media_type: kind,
            title: title.unwrap_or_default(),
            original_title,
            overview: self.overview.unwrap_or_default(),
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            genre_ids: self.genre_ids,
            vote_average: self.vote_average.unwrap_or(0.0),
            vote_count: self.vote_count.unwrap_or(0),
            popularity: self.popularity.unwrap_or(0.0),
            release_date: date.as_deref().and_then(parse_api_date),
        }
    }
}

/// The API sends `""` for unknown dates
fn parse_api_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Paginated envelope; a body without `results` fails to decode
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPage<T> {
    #[serde(default)]
    pub page: u32,
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

impl ApiPage<ApiMediaItem> {
    /// Tags every item with `kind`, which the listing endpoints omit
    pub fn into_tagged(self, kind: MediaKind) -> PagedResult<MediaItem> {
        PagedResult {
            page: self.page,
            results: self
                .results
                .into_iter()
                .map(|item| item.into_media_item(kind))
                .collect(),
            total_pages: self.total_pages,
            total_results: self.total_results,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApiCredits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

/// Body of `/{kind}/{id}/watch/providers`, also appended to details
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApiWatchProviders {
    #[serde(default)]
    pub results: HashMap<String, RegionProviders>,
}

impl ApiWatchProviders {
    /// Availability in `region`; empty when the region is absent
    pub fn for_region(mut self, region: &str) -> RegionProviders {
        self.results.remove(region).unwrap_or_default()
    }
}

/// Body of `/movie/{id}` and `/tv/{id}` with `credits,watch/providers` appended
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMediaDetails {
    #[serde(flatten)]
    pub item: ApiMediaItem,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    pub number_of_seasons: Option<u32>,
    pub number_of_episodes: Option<u32>,
    pub status: Option<String>,
    pub tagline: Option<String>,
    pub credits: Option<ApiCredits>,
    #[serde(rename = "watch/providers")]
    pub watch_providers: Option<ApiWatchProviders>,
}

impl ApiMediaDetails {
    pub fn into_details(self, kind: MediaKind, region: &str) -> MediaDetails {
        let runtime = match kind {
            MediaKind::Movie => self.runtime,
            MediaKind::Tv => self.episode_run_time.first().copied().or(self.runtime),
        };

        let credits = self.credits.unwrap_or_default();
        let mut cast = credits.cast;
        cast.sort_by_key(|member| member.order.unwrap_or(u32::MAX));
        cast.truncate(CAST_LIMIT);

        let genre_ids = self.genres.iter().map(|g| g.id).collect::<Vec<_>>();
        let mut item = self.item.into_media_item(kind);
        if item.genre_ids.is_empty() {
            item.genre_ids = genre_ids;
        }

        MediaDetails {
            item,
            genres: self.genres,
            runtime,
            number_of_seasons: self.number_of_seasons,
            number_of_episodes: self.number_of_episodes,
            status: self.status,
            tagline: self.tagline.filter(|t| !t.is_empty()),
            cast,
            crew: credits.crew,
            watch_providers: self
                .watch_providers
                .map(|p| p.for_region(region))
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiGenreList {
    #[serde(default)]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiProviderCatalog {
    pub results: Vec<StreamingService>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_item_normalization() {
        let json = r#"{
            "id": 27205,
            "title": "Inception",
            "original_title": "Inception",
            "overview": "A thief who steals corporate secrets",
            "poster_path": "/p.jpg",
            "backdrop_path": null,
            "genre_ids": [28, 878],
            "vote_average": 8.4,
            "vote_count": 35000,
            "popularity": 90.5,
            "release_date": "2010-07-15"
        }"#;

        let item: ApiMediaItem = serde_json::from_str(json).unwrap();
        let item = item.into_media_item(MediaKind::Movie);

        assert_eq!(item.id, 27205);
        assert_eq!(item.media_type, MediaKind::Movie);
        assert_eq!(item.title, "Inception");
        assert_eq!(item.genre_ids, vec![28, 878]);
        assert_eq!(item.release_date, NaiveDate::from_ymd_opt(2010, 7, 15));
    }

    #[test]
    fn test_tv_item_uses_name_and_first_air_date() {
        let json = r#"{
            "id": 1396,
            "name": "Breaking Bad",
            "original_name": "Breaking Bad",
            "overview": "",
            "vote_average": 8.9,
            "first_air_date": "2008-01-20",
            "release_date": "1999-01-01"
        }"#;

        let item: ApiMediaItem = serde_json::from_str(json).unwrap();
        let item = item.into_media_item(MediaKind::Tv);

        assert_eq!(item.title, "Breaking Bad");
        assert_eq!(item.original_title.as_deref(), Some("Breaking Bad"));
        assert_eq!(item.release_date, NaiveDate::from_ymd_opt(2008, 1, 20));
        assert_eq!(item.vote_count, 0);
        assert_eq!(item.popularity, 0.0);
    }

    #[test]
    fn test_empty_date_is_none() {
        let item = ApiMediaItem {
            id: 1,
            release_date: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(item.into_media_item(MediaKind::Movie).release_date, None);
    }

    #[test]
    fn test_page_without_results_is_rejected() {
        let json = r#"{"page": 1, "total_pages": 3}"#;
        let result = serde_json::from_str::<ApiPage<ApiMediaItem>>(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_page_tagging() {
        let json = r#"{
            "page": 2,
            "results": [{"id": 1, "title": "A"}, {"id": 2, "title": "B"}],
            "total_pages": 7,
            "total_results": 130
        }"#;

        let page: ApiPage<ApiMediaItem> = serde_json::from_str(json).unwrap();
        let page = page.into_tagged(MediaKind::Movie);

        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 7);
        assert_eq!(page.total_results, 130);
        assert!(page.results.iter().all(|i| i.media_type == MediaKind::Movie));
    }

    #[test]
    fn test_details_with_appended_resources() {
        let json = r#"{
            "id": 1396,
            "name": "Breaking Bad",
            "first_air_date": "2008-01-20",
            "genres": [{"id": 18, "name": "Dram"}],
            "episode_run_time": [47, 45],
            "number_of_seasons": 5,
            "number_of_episodes": 62,
            "status": "Ended",
            "tagline": "",
            "credits": {
                "cast": [
                    {"id": 2, "name": "Aaron Paul", "character": "Jesse", "order": 1},
                    {"id": 1, "name": "Bryan Cranston", "character": "Walter", "order": 0}
                ],
                "crew": [{"id": 3, "name": "Vince Gilligan", "job": "Creator", "department": "Writing"}]
            },
            "watch/providers": {
                "results": {
                    "TR": {"flatrate": [{"provider_id": 8, "provider_name": "Netflix"}]},
                    "US": {"buy": [{"provider_id": 2, "provider_name": "Apple TV"}]}
                }
            }
        }"#;

        let details: ApiMediaDetails = serde_json::from_str(json).unwrap();
        let details = details.into_details(MediaKind::Tv, "TR");

        assert_eq!(details.item.title, "Breaking Bad");
        assert_eq!(details.item.genre_ids, vec![18]);
        assert_eq!(details.runtime, Some(47));
        assert_eq!(details.number_of_seasons, Some(5));
        assert_eq!(details.tagline, None);
        assert_eq!(details.cast[0].name, "Bryan Cranston");
        assert_eq!(details.crew.len(), 1);
        assert_eq!(details.watch_providers.flatrate[0].provider_id, 8);
        assert!(details.watch_providers.buy.is_empty());
    }

    #[test]
    fn test_details_without_region_has_empty_providers() {
        let json = r#"{
            "id": 27205,
            "title": "Inception",
            "runtime": 148,
            "watch/providers": {"results": {"US": {"flatrate": [{"provider_id": 8}]}}}
        }"#;

        let details: ApiMediaDetails = serde_json::from_str(json).unwrap();
        let details = details.into_details(MediaKind::Movie, "TR");

        assert_eq!(details.runtime, Some(148));
        assert!(details.watch_providers.is_empty());
    }

    #[test]
    fn test_watch_providers_for_missing_region() {
        let providers: ApiWatchProviders = serde_json::from_str(r#"{"id": 5}"#).unwrap();
        assert!(providers.for_region("TR").is_empty());
    }
}
