//! TMDB (The Movie Database) v3 gateway
//!
//! Every request carries the static API key plus the configured `language`
//! and `region`. Listing endpoints do not say which kind their items are, so
//! each item is tagged with the kind of the catalog it came from.
//!
//! Failures are logged and returned as-is: no retry, no backoff.

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        ApiGenreList, ApiMediaDetails, ApiMediaItem, ApiPage, ApiProviderCatalog,
        ApiWatchProviders, Genre, MediaDetails, MediaItem, MediaKind, PagedResult,
        RegionProviders, StreamingService,
    },
    services::providers::{CatalogQuery, MetadataGateway},
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;

const DETAIL_APPENDS: &str = "credits,watch/providers";

#[derive(Clone)]
pub struct TmdbGateway {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
    region: String,
}

impl TmdbGateway {
    pub fn new(api_key: String, api_url: String, language: String, region: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            language,
            region,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_language.clone(),
            config.tmdb_region.clone(),
        )
    }

    /// Issues a GET against `path` and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);
        tracing::debug!(endpoint = %path, params = ?params, "TMDB request");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
                ("region", self.region.as_str()),
            ])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(endpoint = %path, error = %e, "TMDB request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                endpoint = %path,
                status = %status,
                body = %body,
                "TMDB API returned an error status"
            );

            if status == StatusCode::NOT_FOUND {
                return Err(AppError::NotFound(format!("TMDB resource {}", path)));
            }
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(endpoint = %path, error = %e, "Failed to decode TMDB response");
            AppError::MalformedResponse(format!("{}: {}", path, e))
        })
    }

    fn region_param(&self) -> Vec<(String, String)> {
        vec![("watch_region".to_string(), self.region.clone())]
    }
}

#[async_trait::async_trait]
impl MetadataGateway for TmdbGateway {
    #[instrument(skip(self))]
    async fn catalog_page(
        &self,
        kind: MediaKind,
        query: &CatalogQuery,
    ) -> AppResult<PagedResult<MediaItem>> {
        let endpoint = if query.has_filters() {
            format!("/discover/{}", kind)
        } else {
            format!("/{}/popular", kind)
        };

        let page: ApiPage<ApiMediaItem> = self
            .get_json(&endpoint, &query.params(kind, &self.region))
            .await?;
        let page = page.into_tagged(kind);

        tracing::info!(
            endpoint = %endpoint,
            kind = %kind,
            page = page.page,
            results = page.results.len(),
            total_pages = page.total_pages,
            "Catalog page fetched"
        );

        Ok(page)
    }

    #[instrument(skip(self))]
    async fn details(&self, kind: MediaKind, id: u64) -> AppResult<MediaDetails> {
        let params = vec![(
            "append_to_response".to_string(),
            DETAIL_APPENDS.to_string(),
        )];
        let details: ApiMediaDetails = self
            .get_json(&format!("/{}/{}", kind, id), &params)
            .await?;

        tracing::info!(kind = %kind, id = id, "Details fetched");

        Ok(details.into_details(kind, &self.region))
    }

    async fn search(&self, query: &str, page: u32) -> AppResult<PagedResult<MediaItem>> {
        let params = vec![
            ("query".to_string(), query.to_string()),
            ("page".to_string(), page.max(1).to_string()),
            ("include_adult".to_string(), "false".to_string()),
        ];
        let response: ApiPage<ApiMediaItem> = self.get_json("/search/multi", &params).await?;

        // People and other non-title results are dropped
        let results: Vec<MediaItem> = response
            .results
            .into_iter()
            .filter_map(|item| item.declared_kind().map(|kind| item.into_media_item(kind)))
            .collect();

        tracing::info!(
            query = %query,
            results = results.len(),
            provider = "tmdb",
            "Title search completed"
        );

        Ok(PagedResult {
            page: response.page,
            results,
            total_pages: response.total_pages,
            total_results: response.total_results,
        })
    }

    async fn genres(&self, kind: MediaKind) -> AppResult<Vec<Genre>> {
        let list: ApiGenreList = self
            .get_json(&format!("/genre/{}/list", kind), &[])
            .await?;

        tracing::debug!(kind = %kind, genres = list.genres.len(), "Genres fetched");
        Ok(list.genres)
    }

    async fn watch_providers(&self, kind: MediaKind) -> AppResult<Vec<StreamingService>> {
        let catalog: ApiProviderCatalog = self
            .get_json(&format!("/watch/providers/{}", kind), &self.region_param())
            .await?;

        tracing::debug!(
            kind = %kind,
            region = %self.region,
            providers = catalog.results.len(),
            "Provider catalog fetched"
        );
        Ok(catalog.results)
    }

    async fn title_providers(&self, kind: MediaKind, id: u64) -> AppResult<RegionProviders> {
        let providers: ApiWatchProviders = self
            .get_json(&format!("/{}/{}/watch/providers", kind, id), &[])
            .await?;

        Ok(providers.for_region(&self.region))
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
