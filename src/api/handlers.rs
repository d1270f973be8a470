use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    models::{
        Genre, MediaDetails, MediaFilter, MediaItem, MediaKind, PagedResult, RegionProviders,
        SortConfig, SortDirection, SortKey, StreamingService, ThemeMode, UserPreferences,
    },
    services::{parse_service_ids, search_titles, RecommendationRequest},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationParams {
    pub page: Option<u32>,
    pub media_type: Option<MediaFilter>,
    pub genre_id: Option<u32>,
    pub sort_by: Option<SortKey>,
    pub direction: Option<SortDirection>,
}

impl RecommendationParams {
    fn into_request(self) -> RecommendationRequest {
        let sort = match (self.sort_by, self.direction) {
            (None, None) => None,
            (key, direction) => Some(SortConfig::new(
                key.unwrap_or_default(),
                direction.unwrap_or_default(),
            )),
        };

        RecommendationRequest {
            page: self.page.unwrap_or(1).max(1),
            media_type: self.media_type.unwrap_or_default(),
            genre_id: self.genre_id,
            sort,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRangeRequest {
    pub start_year: i32,
    pub end_year: i32,
}

#[derive(Debug, Deserialize)]
pub struct ThemeModeRequest {
    pub mode: ThemeMode,
}

#[derive(Debug, Deserialize)]
pub struct ThemeParams {
    /// Device appearance, `dark` or `light`
    pub system: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ThemeResponse {
    pub mode: ThemeMode,
    pub dark: bool,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// One page of movie/TV recommendations for the stored preferences
pub async fn recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendationParams>,
) -> AppResult<Json<PagedResult<MediaItem>>> {
    let prefs = state.preferences.load().await;
    let page = state
        .recommender
        .recommend(&params.into_request(), &prefs)
        .await?;
    Ok(Json(page))
}

/// Drops cached catalog pages and answers with a freshly fetched page
pub async fn refresh_recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendationParams>,
) -> AppResult<Json<PagedResult<MediaItem>>> {
    let prefs = state.preferences.load().await;
    let page = state
        .recommender
        .refresh_and_recommend(&params.into_request(), &prefs)
        .await?;
    Ok(Json(page))
}

/// Handler for title search endpoint
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<PagedResult<MediaItem>>> {
    let prefs = state.preferences.load().await;
    let found = search_titles(
        state.gateway.as_ref(),
        &params.q,
        params.page.unwrap_or(1),
        &prefs.year_range,
    )
    .await?;
    Ok(Json(found))
}

pub async fn title_details(
    State(state): State<AppState>,
    Path((kind, id)): Path<(MediaKind, u64)>,
) -> AppResult<Json<MediaDetails>> {
    let details = state.gateway.details(kind, id).await?;
    Ok(Json(details))
}

pub async fn title_providers(
    State(state): State<AppState>,
    Path((kind, id)): Path<(MediaKind, u64)>,
) -> Json<RegionProviders> {
    Json(state.lookup.title_providers(kind, id).await)
}

pub async fn genres(State(state): State<AppState>) -> Json<Vec<Genre>> {
    Json(state.lookup.genres().await)
}

/// Provider catalog for the services picker
pub async fn streaming_services(State(state): State<AppState>) -> Json<Vec<StreamingService>> {
    Json(state.lookup.streaming_services().await)
}

pub async fn get_preferences(State(state): State<AppState>) -> Json<UserPreferences> {
    Json(state.preferences.load().await)
}

/// Replaces the selected services; the body is a raw JSON array of ids
pub async fn update_services(
    State(state): State<AppState>,
    Json(ids): Json<Vec<Value>>,
) -> AppResult<Json<UserPreferences>> {
    let prefs = state
        .preferences
        .update_selected_services(parse_service_ids(&ids))
        .await?;
    state.recommender.refresh().await?;
    Ok(Json(prefs))
}

pub async fn update_years(
    State(state): State<AppState>,
    Json(request): Json<YearRangeRequest>,
) -> AppResult<Json<UserPreferences>> {
    let prefs = state
        .preferences
        .update_year_range(request.start_year, request.end_year)
        .await?;
    state.recommender.refresh().await?;
    Ok(Json(prefs))
}

pub async fn update_theme(
    State(state): State<AppState>,
    Json(request): Json<ThemeModeRequest>,
) -> AppResult<Json<UserPreferences>> {
    let prefs = state.preferences.update_theme_mode(request.mode).await?;
    Ok(Json(prefs))
}

/// Stored theme mode resolved against the device appearance
pub async fn get_theme(
    State(state): State<AppState>,
    Query(params): Query<ThemeParams>,
) -> Json<ThemeResponse> {
    let system_dark = params.system.as_deref() == Some("dark");
    let mode = state.preferences.load_theme_mode().await;

    Json(ThemeResponse {
        mode,
        dark: mode.is_dark(system_dark),
    })
}
