use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_header, UuidRequestId};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id_header(), UuidRequestId))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(PropagateRequestIdLayer::new(request_id_header())),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Recommendations
        .route("/recommendations", get(handlers::recommendations))
        .route(
            "/recommendations/refresh",
            post(handlers::refresh_recommendations),
        )
        // Titles
        .route("/search", get(handlers::search))
        .route("/titles/:kind/:id", get(handlers::title_details))
        .route("/titles/:kind/:id/providers", get(handlers::title_providers))
        // Reference data
        .route("/genres", get(handlers::genres))
        .route("/services", get(handlers::streaming_services))
        // User preferences
        .route("/preferences", get(handlers::get_preferences))
        .route("/preferences/services", put(handlers::update_services))
        .route("/preferences/years", put(handlers::update_years))
        .route(
            "/preferences/theme",
            get(handlers::get_theme).put(handlers::update_theme),
        )
}
