use chrono::Datelike;

use crate::{
    error::{AppError, AppResult},
    models::{MediaItem, PagedResult, YearRange},
    services::providers::MetadataGateway,
};

/// Service function for title search
///
/// Delegates to the gateway's multi search and narrows the page to the
/// preferred release years. Undated titles are kept. Paging totals are the
/// upstream ones.
pub async fn search_titles(
    gateway: &dyn MetadataGateway,
    query: &str,
    page: u32,
    years: &YearRange,
) -> AppResult<PagedResult<MediaItem>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput("Search query must not be empty".to_string()));
    }

    let mut found = gateway.search(query, page).await?;
    found
        .results
        .retain(|item| item.release_date.map_or(true, |d| years.contains(d.year())));

    Ok(found)
}
