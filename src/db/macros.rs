/// Look-aside caching over [`crate::db::Cache`].
///
/// Returns the cached value when present. Otherwise awaits `$block`, stores a
/// successful result for `$ttl` seconds and returns it. Errors from `$block`
/// propagate with `?` and are never cached.
///
/// # Arguments
/// * `$cache`: the cache (anything with `get_from_cache` and `insert`).
/// * `$key`: a [`crate::db::CacheKey`]; pass a binding, it is evaluated more than once.
/// * `$ttl`: time-to-live in seconds.
/// * `$block`: future computing the value on a miss.
///
/// # Example
/// ```rust,ignore
/// let genres: Vec<Genre> = cached!(self.cache, key, GENRE_CACHE_TTL, async move {
///     self.fetch_genres().await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            tracing::debug!(key = %$key, "Cache hit");
            Ok(cached)
        } else {
            tracing::debug!(key = %$key, "Cache miss");
            let value = $block.await?;
            $cache.insert(&$key, &value, $ttl).await;
            Ok(value)
        }
    }};
}
