/// Read-through lookup against a [`ResponseCache`](crate::cache::ResponseCache).
///
/// Evaluates to `Ok(value)` straight from the cache on a hit. On a miss the
/// future is awaited; its value is stored under `$key` and returned, while an
/// error is propagated with `?` and leaves the cache untouched.
///
/// ```rust,ignore
/// cached!(self.ctx.cache, CacheKey::search(kind, &query, page), async {
///     let body = self.ctx.send(kind, &api_key, request, token).await?;
///     Ok::<_, AppError>(parse_search(&body)?)
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.get(&key) {
            tracing::debug!(key = %key, "Cache hit");
            Ok(cached)
        } else {
            tracing::debug!(key = %key, "Cache miss");
            let value = $block.await?;
            $cache.set(&key, &value);
            Ok(value)
        }
    }};
}
