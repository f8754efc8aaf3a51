/// Serves a value from the cache, computing and caching it on a miss.
///
/// A failed cache read is logged and the value is computed as if it missed, so
/// a Redis outage only costs latency. Writes go through `set_in_background`.
///
/// # Arguments
/// * `$cache`: a value with `get_from_cache` and `set_in_background` methods.
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: time-to-live in seconds for a freshly computed value.
/// * `$block`: future computing the value on a miss.
///
/// # Example
/// ```rust,ignore
/// let ids = cached!(cache, key, 300, async move { inner.search(catalog, query).await });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache.get_from_cache(&$key).await {
            Ok(Some(cached)) => Ok(cached),
            Ok(None) => {
                let value = $block.await?;
                $cache.set_in_background(&$key, &value, $ttl);
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, key = %$key, "Cache read failed, bypassing cache");
                $block.await
            }
        }
    }};
}
