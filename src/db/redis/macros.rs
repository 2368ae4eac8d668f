/// Wraps a catalog fetch in a Redis read-through cache.
///
/// `$cache` is an `Option<&Cache>`. With no cache the block simply runs. With a
/// cache, a hit is returned as-is; a miss runs the block and queues the value
/// for a background write with `$ttl` seconds to live. A failing cache read is
/// logged and treated as a miss so Redis outages never fail a request.
///
/// # Example
/// ```rust,ignore
/// cached!(self.cache.as_ref(), CacheKey::Genres(language.to_string()), GENRES_TTL, async move {
///     self.fetch_genres(language).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache {
            Some(cache) => {
                let key = $key;
                match cache.get_from_cache(&key).await {
                    Ok(Some(hit)) => Ok(hit),
                    lookup => {
                        if let Err(e) = lookup {
                            tracing::warn!(error = %e, key = %key, "Cache read failed, fetching from catalog");
                        }
                        let value = $block.await?;
                        cache.set_in_background(&key, &value, $ttl);
                        Ok(value)
                    }
                }
            }
            None => $block.await,
        }
    }};
}
