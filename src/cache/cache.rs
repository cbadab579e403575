use redis::{aio::MultiplexedConnection, AsyncCommands, FromRedisValue, ToRedisArgs};

use crate::error::{CacheError, Error};

// Cache - raw handlers

pub async fn set_cache_value<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    cache: &mut MultiplexedConnection,
) -> Result<(), Error> {
    let _: () = cache
        .set(key, value)
        .await
        .map_err(|e| Error::from(CacheError::from(e)))?;

    Ok(())
}

/// Stores a value together with a relative expiry in seconds. The storage
/// layer's own key-set operation is atomic; last writer for a key wins.
pub async fn set_cache_value_ex<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    seconds: u64,
    cache: &mut MultiplexedConnection,
) -> Result<(), Error> {
    let _: () = cache
        .set_ex(key, value, seconds)
        .await
        .map_err(|e| Error::from(CacheError::from(e)))?;

    Ok(())
}

pub async fn delete_cache_value<K: ToRedisArgs + Send + Sync>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<(), Error> {
    let _: () = cache
        .del(key)
        .await
        .map_err(|e| Error::from(CacheError::from(e)))?;

    Ok(())
}

pub async fn get_cache_value<K: ToRedisArgs + Send + Sync, V: FromRedisValue>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<Option<V>, Error> {
    let value: Option<V> = cache
        .get(key)
        .await
        .map_err(|e| Error::from(CacheError::from(e)))?;

    Ok(value)
}
