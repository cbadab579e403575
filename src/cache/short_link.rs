use chrono::Local;
use redis::aio::MultiplexedConnection;
use redis_macros::{FromRedisValue, ToRedisArgs};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::cache::cache::{get_cache_value, set_cache_value_ex};
use crate::constants::{SHORT_CODE_LENGTH, SHORT_LINK_PATH, SHORT_LINK_TTL_SECONDS};
use crate::error::Error;

#[derive(Serialize, Deserialize, FromRedisValue, ToRedisArgs, Clone, Debug)]
pub struct ShortLinkEntry {
    pub url: String,
    pub created_at: i64,
}

fn cache_key(code: &str) -> String {
    format!("short-link-{code}")
}

/// Deterministic code for a canonical URL: the first 8 hex characters of its
/// SHA-256 digest. A truncated-hash collision silently overwrites the prior
/// mapping for that code.
pub fn short_code(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut code = String::with_capacity(SHORT_CODE_LENGTH);
    for byte in digest.iter() {
        code.push_str(&format!("{byte:02x}"));
        if code.len() >= SHORT_CODE_LENGTH {
            break;
        }
    }
    code.truncate(SHORT_CODE_LENGTH);
    code
}

pub fn short_url(host: &str, code: &str) -> String {
    format!("{}{}/{}", host.trim_end_matches('/'), SHORT_LINK_PATH, code)
}

/// Computes the code for `url` and (re-)caches the code → URL mapping with a
/// 24-hour expiry. The hash is deterministic, so recomputation after expiry
/// yields the same code and external behavior stays stable.
pub async fn get_or_refresh(
    url: &str,
    cache: &mut MultiplexedConnection,
) -> Result<String, Error> {
    let code = short_code(url);

    let entry = ShortLinkEntry {
        url: url.to_string(),
        created_at: Local::now().timestamp(),
    };
    log::trace!("> Caching {} -> {}", cache_key(&code), url);
    set_cache_value_ex(cache_key(&code), entry, SHORT_LINK_TTL_SECONDS, cache).await?;

    Ok(code)
}

/// Response body for the get-link endpoint.
pub fn link_body(short_url: &str) -> serde_json::Value {
    serde_json::json!({ "short-link": short_url })
}

/// Looks a code back up for redirecting; `None` once the entry has expired.
pub async fn resolve(
    code: &str,
    cache: &mut MultiplexedConnection,
) -> Result<Option<String>, Error> {
    let entry: Option<ShortLinkEntry> = get_cache_value(cache_key(code), cache).await?;

    Ok(entry.map(|entry| entry.url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_deterministic() {
        let first = short_code("https://example.com/recipes/42/");
        let second = short_code("https://example.com/recipes/42/");
        assert_eq!(first, second);
    }

    #[test]
    fn codes_are_fixed_length_hex() {
        let code = short_code("https://example.com/recipes/42/");
        assert_eq!(code.len(), SHORT_CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_urls_get_different_codes() {
        assert_ne!(
            short_code("https://example.com/recipes/42/"),
            short_code("https://example.com/recipes/43/")
        );
    }

    #[test]
    fn link_body_uses_the_documented_key() {
        let body = link_body("https://example.com/s/abcd1234");
        assert_eq!(body["short-link"], "https://example.com/s/abcd1234");
    }

    #[test]
    fn short_urls_are_built_from_the_request_host() {
        let code = short_code("https://example.com/recipes/42/");
        let url = short_url("https://example.com/", &code);
        assert_eq!(url, format!("https://example.com/s/{code}"));
    }
}
