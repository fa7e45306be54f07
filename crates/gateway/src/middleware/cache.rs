//! Redis-backed rate limit counters and revoked session tokens.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, RedisError};
use tracing::{debug, warn};
use uuid::Uuid;

use common::AppResult;

/// Cache key prefix for rate limiting
const CACHE_PREFIX_RATE_LIMIT: &str = "rate_limit:";

/// Cache key prefix for revoked token ids
const CACHE_PREFIX_REVOKED: &str = "revoked_jti:";

/// What the gateway keeps in its cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Count a request against `identifier`'s window.
    /// Returns (current_count, allowed).
    async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)>;

    /// Mark a token id revoked for `ttl_seconds`
    async fn revoke_token(&self, jti: Uuid, ttl_seconds: u64) -> AppResult<()>;

    async fn is_token_revoked(&self, jti: Uuid) -> AppResult<bool>;

    async fn ping(&self) -> AppResult<()>;
}

/// Redis cache wrapper.
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        debug!("Connecting to Redis at {}", url);
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let mut conn = self.conn.clone();

        let count: u64 = conn.incr(&key, 1).await?;

        // First hit opens the window
        if count == 1 {
            conn.expire::<_, ()>(&key, window_seconds as i64).await?;
        }

        Ok((count, count <= max_requests))
    }

    async fn revoke_token(&self, jti: Uuid, ttl_seconds: u64) -> AppResult<()> {
        let key = format!("{}{}", CACHE_PREFIX_REVOKED, jti);
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(&key, 1u8, ttl_seconds.max(1))
            .await
            .map_err(|e| {
                warn!("Redis set error for key {}: {}", key, e);
                e
            })?;
        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> AppResult<bool> {
        let key = format!("{}{}", CACHE_PREFIX_REVOKED, jti);
        let mut conn = self.conn.clone();
        Ok(conn.exists(&key).await?)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
