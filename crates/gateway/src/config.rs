//! Gateway configuration.

use common::{env_or, env_parse, RateLimitConfig};

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Redis URL for rate limiting and token revocation
    pub redis_url: String,
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Limit for general endpoints
    pub rate_limit: RateLimitConfig,
    /// Stricter limit for login, registration and password reset
    pub auth_rate_limit: RateLimitConfig,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let default = Self::default();
        let redis_url = std::env::var("GATEWAY_REDIS_URL")
            .unwrap_or_else(|_| env_or("REDIS_URL", &default.redis_url));

        Self {
            redis_url,
            host: env_or("GATEWAY_HOST", &default.host),
            port: env_parse("GATEWAY_PORT", default.port),
            rate_limit: RateLimitConfig {
                max_requests: env_parse("RATE_LIMIT_REQUESTS", default.rate_limit.max_requests),
                window_seconds: env_parse(
                    "RATE_LIMIT_WINDOW_SECONDS",
                    default.rate_limit.window_seconds,
                ),
            },
            auth_rate_limit: RateLimitConfig {
                max_requests: env_parse(
                    "RATE_LIMIT_AUTH_REQUESTS",
                    default.auth_rate_limit.max_requests,
                ),
                window_seconds: env_parse(
                    "RATE_LIMIT_AUTH_WINDOW_SECONDS",
                    default.auth_rate_limit.window_seconds,
                ),
            },
        }
    }

    /// Host and port the public site is reached on, for links in mail.
    pub fn public_host(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            host: "0.0.0.0".to_string(),
            port: 7777,
            rate_limit: RateLimitConfig::default(),
            auth_rate_limit: RateLimitConfig {
                max_requests: 10,
                window_seconds: 60,
            },
        }
    }
}
