//! Fixed-window rate limiting keyed by route path and client address.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use common::{AppError, RateLimitConfig};

use crate::state::AppState;

/// Browsing, search and signed-in actions.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let limit = state.config.rate_limit;
    enforce(&state, limit, peer, request, next).await
}

/// Login, registration and password reset.
pub async fn rate_limit_auth_middleware(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let limit = state.config.auth_rate_limit;
    enforce(&state, limit, peer, request, next).await
}

async fn enforce(
    state: &AppState,
    limit: RateLimitConfig,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = client_address(request.headers(), peer.map(|ConnectInfo(addr)| addr));
    let bucket = format!("{}:{}", request.uri().path(), client);

    let used = match state
        .cache
        .check_rate_limit(&bucket, limit.max_requests, limit.window_seconds)
        .await
    {
        Ok((used, true)) => used,
        Ok((_, false)) => {
            tracing::debug!(%bucket, "rate limit exceeded");
            return rejected(limit);
        }
        Err(e) => {
            // Cache outage denies rather than admits.
            tracing::warn!(error = %e, %bucket, "rate limit check failed");
            return rejected(limit);
        }
    };

    let mut response = next.run(request).await;
    stamp_quota(response.headers_mut(), limit, limit.max_requests.saturating_sub(used));
    response
}

/// First hop of `X-Forwarded-For`, then `X-Real-IP`, then the socket peer.
fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    header("X-Forwarded-For")
        .and_then(|chain| chain.split(',').next())
        .map(|hop| hop.trim().to_string())
        .or_else(|| header("X-Real-IP").map(str::to_string))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn stamp_quota(headers: &mut HeaderMap, limit: RateLimitConfig, remaining: u64) {
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit.max_requests));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
}

fn rejected(limit: RateLimitConfig) -> Response {
    let mut response = AppError::TooManyRequests.into_response();
    let headers = response.headers_mut();
    headers.insert("Retry-After", HeaderValue::from(limit.window_seconds));
    stamp_quota(headers, limit, 0);
    response
}
