//! Bearer token authentication middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::Utc;
use uuid::Uuid;

use common::AppError;

use crate::state::AppState;

/// Current authenticated user extracted from the session token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    /// Token id, for logout
    pub jti: Uuid,
    /// Token expiry (unix seconds)
    pub exp: i64,
}

impl CurrentUser {
    /// Seconds until the token expires on its own.
    pub fn remaining_seconds(&self) -> u64 {
        (self.exp - Utc::now().timestamp()).max(0) as u64
    }
}

/// Authentication middleware that validates JWT tokens.
///
/// Rejects missing, malformed, expired and revoked tokens with 401 and
/// inserts the `CurrentUser` into the request extensions otherwise.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::Unauthorized)?;

    let claims = state
        .services
        .auth()
        .verify_token(bearer.token())
        .map_err(|_| AppError::Unauthorized)?;

    if state.cache.is_token_revoked(claims.jti).await? {
        return Err(AppError::Unauthorized);
    }

    request.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        email: claims.email,
        jti: claims.jti,
        exp: claims.exp,
    });

    Ok(next.run(request).await)
}
