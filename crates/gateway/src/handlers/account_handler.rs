//! Password reset handlers.

use axum::{
    extract::{Path, State},
    http::{header::HOST, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use common::AppResult;
use directory_service_lib::service::{AuthSession, ResetRequestOutcome};
use domain::UserSummary;

use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// Forgotten password request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotRequest {
    #[validate(email(message = "That Email is not valid!"))]
    #[schema(example = "wes@example.com")]
    pub email: String,
}

/// New password for a reset token
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Confirm Password cannot be blank!"))]
    pub password_confirm: String,
}

/// What happened to a reset request
#[derive(Debug, Serialize, ToSchema)]
pub struct ForgotResponse {
    /// `emailed`, `unknown_email` or `email_failed`
    pub outcome: String,
    pub message: String,
}

impl ForgotResponse {
    fn from_outcome(outcome: ResetRequestOutcome) -> (StatusCode, Self) {
        let (status, outcome, message) = match outcome {
            ResetRequestOutcome::Emailed => (
                StatusCode::OK,
                "emailed",
                "You have been emailed a password reset link.",
            ),
            ResetRequestOutcome::UnknownEmail => (
                StatusCode::NOT_FOUND,
                "unknown_email",
                "No account with that email exists.",
            ),
            ResetRequestOutcome::EmailFailed => (
                StatusCode::BAD_GATEWAY,
                "email_failed",
                "The reset email could not be sent. Please try again.",
            ),
        };

        (
            status,
            Self {
                outcome: outcome.to_string(),
                message: message.to_string(),
            },
        )
    }
}

/// Reset flow routes; rate limited by the router
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account/forgot", post(forgot))
        .route("/account/reset/:token", get(reset_form).post(reset))
}

/// Email a password reset link
#[utoipa::path(
    post,
    path = "/account/forgot",
    tag = "Account",
    request_body = ForgotRequest,
    responses(
        (status = 200, description = "Reset link sent", body = ForgotResponse),
        (status = 404, description = "No account with that email", body = ForgotResponse),
        (status = 502, description = "Token stored but the mail failed", body = ForgotResponse),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn forgot(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<ForgotRequest>,
) -> AppResult<(StatusCode, Json<ForgotResponse>)> {
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| state.config.public_host());

    let outcome = state
        .services
        .accounts()
        .request_password_reset(&payload.email, &host)
        .await?;

    let (status, body) = ForgotResponse::from_outcome(outcome);
    Ok((status, Json(body)))
}

/// Check a reset token before showing the reset form
#[utoipa::path(
    get,
    path = "/account/reset/{token}",
    tag = "Account",
    params(("token" = String, Path, description = "Reset token from the mailed link")),
    responses(
        (status = 200, description = "Token is valid", body = UserSummary),
        (status = 400, description = "Token is invalid or has expired")
    )
)]
pub async fn reset_form(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<UserSummary>> {
    let user = state.services.accounts().validate_reset_token(&token).await?;
    Ok(Json(UserSummary::from(&user)))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/account/reset/{token}",
    tag = "Account",
    params(("token" = String, Path, description = "Reset token from the mailed link")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed and logged in", body = AuthSession),
        (status = 400, description = "Passwords do not match, or token invalid or expired")
    )
)]
pub async fn reset(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<Json<AuthSession>> {
    let session = state
        .services
        .accounts()
        .complete_reset(&token, &payload.password, &payload.password_confirm)
        .await?;
    Ok(Json(session))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_statuses() {
        let (status, body) = ForgotResponse::from_outcome(ResetRequestOutcome::Emailed);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.outcome, "emailed");

        let (status, _) = ForgotResponse::from_outcome(ResetRequestOutcome::UnknownEmail);
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = ForgotResponse::from_outcome(ResetRequestOutcome::EmailFailed);
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.outcome, "email_failed");
    }
}
