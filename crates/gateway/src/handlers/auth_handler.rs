//! Authentication handlers.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use common::AppResult;
use directory_service_lib::service::{AuthSession, Registration};
use domain::UserResponse;

use crate::extractors::ValidatedJson;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// User registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, message = "You must supply a name!"))]
    #[schema(example = "Wes Bos")]
    pub name: String,
    #[validate(email(message = "That Email is not valid!"))]
    #[schema(example = "wes@example.com")]
    pub email: String,
    /// Minimum 8 characters
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
    #[validate(length(min = 1, message = "Confirm Password cannot be blank!"))]
    #[schema(example = "SecurePass123!")]
    pub password_confirm: String,
}

impl From<RegisterRequest> for Registration {
    fn from(req: RegisterRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            password: req.password,
            password_confirm: req.password_confirm,
        }
    }
}

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "That Email is not valid!"))]
    #[schema(example = "wes@example.com")]
    pub email: String,
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

/// Login and registration; rate limited by the router
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Session routes that need a signed-in user
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/account", get(account))
}

/// Register and log in
#[utoipa::path(
    post,
    path = "/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered and logged in", body = AuthSession),
        (status = 400, description = "Validation error or passwords do not match"),
        (status = 409, description = "Email already registered"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthSession>)> {
    let session = state.services.auth().register(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Log in and get a session token
#[utoipa::path(
    post,
    path = "/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthSession),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<AuthSession>> {
    let session = state
        .services
        .auth()
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(session))
}

/// Revoke the current session token
#[utoipa::path(
    post,
    path = "/logout",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<StatusCode> {
    state
        .cache
        .revoke_token(current_user.jti, current_user.remaining_seconds())
        .await?;
    tracing::info!(user_id = %current_user.id, "Logged out");

    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in user
#[utoipa::path(
    get,
    path = "/account",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn account(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.accounts().get_user(current_user.id).await?;
    Ok(Json(UserResponse::from(user)))
}
