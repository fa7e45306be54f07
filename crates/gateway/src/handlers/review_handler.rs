//! Review handlers.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::{NewReview, Review, ReviewDetail};

use crate::extractors::ValidatedJson;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Review submission
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReviewRequest {
    /// Whole stars, 1 to 5
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    #[schema(example = 4, minimum = 1, maximum = 5)]
    pub rating: i32,
    #[validate(length(min = 1, message = "Your review must have text!"))]
    #[schema(example = "Great espresso, slow wifi")]
    pub text: String,
}

/// Public review routes
pub fn review_routes() -> Router<AppState> {
    Router::new().route("/api/stores/:id/reviews", get(store_reviews))
}

/// Review routes that need a signed-in user
pub fn reviewer_routes() -> Router<AppState> {
    Router::new().route("/reviews/:store_id", post(add_review))
}

/// Review a store
#[utoipa::path(
    post,
    path = "/reviews/{store_id}",
    tag = "Reviews",
    security(("bearer_auth" = [])),
    params(("store_id" = Uuid, Path, description = "Store ID")),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Review saved", body = Review),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Store not found")
    )
)]
pub async fn add_review(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ReviewRequest>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let review = state
        .services
        .reviews()
        .add_review(
            store_id,
            current_user.id,
            NewReview {
                rating: payload.rating,
                text: payload.text,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Reviews of a store, newest first
#[utoipa::path(
    get,
    path = "/api/stores/{id}/reviews",
    tag = "Reviews",
    params(("id" = Uuid, Path, description = "Store ID")),
    responses(
        (status = 200, description = "Reviews with their authors", body = Vec<ReviewDetail>),
        (status = 404, description = "Store not found")
    )
)]
pub async fn store_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<ReviewDetail>>> {
    Ok(Json(state.services.reviews().reviews_for_store(id).await?))
}
