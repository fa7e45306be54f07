//! Review domain entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{MAX_RATING, MIN_RATING};
use crate::error::{DomainError, DomainResult};
use crate::user::UserSummary;

/// A user's rated review of a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Review {
    pub id: Uuid,
    pub author: Uuid,
    pub store: Uuid,
    pub rating: i32,
    pub text: String,
    pub created: DateTime<Utc>,
}

/// Review submission.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewReview {
    /// Whole stars, 1 to 5
    pub rating: i32,
    pub text: String,
}

impl NewReview {
    /// Check the rating range and trim the text.
    pub fn validate(self) -> DomainResult<Self> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(DomainError::validation(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }

        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(DomainError::validation("Your review must have text!"));
        }

        Ok(Self { rating: self.rating, text })
    }
}

/// Review with its author's public profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReviewDetail {
    #[serde(flatten)]
    pub review: Review,
    pub author_profile: Option<UserSummary>,
}
