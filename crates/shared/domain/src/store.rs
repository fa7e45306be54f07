//! Store domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::LOCATION_TYPE_POINT;
use crate::error::{DomainError, DomainResult};
use crate::review::ReviewDetail;
use crate::slug::slugify;
use crate::user::UserSummary;

/// Message returned when a non-owner tries to edit a store
pub const NOT_OWNER_MESSAGE: &str = "You must own a store in order to edit it!";

/// Geographic point with a postal address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Location {
    /// Geometry type, always "Point"
    #[serde(rename = "type")]
    pub kind: String,
    /// Longitude, latitude
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<f64>))]
    pub coordinates: [f64; 2],
    /// Street address
    pub address: String,
}

impl Location {
    /// Build a point location from longitude and latitude.
    pub fn point(longitude: f64, latitude: f64, address: impl Into<String>) -> Self {
        Self {
            kind: LOCATION_TYPE_POINT.to_string(),
            coordinates: [longitude, latitude],
            address: address.into(),
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

/// Store domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// Owning user
    pub author: Uuid,
}

impl Store {
    /// Check that `user_id` owns this store.
    pub fn ensure_owned_by(&self, user_id: Uuid) -> DomainResult<()> {
        if self.author == user_id {
            Ok(())
        } else {
            Err(DomainError::forbidden(NOT_OWNER_MESSAGE))
        }
    }
}

/// Store form data as submitted for create and update.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StoreInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Longitude, latitude
    pub coordinates: Option<[f64; 2]>,
    pub address: Option<String>,
    /// Stored photo filename; `None` keeps the current photo on update
    pub photo: Option<String>,
}

/// Store fields that passed validation and normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidStore {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub location: Location,
    pub photo: Option<String>,
}

impl StoreInput {
    /// Validate required fields and normalize text.
    pub fn validate(self) -> DomainResult<ValidStore> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Please enter a store name!"));
        }
        if slugify(&name).is_empty() {
            return Err(DomainError::validation(
                "Store name must contain at least one letter or digit",
            ));
        }

        let [longitude, latitude] = self
            .coordinates
            .ok_or_else(|| DomainError::validation("You must supply coordinates"))?;
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::validation("Longitude must be between -180 and 180"));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::validation("Latitude must be between -90 and 90"));
        }

        let address = self
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or_else(|| DomainError::validation("You must supply an address"))?;

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(ValidStore {
            name,
            description,
            tags: normalize_tags(self.tags),
            location: Location::point(longitude, latitude, address),
            photo: self.photo,
        })
    }
}

/// Trim tags, drop blanks and keep the first occurrence of duplicates.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|t| t == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}

/// Projection used by the map endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StoreSummary {
    pub slug: String,
    pub name: String,
    pub photo: Option<String>,
    pub description: Option<String>,
    pub location: Location,
}

impl From<Store> for StoreSummary {
    fn from(store: Store) -> Self {
        Self {
            slug: store.slug,
            name: store.name,
            photo: store.photo,
            description: store.description,
            location: store.location,
        }
    }
}

/// Text search hit with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScoredStore {
    #[serde(flatten)]
    pub store: Store,
    pub score: f64,
}

/// Tag with the number of stores carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// Store ranked by its average review rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TopStore {
    #[serde(flatten)]
    pub store: Store,
    pub review_count: u64,
    pub average_rating: f64,
}

/// Store page view: the store, its author and its reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StoreDetail {
    #[serde(flatten)]
    pub store: Store,
    pub author: Option<UserSummary>,
    pub reviews: Vec<ReviewDetail>,
}
