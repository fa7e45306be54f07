//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Stores
// =============================================================================

/// Stores shown per listing page
pub const STORES_PER_PAGE: u64 = 4;

/// Maximum results returned by the text search endpoint
pub const TEXT_SEARCH_LIMIT: u64 = 5;

/// Maximum results returned by the map (near) endpoint
pub const NEAR_SEARCH_LIMIT: u64 = 10;

/// Search radius for the map endpoint, in meters (10 km)
pub const NEAR_MAX_DISTANCE_METERS: f64 = 10_000.0;

/// Maximum entries in the top-rated listing
pub const TOP_STORES_LIMIT: u64 = 10;

/// A store needs strictly more reviews than this to be ranked
pub const TOP_STORES_MIN_REVIEWS: u64 = 1;

/// GeoJSON geometry type stored with every location
pub const LOCATION_TYPE_POINT: &str = "Point";

// =============================================================================
// Reviews
// =============================================================================

/// Lowest accepted review rating
pub const MIN_RATING: i32 = 1;

/// Highest accepted review rating
pub const MAX_RATING: i32 = 5;

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum name length requirement
pub const MIN_NAME_LENGTH: usize = 1;

// =============================================================================
// Authentication
// =============================================================================

/// Default JWT token expiration in hours
pub const DEFAULT_JWT_EXPIRATION_HOURS: i64 = 24;

/// Minimum JWT secret length (security requirement)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Seconds per hour (for token expiration calculation)
pub const SECONDS_PER_HOUR: i64 = 3600;

/// JWT token type identifier
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

// =============================================================================
// Password reset
// =============================================================================

/// Random bytes in a reset token (hex-encoded to twice this length)
pub const RESET_TOKEN_BYTES: usize = 20;

/// Reset token lifetime in seconds (1 hour)
pub const RESET_TOKEN_TTL_SECONDS: i64 = 3600;

// =============================================================================
// Uploads
// =============================================================================

/// Photos wider than this are scaled down to it
pub const PHOTO_MAX_WIDTH: u32 = 800;
