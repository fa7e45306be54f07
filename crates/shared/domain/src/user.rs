//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::constants::MIN_NAME_LENGTH;
use crate::error::{DomainError, DomainResult};

const GRAVATAR_BASE_URL: &str = "https://gravatar.com/avatar";
const GRAVATAR_SIZE: u32 = 200;

/// Canonical form of an email address: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Gravatar URL for an email address.
pub fn gravatar_url(email: &str) -> String {
    let hash = md5::compute(normalize_email(email).as_bytes());
    format!("{}/{:x}?s={}", GRAVATAR_BASE_URL, hash, GRAVATAR_SIZE)
}

/// User domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub reset_password_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_password_expires: Option<DateTime<Utc>>,
    /// Hearted store ids
    pub hearts: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn gravatar(&self) -> String {
        gravatar_url(&self.email)
    }

    pub fn has_heart(&self, store_id: Uuid) -> bool {
        self.hearts.contains(&store_id)
    }

    /// Whether the stored reset token is still usable at `now`.
    pub fn reset_token_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.reset_password_token.is_some()
            && self.reset_password_expires.is_some_and(|expires| expires > now)
    }
}

/// Validated registration data.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

impl NewUser {
    /// Trim the name, normalize the email and check both.
    pub fn new(name: &str, email: &str) -> DomainResult<Self> {
        let name = name.trim().to_string();
        if name.chars().count() < MIN_NAME_LENGTH {
            return Err(DomainError::validation("You must supply a name!"));
        }

        let email = normalize_email(email);
        if !email.validate_email() {
            return Err(DomainError::validation("That Email is not valid!"));
        }

        Ok(Self { name, email })
    }
}

/// Public author profile attached to stores and reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub gravatar: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            gravatar: user.gravatar(),
        }
    }
}

/// User response (safe to return to client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub gravatar: String,
    /// Hearted store ids
    pub hearts: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let gravatar = user.gravatar();
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            gravatar,
            hearts: user.hearts,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Wes".into(),
            email: "wes@example.com".into(),
            reset_password_token: None,
            reset_password_expires: None,
            hearts: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_gravatar_uses_lowercased_email_hash() {
        let expected = format!("{:x}", md5::compute(b"wes@example.com"));
        assert_eq!(
            gravatar_url("  Wes@Example.com "),
            format!("https://gravatar.com/avatar/{}?s=200", expected)
        );
    }

    #[test]
    fn test_new_user_normalizes_email() {
        let new_user = NewUser::new("  Wes ", " WES@Example.COM ").unwrap();
        assert_eq!(new_user.name, "Wes");
        assert_eq!(new_user.email, "wes@example.com");
    }

    #[test]
    fn test_new_user_rejects_invalid_input() {
        assert!(matches!(NewUser::new(" ", "a@b.com"), Err(DomainError::Validation(_))));
        assert_eq!(
            NewUser::new("Wes", "not-an-email"),
            Err(DomainError::validation("That Email is not valid!"))
        );
    }

    #[test]
    fn test_reset_token_validity() {
        let now = Utc::now();
        let mut user = user();
        assert!(!user.reset_token_valid_at(now));

        user.reset_password_token = Some("abc".into());
        user.reset_password_expires = Some(now + Duration::seconds(10));
        assert!(user.reset_token_valid_at(now));

        user.reset_password_expires = Some(now);
        assert!(!user.reset_token_valid_at(now));
    }

    #[test]
    fn test_response_hides_reset_fields() {
        let mut user = user();
        user.reset_password_token = Some("secret".into());
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(json.get("reset_password_token").is_none());
        assert!(json["gravatar"].as_str().unwrap().starts_with("https://gravatar.com/avatar/"));
    }
}
