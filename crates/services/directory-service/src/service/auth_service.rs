//! Authentication service - registration, login and session tokens.
//!
//! Password hashes live in the credentials table, never on the user.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::repository::{CredentialRepository, UserRepository};
use common::{AppError, AppResult, JwtConfig};
use domain::user::normalize_email;
use domain::{DomainError, NewUser, Password, User, UserResponse, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Verified against when the email is unknown so both paths cost one argon2 run.
static DUMMY_PASSWORD: Lazy<Password> = Lazy::new(|| {
    Password::new("timing-equalizer-password")
        .unwrap_or_else(|_| Password::from_hash(String::new()))
});

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    /// Token id, revoked on logout
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TokenResponse {
    /// JWT access token
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Token expiration time in seconds
    pub expires_in: i64,
}

/// A fresh session: the token plus who it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthSession {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub user: UserResponse,
}

/// Registration form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Authentication service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create a user and its credential, then log them in
    async fn register(&self, registration: Registration) -> AppResult<AuthSession>;

    /// Check credentials and start a session
    async fn login(&self, email: &str, password: &str) -> AppResult<AuthSession>;

    /// Sign a session token for `user`
    fn issue_token(&self, user: &User) -> AppResult<TokenResponse>;

    /// Verify JWT token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;

    /// Hash and store a new password
    async fn set_password(&self, user_id: Uuid, plaintext: &str) -> AppResult<()>;
}

/// Concrete implementation of AuthService backed by the repositories.
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    credentials: Arc<dyn CredentialRepository>,
    jwt: JwtConfig,
}

impl Authenticator {
    pub fn new(
        users: Arc<dyn UserRepository>,
        credentials: Arc<dyn CredentialRepository>,
        jwt: JwtConfig,
    ) -> Self {
        Self {
            users,
            credentials,
            jwt,
        }
    }

    fn session(&self, user: User) -> AppResult<AuthSession> {
        let token = self.issue_token(&user)?;
        Ok(AuthSession {
            token,
            user: UserResponse::from(user),
        })
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn register(&self, registration: Registration) -> AppResult<AuthSession> {
        let new_user = NewUser::new(&registration.name, &registration.email)?;
        if registration.password != registration.password_confirm {
            return Err(DomainError::PasswordMismatch.into());
        }
        if self.users.find_by_email(&new_user.email).await?.is_some() {
            return Err(AppError::conflict("Email"));
        }
        let password = Password::new(&registration.password)?;

        let user = self.users.create(new_user).await?;
        self.credentials.upsert(user.id, password.into_string()).await?;
        tracing::info!(user_id = %user.id, "User registered");

        self.session(user)
    }

    async fn login(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        let user = self.users.find_by_email(&normalize_email(email)).await?;

        let stored = match &user {
            Some(user) => self.credentials.find_hash(user.id).await?.map(Password::from_hash),
            None => None,
        };
        let verified = match &stored {
            Some(hash) => hash.verify(password),
            None => {
                DUMMY_PASSWORD.verify(password);
                false
            }
        };

        match user {
            Some(user) if verified => self.session(user),
            _ => Err(AppError::InvalidCredentials),
        }
    }

    fn issue_token(&self, user: &User) -> AppResult<TokenResponse> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.jwt.expiration_hours);

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt.secret.as_bytes()),
        )?;

        Ok(TokenResponse {
            access_token: token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.jwt.expiration_hours * SECONDS_PER_HOUR,
        })
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(token_data.claims)
    }

    async fn set_password(&self, user_id: Uuid, plaintext: &str) -> AppResult<()> {
        let password = Password::new(plaintext)?;
        self.credentials.upsert(user_id, password.into_string()).await?;
        tracing::info!(%user_id, "Password updated");
        Ok(())
    }
}
