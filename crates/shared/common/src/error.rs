//! Unified error handling for the HTTP surface.
//!
//! Service code returns `AppError`; the gateway turns it into a JSON
//! response of the form `{"error": {"code", "message"}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Resource not found")]
    NotFound,

    #[error("{0} already exists")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Password reset token is invalid or has expired")]
    TokenInvalidOrExpired,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[cfg(feature = "database")]
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    #[cfg(feature = "jwt")]
    #[error("Authentication error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[cfg(feature = "cache")]
    #[error("Cache error")]
    Cache(#[from] redis::RedisError),

    #[error("Internal server error")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct Envelope {
    error: Payload,
}

#[derive(Debug, Serialize)]
struct Payload {
    code: &'static str,
    message: String,
}

impl AppError {
    pub fn conflict(entity: impl Into<String>) -> Self {
        Self::Conflict(entity.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status and stable machine-readable code.
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::TokenInvalidOrExpired => (StatusCode::BAD_REQUEST, "TOKEN_INVALID_OR_EXPIRED"),
            Self::PasswordMismatch => (StatusCode::BAD_REQUEST, "PASSWORD_MISMATCH"),
            Self::UnsupportedMediaType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE")
            }
            Self::TooManyRequests => (StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_REQUESTS"),
            #[cfg(feature = "database")]
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            #[cfg(feature = "jwt")]
            Self::Jwt(_) => (StatusCode::UNAUTHORIZED, "AUTH_ERROR"),
            #[cfg(feature = "cache")]
            Self::Cache(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CACHE_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.classify().0
    }

    pub fn code(&self) -> &'static str {
        self.classify().1
    }

    /// Message safe to show a client. Infrastructure failures are logged
    /// here and replaced with a generic line.
    pub fn user_message(&self) -> String {
        match self {
            #[cfg(feature = "database")]
            Self::Database(source) => {
                tracing::error!(error = ?source, "database failure");
                "A database error occurred".into()
            }
            #[cfg(feature = "jwt")]
            Self::Jwt(source) => {
                tracing::debug!(error = ?source, "token rejected");
                "Invalid or expired token".into()
            }
            #[cfg(feature = "cache")]
            Self::Cache(source) => {
                tracing::error!(error = ?source, "cache failure");
                "A cache error occurred".into()
            }
            Self::Internal(detail) => {
                tracing::error!(%detail, "internal failure");
                "An internal error occurred".into()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        let envelope = Envelope {
            error: Payload {
                code,
                message: self.user_message(),
            },
        };
        (status, Json(envelope)).into_response()
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::Password(msg) => Self::Validation(msg),
            DomainError::NotFound(_) => Self::NotFound,
            DomainError::Conflict(what) => Self::Conflict(what),
            DomainError::Forbidden(msg) => Self::Forbidden(msg),
            DomainError::InvalidCredentials => Self::InvalidCredentials,
            DomainError::TokenInvalidOrExpired => Self::TokenInvalidOrExpired,
            DomainError::PasswordMismatch => Self::PasswordMismatch,
            DomainError::UnsupportedMediaType(msg) => Self::UnsupportedMediaType(msg),
            DomainError::Internal(msg) => Self::Internal(msg),
        }
    }
}

/// `None` becomes [`AppError::NotFound`].
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}
