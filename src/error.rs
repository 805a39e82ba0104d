//! Error handling for the account portal

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Unified error type for the account portal
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JWT signing errors while minting admin access tokens
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Authentication errors (sign-in rejected, identity-provider failures)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The identity provider has no account with the given identifier
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Document store errors
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Service-account or token exchange problems
    #[error("Credentials error: {0}")]
    Credentials(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new database error
    pub fn database<T: fmt::Display>(msg: T) -> Self {
        Error::Database(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new credentials error
    pub fn credentials<T: fmt::Display>(msg: T) -> Self {
        Error::Credentials(msg.to_string())
    }

    /// Human-readable description without the category prefix
    pub fn message(&self) -> String {
        match self {
            Error::Auth(msg)
            | Error::Database(msg)
            | Error::Config(msg)
            | Error::Credentials(msg) => msg.clone(),
            Error::Http(err) => err.to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this error is the identity provider's "no such user" answer
    pub fn is_user_not_found(&self) -> bool {
        matches!(self, Error::UserNotFound(_))
    }
}

/// Google API error envelope: `{"error": {"code": 400, "message": "..."}}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<ApiErrorDetail>,
}

/// Inner part of [`ApiErrorBody`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Parse a response body, tolerating non-JSON payloads
    pub fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_default()
    }

    /// The nested `error.message` field, if present
    pub fn message(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.message.as_deref())
    }
}
