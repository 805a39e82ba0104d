//! Admin credentials and OAuth2 access-token minting
//!
//! Account deletion and document-store access run with privileged
//! credentials, either a service-account key (exchanged for a short-lived
//! access token through the JWT-bearer grant) or a fixed bearer token.

use std::fmt;
use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ApiErrorBody, Error};

/// Default OAuth2 token endpoint for Google service accounts
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested for the admin token
pub const ADMIN_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/identitytoolkit",
];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Service-account key file as downloaded from the Firebase console
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Parse a key from its JSON representation
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json)
            .map_err(|e| Error::credentials(format!("invalid service account JSON: {}", e)))
    }

    /// Load a key from a JSON file on disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Credentials used for privileged calls
#[derive(Clone)]
pub enum Credentials {
    /// Mint tokens from a service-account key
    ServiceAccount(ServiceAccountKey),
    /// Use a fixed bearer token
    AccessToken(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ServiceAccount(key) => f.debug_tuple("ServiceAccount").field(key).finish(),
            Credentials::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
        }
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: i64,
}

/// Hands out bearer tokens for the admin APIs, caching minted tokens
pub struct TokenSource {
    credentials: Option<Credentials>,
    token_url: Option<String>,
    http_client: Client,
    cache: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    /// Create a token source. `token_url` overrides the key's `token_uri`.
    pub fn new(credentials: Option<Credentials>, token_url: Option<String>, http_client: Client) -> Self {
        Self {
            credentials,
            token_url,
            http_client,
            cache: Mutex::new(None),
        }
    }

    /// Get a bearer token valid for at least the next minute
    pub async fn access_token(&self) -> Result<String, Error> {
        let key = match &self.credentials {
            Some(Credentials::AccessToken(token)) => return Ok(token.clone()),
            Some(Credentials::ServiceAccount(key)) => key,
            None => return Err(Error::credentials("no admin credentials configured")),
        };

        let mut cache = self.cache.lock().await;
        let now = Utc::now().timestamp();
        if let Some(cached) = cache.as_ref() {
            if cached.expires_at - EXPIRY_MARGIN_SECS > now {
                return Ok(cached.token.clone());
            }
        }

        let minted = self.mint(key, now).await?;
        let token = minted.token.clone();
        *cache = Some(minted);
        Ok(token)
    }

    async fn mint(&self, key: &ServiceAccountKey, now: i64) -> Result<CachedToken, Error> {
        let token_url = self.token_url.as_deref().unwrap_or(&key.token_uri);

        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: ADMIN_SCOPES.join(" "),
            aud: &key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = key.private_key_id.clone();
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        let assertion = jsonwebtoken::encode(&header, &claims, &encoding_key)?;

        debug!(client_email = %key.client_email, "exchanging service account assertion");

        let response = self
            .http_client
            .post(token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let body = ApiErrorBody::parse(&text);
            let message = body.message().map(str::to_string).unwrap_or(text);
            return Err(Error::credentials(format!(
                "token exchange failed with status {}: {}",
                status, message
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS),
        })
    }
}
