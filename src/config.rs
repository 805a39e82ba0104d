//! Configuration options for the account portal

use std::time::Duration;

use url::Url;

use crate::credentials::{Credentials, ServiceAccountKey};
use crate::error::Error;

/// Default Identity Toolkit endpoint
pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com";

/// Default Cloud Firestore endpoint
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";

/// Default Firestore database id
pub const DEFAULT_DATABASE_ID: &str = "(default)";

/// Bearer token the Firebase emulators accept for privileged calls
pub const EMULATOR_OWNER_TOKEN: &str = "owner";

/// Configuration for the portal handle
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Public web API key used for password sign-in
    pub web_api_key: String,

    /// Firebase / GCP project id
    pub project_id: String,

    /// Firestore database id
    pub database_id: String,

    /// Base URL of the Identity Toolkit API
    pub auth_url: String,

    /// Base URL of the Firestore API
    pub firestore_url: String,

    /// Overrides the token endpoint of the service account
    pub token_url: Option<String>,

    /// Per-request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,

    /// Credentials for the admin calls (account deletion, document store)
    pub credentials: Option<Credentials>,
}

impl PortalConfig {
    /// Create a configuration pointing at the production endpoints
    pub fn new(web_api_key: &str, project_id: &str) -> Self {
        Self {
            web_api_key: web_api_key.to_string(),
            project_id: project_id.to_string(),
            database_id: DEFAULT_DATABASE_ID.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            firestore_url: DEFAULT_FIRESTORE_URL.to_string(),
            token_url: None,
            request_timeout: None,
            credentials: None,
        }
    }

    /// Build a configuration from process environment variables
    ///
    /// Reads `FIREBASE_WEB_API_KEY`, `FIREBASE_PROJECT_ID`,
    /// `FIREBASE_SERVICE_ACCOUNT` (inline JSON), `GOOGLE_APPLICATION_CREDENTIALS`
    /// (path), `FIREBASE_ACCESS_TOKEN`, `FIREBASE_AUTH_EMULATOR_HOST` and
    /// `FIRESTORE_EMULATOR_HOST`.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`PortalConfig::from_env`] with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let service_account = match var("FIREBASE_SERVICE_ACCOUNT") {
            Some(json) => Some(ServiceAccountKey::from_json(&json)?),
            None => match var("GOOGLE_APPLICATION_CREDENTIALS") {
                Some(path) => Some(ServiceAccountKey::from_file(&path)?),
                None => None,
            },
        };

        let project_id = var("FIREBASE_PROJECT_ID")
            .or_else(|| service_account.as_ref().map(|sa| sa.project_id.clone()))
            .ok_or_else(|| Error::config("FIREBASE_PROJECT_ID environment variable not found"))?;
        let web_api_key = var("FIREBASE_WEB_API_KEY")
            .ok_or_else(|| Error::config("FIREBASE_WEB_API_KEY environment variable not found"))?;

        let mut config = Self::new(&web_api_key, &project_id);

        config.credentials = match (var("FIREBASE_ACCESS_TOKEN"), service_account) {
            (Some(token), _) => Some(Credentials::AccessToken(token)),
            (None, Some(sa)) => Some(Credentials::ServiceAccount(sa)),
            (None, None) => None,
        };

        let mut emulated = false;
        if let Some(host) = var("FIREBASE_AUTH_EMULATOR_HOST") {
            config.auth_url = format!("http://{}/identitytoolkit.googleapis.com", host);
            emulated = true;
        }
        if let Some(host) = var("FIRESTORE_EMULATOR_HOST") {
            config.firestore_url = format!("http://{}", host);
            emulated = true;
        }
        if emulated && config.credentials.is_none() {
            config.credentials = Some(Credentials::AccessToken(EMULATOR_OWNER_TOKEN.to_string()));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<(), Error> {
        if self.web_api_key.is_empty() {
            return Err(Error::config("web_api_key cannot be empty"));
        }
        if self.project_id.is_empty() {
            return Err(Error::config("project_id cannot be empty"));
        }
        Url::parse(&self.auth_url)?;
        Url::parse(&self.firestore_url)?;
        if let Some(token_url) = &self.token_url {
            Url::parse(token_url)?;
        }
        Ok(())
    }

    /// Set the Firestore database id
    pub fn with_database_id(mut self, value: &str) -> Self {
        self.database_id = value.to_string();
        self
    }

    /// Set the Identity Toolkit base URL
    pub fn with_auth_url(mut self, value: &str) -> Self {
        self.auth_url = value.trim_end_matches('/').to_string();
        self
    }

    /// Set the Firestore base URL
    pub fn with_firestore_url(mut self, value: &str) -> Self {
        self.firestore_url = value.trim_end_matches('/').to_string();
        self
    }

    /// Override the OAuth2 token endpoint
    pub fn with_token_url(mut self, value: &str) -> Self {
        self.token_url = Some(value.to_string());
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the admin credentials
    pub fn with_credentials(mut self, value: Credentials) -> Self {
        self.credentials = Some(value);
        self
    }
}
