//! Password sign-in and identity-provider account administration

mod types;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::credentials::TokenSource;
use crate::error::Error;
use crate::fetch::{ApiFailure, Fetch};

pub use types::*;

/// Fallback when the service gives no error message
pub const DEFAULT_AUTH_FAILURE: &str = "Authentication failed";

/// Message prefix the identity provider uses for unknown accounts
const USER_NOT_FOUND: &str = "USER_NOT_FOUND";

/// Exchanges email/password for a verified [`UserIdentity`]
pub struct IdentityVerifier {
    auth_url: String,
    web_api_key: String,
    http_client: Client,
}

impl IdentityVerifier {
    /// Create a new verifier
    pub fn new(auth_url: &str, web_api_key: &str, http_client: Client) -> Self {
        Self {
            auth_url: auth_url.to_string(),
            web_api_key: web_api_key.to_string(),
            http_client,
        }
    }

    /// Verify a password with a single call to `accounts:signInWithPassword`
    ///
    /// Rejections come back as [`Error::Auth`] carrying the service's
    /// `error.message` (or "Authentication failed"). Transport problems are
    /// returned as [`Error::Http`]. Nothing is retried.
    pub async fn verify(&self, email: &str, password: &str) -> Result<UserIdentity, Error> {
        if email.is_empty() || password.is_empty() {
            return Err(Error::auth("Please enter both email and password"));
        }

        let url = format!("{}/v1/accounts:signInWithPassword", self.auth_url);
        let body = SignInRequest {
            email,
            password,
            return_secure_token: true,
        };

        let response = Fetch::post(&self.http_client, &url)
            .query_param("key", &self.web_api_key)
            .json(&body)?
            .execute_raw()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            let failure = ApiFailure::from_response(response).await;
            let message = failure.body.message().unwrap_or(DEFAULT_AUTH_FAILURE);
            debug!(status = %failure.status, "sign-in rejected");
            return Err(Error::auth(message));
        }

        let signed_in: SignInResponse = response.json().await?;
        info!(uid = %signed_in.local_id, "user authenticated");
        Ok(signed_in.into())
    }
}

/// Identity-provider operations the deletion workflow depends on
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Delete the login account with the given identifier.
    ///
    /// Returns [`Error::UserNotFound`] when no such account exists.
    async fn delete_user(&self, user_id: &str) -> Result<(), Error>;
}

/// Admin client for the identity provider
pub struct AdminAuth {
    auth_url: String,
    project_id: String,
    http_client: Client,
    tokens: Arc<TokenSource>,
}

impl AdminAuth {
    /// Create a new admin client
    pub fn new(auth_url: &str, project_id: &str, http_client: Client, tokens: Arc<TokenSource>) -> Self {
        Self {
            auth_url: auth_url.to_string(),
            project_id: project_id.to_string(),
            http_client,
            tokens,
        }
    }
}

#[async_trait]
impl IdentityProvider for AdminAuth {
    async fn delete_user(&self, user_id: &str) -> Result<(), Error> {
        let url = format!(
            "{}/v1/projects/{}/accounts:delete",
            self.auth_url, self.project_id
        );
        let token = self.tokens.access_token().await?;

        let response = Fetch::post(&self.http_client, &url)
            .bearer_auth(&token)?
            .json(&DeleteAccountRequest { local_id: user_id })?
            .execute_raw()
            .await?;

        if !response.status().is_success() {
            let failure = ApiFailure::from_response(response).await;
            if failure.message().starts_with(USER_NOT_FOUND) {
                return Err(Error::UserNotFound(user_id.to_string()));
            }
            return Err(Error::auth(format!(
                "Failed to delete user: {}",
                failure.message()
            )));
        }

        info!(uid = %user_id, "identity provider account deleted");
        Ok(())
    }
}
