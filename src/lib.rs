//! Quizdom account portal
//!
//! Lets a Quizdom player sign in with their email and password and
//! permanently delete their account: the Firebase Authentication login,
//! their own Firestore documents, and the documents that reference them.
//!
//! ```no_run
//! use quizdom_account_portal::{Portal, config::PortalConfig};
//!
//! # async fn run() -> Result<(), quizdom_account_portal::error::Error> {
//! let portal = Portal::new(PortalConfig::from_env()?)?;
//! let user = portal.sign_in("player@example.com", "secret").await?;
//! let result = portal.delete_account(user).await;
//! println!("{}", result.summary());
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod deletion;
pub mod error;
pub mod fetch;
pub mod firestore;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use reqwest::Client;

use crate::account::{AccountDetails, RecordLocator, UserRecord};
use crate::auth::{AdminAuth, IdentityVerifier, UserIdentity};
use crate::config::PortalConfig;
use crate::credentials::TokenSource;
use crate::deletion::{AccountDeletion, DeletionResult};
use crate::error::Error;
use crate::firestore::FirestoreClient;

/// Handle to the Firebase backends for one portal session
///
/// Created when a session starts and dropped when it ends; it owns the
/// HTTP connection pool and the cached admin access token.
pub struct Portal {
    config: PortalConfig,
    verifier: IdentityVerifier,
    admin: AdminAuth,
    firestore: FirestoreClient,
}

impl Portal {
    /// Create a new portal handle
    pub fn new(config: PortalConfig) -> Result<Self, Error> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let tokens = Arc::new(TokenSource::new(
            config.credentials.clone(),
            config.token_url.clone(),
            http_client.clone(),
        ));

        let verifier = IdentityVerifier::new(&config.auth_url, &config.web_api_key, http_client.clone());
        let admin = AdminAuth::new(
            &config.auth_url,
            &config.project_id,
            http_client.clone(),
            tokens.clone(),
        );
        let firestore = FirestoreClient::new(
            &config.firestore_url,
            &config.project_id,
            &config.database_id,
            http_client,
            tokens,
        );

        Ok(Self {
            config,
            verifier,
            admin,
            firestore,
        })
    }

    /// Configuration this portal was built from
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Password sign-in client
    pub fn verifier(&self) -> &IdentityVerifier {
        &self.verifier
    }

    /// Identity-provider admin client
    pub fn admin(&self) -> &AdminAuth {
        &self.admin
    }

    /// Document store client
    pub fn firestore(&self) -> &FirestoreClient {
        &self.firestore
    }

    /// Verify email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, Error> {
        self.verifier.verify(email, password).await
    }

    /// The user's profile record, `None` when there is none
    pub async fn user_record(&self, user: &UserIdentity) -> Result<Option<UserRecord>, Error> {
        RecordLocator::new(&self.firestore)
            .locate(&user.identifier)
            .await
    }

    /// Display form of the user's profile record
    pub async fn account_details(&self, user: &UserIdentity) -> Result<Option<AccountDetails>, Error> {
        Ok(self.user_record(user).await?.as_ref().map(AccountDetails::from))
    }

    /// Permanently delete the user's account and data
    pub async fn delete_account(&self, user: UserIdentity) -> DeletionResult {
        AccountDeletion::new(&self.admin, &self.firestore)
            .run(user)
            .await
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::UserIdentity;
    pub use crate::config::PortalConfig;
    pub use crate::deletion::DeletionResult;
    pub use crate::error::Error;
    pub use crate::Portal;
}
