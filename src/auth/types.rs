//! Types for password sign-in and account administration

use std::fmt;

use serde::{Deserialize, Serialize};

/// Body of `accounts:signInWithPassword`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub return_secure_token: bool,
}

/// Successful `accounts:signInWithPassword` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    /// The user's uid
    pub local_id: String,

    /// Email echoed back by the service
    pub email: String,

    /// Firebase ID token
    pub id_token: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Token lifetime in seconds, sent as a string
    #[serde(default)]
    pub expires_in: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,
}

/// Body of `accounts:delete`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountRequest<'a> {
    pub local_id: &'a str,
}

/// A user verified by password sign-in
///
/// Lives for one session only and is never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// Opaque user identifier, the key of all owned documents
    pub identifier: String,

    pub email: String,

    /// Ephemeral session token
    pub token: String,
}

impl From<SignInResponse> for UserIdentity {
    fn from(response: SignInResponse) -> Self {
        Self {
            identifier: response.local_id,
            email: response.email,
            token: response.id_token,
        }
    }
}

impl fmt::Debug for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserIdentity")
            .field("identifier", &self.identifier)
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .finish()
    }
}
