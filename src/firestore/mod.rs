//! Document store access through the Cloud Firestore REST API

mod filter;
mod types;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::credentials::TokenSource;
use crate::error::Error;
use crate::fetch::{ApiFailure, Fetch};

pub use filter::*;
pub use types::*;

/// Document-store operations the portal depends on
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read. `Ok(None)` when the document does not exist.
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, Error>;

    /// Point delete. Deleting a missing document succeeds.
    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), Error>;

    /// All documents of `collection` whose string `field` equals `value`
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, Error>;
}

/// Client for a single Firestore database
pub struct FirestoreClient {
    url: String,
    project_id: String,
    database_id: String,
    http_client: Client,
    tokens: Arc<TokenSource>,
}

impl FirestoreClient {
    /// Create a new FirestoreClient
    pub fn new(
        url: &str,
        project_id: &str,
        database_id: &str,
        http_client: Client,
        tokens: Arc<TokenSource>,
    ) -> Self {
        Self {
            url: url.to_string(),
            project_id: project_id.to_string(),
            database_id: database_id.to_string(),
            http_client,
            tokens,
        }
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents",
            self.url, self.project_id, self.database_id
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.documents_url(),
            urlencoding::encode(collection),
            urlencoding::encode(id)
        )
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, Error> {
        let token = self.tokens.access_token().await?;
        let response = Fetch::get(&self.http_client, &self.document_url(collection, id))
            .bearer_auth(&token)?
            .execute_raw()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json::<Document>().await?)),
            _ => {
                let failure = ApiFailure::from_response(response).await;
                Err(Error::database(format!(
                    "Failed to get {}/{}: {}",
                    collection, id, failure
                )))
            }
        }
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), Error> {
        let token = self.tokens.access_token().await?;
        let response = Fetch::delete(&self.http_client, &self.document_url(collection, id))
            .bearer_auth(&token)?
            .execute_raw()
            .await?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            debug!(%collection, %id, "document deleted");
            return Ok(());
        }

        let failure = ApiFailure::from_response(response).await;
        Err(Error::database(format!(
            "Failed to delete {}/{}: {}",
            collection, id, failure
        )))
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, Error> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}:runQuery", self.documents_url());
        let request = RunQueryRequest {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: collection.to_string(),
                }],
                filter: Some(Filter::equal(field, value)),
            },
        };

        let response = Fetch::post(&self.http_client, &url)
            .bearer_auth(&token)?
            .json(&request)?
            .execute_raw()
            .await?;

        if !response.status().is_success() {
            let failure = ApiFailure::from_response(response).await;
            return Err(Error::database(format!(
                "Failed to query {} where {} == {}: {}",
                collection, field, value, failure
            )));
        }

        let results: Vec<RunQueryResponse> = response.json().await?;
        Ok(results.into_iter().filter_map(|r| r.document).collect())
    }
}
