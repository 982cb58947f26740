use chrono::Utc;
use jsonwebtoken::EncodingKey;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    credentials::{AccessToken, ServiceAccountKey, TokenResponse, JWT_BEARER_GRANT},
    document::{self, CommitRequest, DocumentRef, Write},
    Result, StoreError, TIMESTAMP_FIELD,
};
use crate::config::StoreConfig;

pub struct StoreClient {
    http_client: Client,
    base_url: reqwest::Url,
    database_id: String,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    token: Mutex<Option<AccessToken>>,
}

impl StoreClient {
    pub fn new(key: ServiceAccountKey, store_config: &StoreConfig) -> Result<Self> {
        let base_url = reqwest::Url::parse(&store_config.base_url)
            .map_err(|e| StoreError::UrlParsing(e.to_string()))?;
        let encoding_key = key.encoding_key()?;

        let http_client = Client::builder().timeout(store_config.timeout()).build()?;

        Ok(StoreClient {
            http_client,
            base_url,
            database_id: store_config.database_id.clone(),
            key,
            encoding_key,
            token: Mutex::new(None),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.key.project_id
    }

    /// `projects/{project_id}/databases/{database_id}/documents`
    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.key.project_id, self.database_id
        )
    }

    /// Appends a new document with the given string fields to `collection`, with
    /// `timestamp` set by the store. The write is a single atomic commit.
    pub async fn add_document<'a, I>(&self, collection: &str, fields: I) -> Result<DocumentRef>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let documents_root = self.documents_root();
        let id = document::auto_id();
        let name = format!("{documents_root}/{collection}/{id}");

        let url = self
            .base_url
            .join(&format!("v1/{documents_root}:commit"))
            .map_err(|e| StoreError::UrlParsing(e.to_string()))?;

        let commit = CommitRequest {
            writes: vec![Write::create_with_server_timestamp(
                name.clone(),
                fields,
                TIMESTAMP_FIELD,
            )],
        };

        let token = self.access_token().await?;
        self.http_client
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(&commit)
            .send()
            .await?
            .error_for_status()?;

        Ok(DocumentRef {
            collection: collection.to_string(),
            id,
            name,
        })
    }

    /// Returns the cached access token, or fetches a new one if there is none
    /// or it is about to expire.
    pub async fn access_token(&self) -> Result<SecretString> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.token.clone());
        }

        let token = self.fetch_access_token().await?;
        let out = token.token.clone();
        *cached = Some(token);

        Ok(out)
    }

    async fn fetch_access_token(&self) -> Result<AccessToken> {
        debug!(
            "{:<20} - Requesting a new access token for: {}",
            "fetch_access_token", self.key.client_email
        );
        let now = Utc::now();
        let assertion = self.key.signed_assertion(&self.encoding_key, now)?;

        let resp: TokenResponse = self
            .http_client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(AccessToken::from_response(resp, now))
    }
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("base_url", &self.base_url.as_str())
            .field("database_id", &self.database_id)
            .field("project_id", &self.key.project_id)
            .field("client_email", &self.key.client_email)
            .finish_non_exhaustive()
    }
}
