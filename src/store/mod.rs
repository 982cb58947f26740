//! Client for the document store (Firestore over its REST API).
//!
//! Authenticates with a service account key: a self-signed JWT is exchanged for an
//! OAuth2 access token, which is cached until shortly before it expires.

mod client;
mod credentials;
mod document;

pub use client::StoreClient;
pub use credentials::{ServiceAccountKey, DATASTORE_SCOPE, DEFAULT_TOKEN_URI, JWT_BEARER_GRANT};
pub use document::DocumentRef;

/// Collection holding the signup records.
pub const EMAILS_COLLECTION: &str = "emails";
/// Field set to the server time of the write.
pub const TIMESTAMP_FIELD: &str = "timestamp";

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type Result<T> = core::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid service account key: {0}")]
    InvalidServiceAccountKey(String),
    #[error("invalid private key in the service account key: {0}")]
    InvalidPrivateKey(String),
    #[error("failed to sign the token request: {0}")]
    TokenSigning(String),
    #[error("url parsing error: {0}")]
    UrlParsing(String),

    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}
