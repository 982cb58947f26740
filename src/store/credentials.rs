//! The Google service account key and the OAuth2 JWT bearer grant built from it.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{Result, StoreError};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime Google accepts for a self-signed assertion.
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// A cached token is not handed out if it expires sooner than this.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

// ###################################
// ->   STRUCTS
// ###################################
/// The JSON key file issued for a service account.
/// Fields we don't need (`auth_uri`, certificate urls...) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: SecretString,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Claims of the self-signed JWT exchanged for an access token.
#[derive(Debug, Serialize)]
struct GrantClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Successful response of the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: SecretString,
    pub expires_in: i64,
}

/// An access token together with the moment it stops being valid.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
}

// ###################################
// ->   IMPLs
// ###################################
impl ServiceAccountKey {
    /// Parses the raw JSON key. Required fields must be present and non-empty.
    pub fn parse<S>(raw: S) -> Result<Self>
    where
        S: AsRef<str>,
    {
        let key: ServiceAccountKey = serde_json::from_str(raw.as_ref())
            .map_err(|er| StoreError::InvalidServiceAccountKey(er.to_string()))?;

        let required = [
            ("project_id", key.project_id.as_str()),
            ("private_key_id", key.private_key_id.as_str()),
            ("private_key", key.private_key.expose_secret()),
            ("client_email", key.client_email.as_str()),
        ];
        if let Some((field, _)) = required.iter().find(|(_, val)| val.trim().is_empty()) {
            return Err(StoreError::InvalidServiceAccountKey(format!(
                "field '{field}' is empty"
            )));
        }

        Ok(key)
    }

    /// Loads the PEM encoded private key into a key usable for RS256 signing.
    pub fn encoding_key(&self) -> Result<EncodingKey> {
        EncodingKey::from_rsa_pem(self.private_key.expose_secret().as_bytes())
            .map_err(|er| StoreError::InvalidPrivateKey(er.to_string()))
    }

    /// Creates the signed JWT assertion for the token endpoint.
    pub fn signed_assertion(
        &self,
        encoding_key: &EncodingKey,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.private_key_id.clone());

        let iat = now.timestamp();
        let claims = GrantClaims {
            iss: &self.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&header, &claims, encoding_key)
            .map_err(|er| StoreError::TokenSigning(er.to_string()))
    }
}

impl AccessToken {
    pub fn from_response(resp: TokenResponse, received_at: DateTime<Utc>) -> Self {
        AccessToken {
            token: resp.access_token,
            expires_at: received_at + Duration::seconds(resp.expires_in),
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS) < self.expires_at
    }
}
