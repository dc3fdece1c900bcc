//! Google service-account authentication
//!
//! A signed RS256 assertion is exchanged at the account's token endpoint
//! for a bearer token. Tokens are cached until shortly before expiry.

use crate::error::{SheetsError, SheetsResult};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.readonly";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh this many seconds before the token actually expires
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Fields of a service-account key file that signing needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountCredentials {
    /// Parse credentials from the key-file JSON
    pub fn from_json(json: &str) -> SheetsResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| SheetsError::Auth(format!("Invalid service-account JSON: {}", e)))
    }

    /// Accept either inline key-file JSON or a path to a key file
    pub fn from_setting(value: &str) -> SheetsResult<Self> {
        let trimmed = value.trim();
        if trimmed.starts_with('{') {
            return Self::from_json(trimmed);
        }
        let content = std::fs::read_to_string(Path::new(trimmed)).map_err(|e| {
            SheetsError::Auth(format!("Failed to read credentials file {}: {}", trimmed, e))
        })?;
        Self::from_json(&content)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Build the signed JWT assertion for the token exchange
pub fn signed_assertion(creds: &ServiceAccountCredentials, now: i64) -> SheetsResult<String> {
    let claims = AssertionClaims {
        iss: creds.client_email.clone(),
        scope: SCOPES.to_string(),
        aud: creds.token_uri.clone(),
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };
    let key = EncodingKey::from_rsa_pem(creds.private_key.as_bytes())
        .map_err(|e| SheetsError::Auth(format!("Invalid private key: {}", e)))?;
    encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|e| SheetsError::Auth(format!("Failed to sign assertion: {}", e)))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Hands out bearer tokens for one service account
pub struct TokenProvider {
    creds: ServiceAccountCredentials,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(creds: ServiceAccountCredentials, http: reqwest::Client) -> Self {
        Self {
            creds,
            http,
            cached: Mutex::new(None),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.creds.client_email
    }

    /// Current bearer token, fetching a new one when needed
    pub async fn access_token(&self) -> SheetsResult<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();
        if let Some(token) = cached.as_ref() {
            if token.expires_at - EXPIRY_MARGIN_SECS > now {
                return Ok(token.value.clone());
            }
        }

        let assertion = signed_assertion(&self.creds, now)?;
        debug!(client_email = %self.creds.client_email, "Requesting access token");

        let response = self
            .http
            .post(&self.creds.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Auth(format!(
                "Token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SheetsError::Parse(e.to_string()))?;
        let expires_at = now + token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }
}
