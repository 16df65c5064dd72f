//! OAuth2 helpers for the Yahoo fantasy API

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Duration, Utc};

use super::messages::TokenResponse;

/// Refresh this long before the platform says the token expires
pub const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// Build the HTTP Basic `Authorization` value for the token endpoint
///
/// # Arguments
/// * `client_id` - OAuth2 application id
/// * `client_secret` - OAuth2 application secret
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let pair = format!("{}:{}", client_id, client_secret);
    format!("Basic {}", BASE64.encode(pair.as_bytes()))
}

/// Access token plus the instant it stops being valid
#[derive(Clone)]
pub struct OAuthToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl OAuthToken {
    /// Build a token from a token-endpoint answer received at `now`
    pub fn from_response(response: &TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            access_token: response.access_token.clone(),
            expires_at: now + Duration::seconds(response.expires_in as i64),
        }
    }

    /// True when the token is gone or about to be
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now <= Duration::seconds(EXPIRY_MARGIN_SECONDS)
    }

    /// Attach the bearer token to a request
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(&self.access_token)
    }
}

impl std::fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthToken")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
