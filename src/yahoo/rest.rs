//! HTTP layer for Yahoo: web forms, the JSON API and the token endpoint

use reqwest::header::{AUTHORIZATION, COOKIE};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::auth::{basic_auth_header, OAuthToken};
use super::messages::{ApiErrorResponse, TokenResponse};
use crate::common::errors::{FantasyError, Result};
use crate::common::types::RawResponse;

/// Host fragment of the Yahoo sign-in pages
const LOGIN_HOST: &str = "login.yahoo.com";

/// Raw HTTP client for the three Yahoo surfaces
#[derive(Debug, Clone)]
pub struct YahooRestClient {
    /// HTTP client
    client: Client,
    /// Fantasy web pages, e.g. `https://hockey.fantasysports.yahoo.com/hockey`
    fantasy_url: String,
    /// Fantasy JSON API
    api_url: String,
    /// OAuth2 token service
    oauth_url: String,
    /// Browser session cookie
    cookie: String,
}

impl YahooRestClient {
    /// Create a new REST client
    pub fn new(fantasy_url: &str, api_url: &str, oauth_url: &str, cookie: &str) -> Result<Self> {
        Self::with_timeout(fantasy_url, api_url, oauth_url, cookie, Duration::from_secs(30))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(
        fantasy_url: &str,
        api_url: &str,
        oauth_url: &str,
        cookie: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FantasyError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            fantasy_url: base_url(fantasy_url)?,
            api_url: base_url(api_url)?,
            oauth_url: base_url(oauth_url)?,
            cookie: cookie.to_string(),
        })
    }

    // ========================================================================
    // Web pages (cookie session)
    // ========================================================================

    /// Fetch a fantasy web page; `path` is relative to the fantasy URL
    ///
    /// Fails with `Authentication` when the session bounces to sign-in.
    #[instrument(skip(self))]
    pub async fn get_page(&self, path: &str) -> Result<String> {
        let url = format!("{}/{}", self.fantasy_url, path);
        debug!("Fetching page: {}", url);

        let response = self.client.get(&url).header(COOKIE, &self.cookie).send().await?;

        let landed_on_login = response
            .url()
            .host_str()
            .map(|host| host.ends_with(LOGIN_HOST))
            .unwrap_or(false);
        if landed_on_login {
            return Err(FantasyError::Authentication(
                "Session redirected to sign-in".to_string(),
            ));
        }

        let response = Self::check_status(response).await?;
        Ok(response.text().await?)
    }

    /// POST a form to a fantasy web page and hand back the raw answer
    ///
    /// Only 401/403 are turned into errors; anything else is for the
    /// caller to interpret.
    #[instrument(skip(self, form))]
    pub async fn post_form(&self, path: &str, form: &[(&str, String)]) -> Result<RawResponse> {
        let url = format!("{}/{}", self.fantasy_url, path);
        debug!("Posting form to: {}", url);

        let response = self
            .client
            .post(&url)
            .header(COOKIE, &self.cookie)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if is_auth_status(status) {
            return Err(FantasyError::Authentication(format!(
                "Form post rejected with status {}",
                status
            )));
        }

        let body = response.text().await?;
        Ok(RawResponse::new(status.as_u16(), body))
    }

    // ========================================================================
    // JSON API (bearer token)
    // ========================================================================

    /// GET a JSON API resource; `path` is relative to the API URL
    #[instrument(skip(self, token))]
    pub async fn get_json(&self, path: &str, token: &OAuthToken) -> Result<Value> {
        let url = format!("{}/{}", self.api_url, path);
        debug!("Fetching API resource: {}", url);

        let response = token.apply_to_request(self.client.get(&url)).send().await?;
        let response = Self::check_status(response).await?;

        let payload: Value = response.json().await?;
        Ok(payload)
    }

    /// Exchange the long-lived refresh token for an access token
    #[instrument(skip_all)]
    pub async fn exchange_refresh_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenResponse> {
        let url = format!("{}/get_token", self.oauth_url);
        debug!("Requesting access token from: {}", url);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, basic_auth_header(client_id, client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("redirect_uri", "oob"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let token: TokenResponse = response.json().await?;
        Ok(token)
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|e| e.error.description)
            .unwrap_or(body);

        if is_auth_status(status) {
            return Err(FantasyError::Authentication(format!(
                "Server returned status {}: {}",
                status, detail
            )));
        }
        Err(FantasyError::InvalidResponse(format!(
            "Server returned status {}: {}",
            status, detail
        )))
    }
}

/// Validate a configured base URL and strip its trailing slash
fn base_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw)
        .map_err(|e| FantasyError::Configuration(format!("Invalid URL {:?}: {}", raw, e)))?;
    if parsed.cannot_be_a_base() {
        return Err(FantasyError::Configuration(format!(
            "URL {:?} cannot be used as a base",
            raw
        )));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn is_auth_status(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}
