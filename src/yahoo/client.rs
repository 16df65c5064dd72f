//! Yahoo implementation of `PlatformClient`

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::auth::OAuthToken;
use super::messages::{collect_player_ids, faab_balance, player_full_name, team_name};
use super::rest::YahooRestClient;
use crate::common::errors::{FantasyError, Result};
use crate::common::traits::PlatformClient;
use crate::common::types::{PlayerId, RawResponse, Roster, TransactionRequest};
use crate::config::types::{LeagueConfig, SessionCredentials, YahooConfig};

/// Client for one team in one Yahoo league
pub struct YahooClient {
    /// HTTP layer
    rest_client: YahooRestClient,
    /// League and team being managed
    league: LeagueConfig,
    /// Game code used in keys (e.g. `nhl`)
    game_key: String,
    /// Session secrets
    credentials: SessionCredentials,
    /// Current API access token
    token: Arc<RwLock<Option<OAuthToken>>>,
}

impl YahooClient {
    /// Create a client from configuration
    pub fn new(config: &YahooConfig, league: LeagueConfig, timeout: Duration) -> Result<Self> {
        let credentials = config.credentials()?;
        let rest_client = YahooRestClient::with_timeout(
            &config.fantasy_url,
            &config.api_url,
            &config.oauth_url,
            &credentials.cookie,
            timeout,
        )?;

        Ok(Self {
            rest_client,
            league,
            game_key: config.game_key.clone(),
            credentials,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// `{game}.l.{league}`
    pub fn league_key(&self) -> String {
        format!("{}.l.{}", self.game_key, self.league.id)
    }

    /// `{game}.l.{league}.t.{team}`
    pub fn team_key(&self) -> String {
        format!("{}.t.{}", self.league_key(), self.league.team_id)
    }

    /// Team page path relative to the fantasy URL
    fn team_path(&self) -> String {
        format!("{}/{}", self.league.id, self.league.team_id)
    }

    /// Form fields for an add, replace or waiver claim
    fn add_form(&self, add: &PlayerId, request: &TransactionRequest) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("stage", "3".to_string()),
            ("crumb", self.credentials.crumb.clone()),
            ("stat1", "P".to_string()),
            ("stat2", "P".to_string()),
            ("apid", add.to_string()),
        ];
        if let Some(drop) = &request.drop_player_id {
            form.push(("dpid", drop.to_string()));
        }
        if let Some(bid) = request.bid_amount {
            form.push(("faab", bid.to_string()));
        }
        form
    }

    fn drop_form(&self, drop: &PlayerId) -> Vec<(&'static str, String)> {
        vec![
            ("stage", "2".to_string()),
            ("crumb", self.credentials.crumb.clone()),
            ("dpid", drop.to_string()),
        ]
    }

    /// Current access token, exchanging the refresh token when needed
    async fn access_token(&self) -> Result<OAuthToken> {
        {
            let token = self.token.read().await;
            if let Some(token) = token.as_ref() {
                if !token.needs_refresh(Utc::now()) {
                    return Ok(token.clone());
                }
            }
        }
        self.exchange_token().await
    }

    async fn exchange_token(&self) -> Result<OAuthToken> {
        let response = self
            .rest_client
            .exchange_refresh_token(
                &self.credentials.client_id,
                &self.credentials.client_secret,
                &self.credentials.refresh_token,
            )
            .await
            .map_err(|e| match e {
                FantasyError::InvalidResponse(msg) => FantasyError::Authentication(msg),
                other => other,
            })?;

        let token = OAuthToken::from_response(&response, Utc::now());
        debug!(expires_at = %token.expires_at, "Access token refreshed");
        *self.token.write().await = Some(token.clone());
        Ok(token)
    }
}

#[async_trait]
impl PlatformClient for YahooClient {
    #[instrument(skip(self))]
    async fn check_auth(&self) -> Result<()> {
        let page = self.rest_client.get_page(&self.team_path()).await?;

        let missing: Vec<&PlayerId> = self
            .league
            .locked_players
            .iter()
            .filter(|player| !page.contains(player.as_str()))
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "Team page is missing expected players");
            return Err(FantasyError::Authentication("Not logged in!".to_string()));
        }

        debug!("Session is live for team {}", self.team_key());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_roster(&self) -> Result<Roster> {
        let token = self.access_token().await?;
        let team_key = self.team_key();
        let payload = self
            .rest_client
            .get_json(&format!("team/{}/roster?format=json", team_key), &token)
            .await?;

        let players = collect_player_ids(&payload);
        if players.is_empty() {
            return Err(FantasyError::InvalidResponse(format!(
                "Roster for {} lists no players",
                team_key
            )));
        }

        let mut roster = Roster::new(team_key, players);
        if let Some(name) = team_name(&payload) {
            roster = roster.with_team_name(name);
        }
        if let Some(balance) = faab_balance(&payload) {
            roster = roster.with_faab_balance(balance);
        }
        Ok(roster)
    }

    #[instrument(skip(self))]
    async fn submit_transaction(&self, request: &TransactionRequest) -> Result<RawResponse> {
        let (path, form) = match (&request.add_player_id, &request.drop_player_id) {
            (Some(add), _) => (
                format!("{}/addplayer", self.team_path()),
                self.add_form(add, request),
            ),
            (None, Some(drop)) => (
                format!("{}/dropplayer", self.team_path()),
                self.drop_form(drop),
            ),
            (None, None) => {
                return Err(FantasyError::Input(
                    "transaction names no players".to_string(),
                ))
            }
        };

        info!(kind = %request.kind(), "Submitting transaction");
        self.rest_client.post_form(&path, &form).await
    }

    #[instrument(skip(self))]
    async fn cancel_waiver(&self, player_id: &PlayerId) -> Result<()> {
        let form = vec![
            ("stage", "2".to_string()),
            ("crumb", self.credentials.crumb.clone()),
            ("claim_id", format!("1_{}_0", player_id)),
            ("mode", "edit".to_string()),
            ("apid", player_id.to_string()),
            ("s", "Cancel Waiver".to_string()),
        ];

        let response = self
            .rest_client
            .post_form(&format!("{}/editwaiver", self.team_path()), &form)
            .await?;
        if !response.is_success() {
            return Err(FantasyError::InvalidResponse(format!(
                "Waiver cancellation returned status {}",
                response.status
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn resolve_player_name(&self, player_id: &PlayerId) -> Result<String> {
        let token = self.access_token().await?;
        let path = format!(
            "league/{}/players;player_keys={}.p.{}?format=json",
            self.league_key(),
            self.game_key,
            player_id
        );
        let payload = self.rest_client.get_json(&path, &token).await?;

        player_full_name(&payload).ok_or_else(|| {
            FantasyError::InvalidResponse(format!("No name found for player {}", player_id))
        })
    }

    #[instrument(skip(self))]
    async fn refresh_credentials(&self) -> Result<()> {
        info!("Refreshing Yahoo credentials");
        self.exchange_token().await.map(|_| ())
    }
}
