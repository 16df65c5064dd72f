//! Roster controller: the caller of the transaction engine
//!
//! Checks the session, logs what is about to happen, validates against the
//! current roster, waits for the target instant and hands over to the
//! executor.

use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::common::errors::{FantasyError, Result};
use crate::common::traits::PlatformClient;
use crate::common::types::{PlayerId, TransactionRequest};
use crate::config::types::{AppConfig, LeagueConfig};
use crate::engine::{
    ExecutionReport, PreflightValidator, RetryPolicy, RosterState, ScheduledMoment, Scheduler,
    TransactionExecutor,
};

const SEPARATOR: &str = "==================================================";

/// Drives one scheduled roster transaction for one league
pub struct RosterController<C: PlatformClient + ?Sized> {
    client: Arc<C>,
    league: LeagueConfig,
    scheduler: Scheduler,
    preflight_lead: Duration,
    policy: RetryPolicy,
}

impl<C: PlatformClient + ?Sized> RosterController<C> {
    pub fn new(client: Arc<C>, league: LeagueConfig, config: &AppConfig) -> Result<Self> {
        let scheduler = Scheduler::from_settings(&config.scheduler)?;
        let mut policy = RetryPolicy::from_settings(&config.retry);
        policy.sleep_slice = config.scheduler.max_sleep_slice();

        Ok(Self {
            client,
            league,
            scheduler,
            preflight_lead: config.scheduler.preflight_lead(),
            policy,
        })
    }

    /// Resolve when the transaction should run
    pub fn resolve_target(&self, start: Option<&str>, run_now: bool) -> Result<DateTime<Local>> {
        self.scheduler.resolve_target(start, run_now)
    }

    /// Check the session, refreshing once if it has expired
    #[instrument(skip(self))]
    pub async fn ensure_auth(&self) -> Result<()> {
        match self.client.check_auth().await {
            Err(FantasyError::Authentication(msg)) => {
                warn!(reason = %msg, "Session check failed, refreshing credentials");
                self.client.refresh_credentials().await?;
                self.client.check_auth().await
            }
            other => other,
        }
    }

    /// Validate, wait for `target`, then execute `request`
    #[instrument(skip(self, request), fields(league = %self.league.id, kind = %request.kind()))]
    pub async fn run(
        &self,
        request: &TransactionRequest,
        target: DateTime<Local>,
    ) -> Result<ExecutionReport> {
        self.ensure_auth().await?;
        self.log_inputs(request).await;

        let mut roster = RosterState::new();
        let snapshot = roster.refresh(self.client.as_ref()).await?;
        PreflightValidator::validate_request(request, snapshot)?;

        let moment = ScheduledMoment::new(target, self.preflight_lead);
        self.scheduler
            .await_target(&moment, self.client.as_ref())
            .await?;

        let executor = TransactionExecutor::new(self.client.clone(), self.policy.clone());
        executor.execute(request).await
    }

    /// Display name for a player id
    pub async fn player_name(&self, player_id: &PlayerId) -> Result<String> {
        self.client.resolve_player_name(player_id).await
    }

    /// Log an aligned summary of the request
    async fn log_inputs(&self, request: &TransactionRequest) {
        let league = self
            .league
            .name
            .clone()
            .unwrap_or_else(|| self.league.id.clone());
        let add = self.describe_player(request.add_player_id.as_ref()).await;
        let drop = self.describe_player(request.drop_player_id.as_ref()).await;
        let faab = request
            .bid_amount
            .map(|bid| format!("${}", bid))
            .unwrap_or_else(|| "-".to_string());

        info!("{}", SEPARATOR);
        info!("{}", summary_line("League", &league));
        info!("{}", summary_line("Add", &add));
        info!("{}", summary_line("Drop", &drop));
        info!("{}", summary_line("Type", &request.kind().to_string()));
        info!("{}", summary_line("FAAB", &faab));
        info!("{}", SEPARATOR);
    }

    /// `Name (id)`, or the bare id when the lookup fails
    async fn describe_player(&self, player: Option<&PlayerId>) -> String {
        let Some(player) = player else {
            return "-".to_string();
        };
        match self.client.resolve_player_name(player).await {
            Ok(name) => format!("{} ({})", name, player),
            Err(err) => {
                warn!(player = %player, error = %err, "Could not resolve player name");
                player.to_string()
            }
        }
    }
}

fn summary_line(label: &str, value: &str) -> String {
    format!("{:<8}{}", format!("{}:", label), value)
}
