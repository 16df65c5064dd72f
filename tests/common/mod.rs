//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use fantasy_manager::common::errors::{FantasyError, Result};
use fantasy_manager::common::traits::PlatformClient;
use fantasy_manager::common::types::{PlayerId, RawResponse, Roster, TransactionRequest};
use fantasy_manager::engine::RetryPolicy;
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub const TEAM_KEY: &str = "nhl.l.31175.t.4";

/// Retry bounds small enough to run in milliseconds
pub static FAST_POLICY: Lazy<RetryPolicy> = Lazy::new(|| RetryPolicy {
    max_attempts: 6,
    max_elapsed: Duration::from_secs(10),
    backoff: Duration::from_millis(1),
    waiver_cooldown: Duration::from_millis(10),
    max_compensations: 3,
    sleep_slice: Duration::from_millis(5),
});

/// Create a roster snapshot for testing
pub fn sample_roster(players: &[&str]) -> Roster {
    Roster::new(TEAM_KEY, players.iter().map(|p| PlayerId::from(*p)).collect())
        .with_team_name("Larkin Around")
}

/// One scripted answer to `submit_transaction`
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond with a body; `applies` says whether the roster changes
    Body {
        status: u16,
        body: String,
        applies: bool,
    },
    /// Network timeout
    Timeout,
    /// Session expired
    Unauthorized,
}

impl Reply {
    pub fn applied(body: &str) -> Self {
        Reply::Body {
            status: 200,
            body: body.to_string(),
            applies: true,
        }
    }

    pub fn ignored(status: u16, body: &str) -> Self {
        Reply::Body {
            status,
            body: body.to_string(),
            applies: false,
        }
    }
}

/// Calls made against the stub, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CheckAuth,
    FetchRoster,
    Submit(TransactionRequest),
    CancelWaiver(PlayerId),
    ResolveName(PlayerId),
    Refresh,
}

/// In-memory platform with a scripted submit queue
///
/// Replies are consumed in order; once the queue is empty `fallback`
/// answers every further submission.
pub struct ScriptedClient {
    roster: Mutex<Vec<PlayerId>>,
    replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedClient {
    pub fn new(players: &[&str]) -> Self {
        Self {
            roster: Mutex::new(players.iter().map(|p| PlayerId::from(*p)).collect()),
            replies: Mutex::new(VecDeque::new()),
            fallback: Reply::applied("<html>ok</html>"),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_replies(self, replies: Vec<Reply>) -> Self {
        *self.replies.lock().unwrap() = replies.into();
        self
    }

    pub fn with_fallback(mut self, fallback: Reply) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> usize {
        self.count(|call| matches!(call, Call::Submit(_)))
    }

    pub fn cancellations(&self) -> usize {
        self.count(|call| matches!(call, Call::CancelWaiver(_)))
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    pub fn players(&self) -> Vec<PlayerId> {
        self.roster.lock().unwrap().clone()
    }

    /// Change the roster behind the executor's back
    pub fn remove_player(&self, player: &str) {
        self.roster
            .lock()
            .unwrap()
            .retain(|p| p.as_str() != player);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn apply(&self, request: &TransactionRequest) {
        let mut roster = self.roster.lock().unwrap();
        if let Some(drop) = &request.drop_player_id {
            roster.retain(|p| p != drop);
        }
        if let Some(add) = &request.add_player_id {
            if !request.is_waiver_claim && !roster.contains(add) {
                roster.push(add.clone());
            }
        }
    }
}

#[async_trait]
impl PlatformClient for ScriptedClient {
    async fn check_auth(&self) -> Result<()> {
        self.record(Call::CheckAuth);
        Ok(())
    }

    async fn fetch_roster(&self) -> Result<Roster> {
        self.record(Call::FetchRoster);
        Ok(Roster::new(TEAM_KEY, self.players()))
    }

    async fn submit_transaction(&self, request: &TransactionRequest) -> Result<RawResponse> {
        self.record(Call::Submit(request.clone()));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            Reply::Body {
                status,
                body,
                applies,
            } => {
                if applies {
                    self.apply(request);
                }
                Ok(RawResponse::new(status, body))
            }
            Reply::Timeout => Err(FantasyError::Timeout("submit".to_string())),
            Reply::Unauthorized => Err(FantasyError::Authentication(
                "Server returned status 401 Unauthorized".to_string(),
            )),
        }
    }

    async fn cancel_waiver(&self, player_id: &PlayerId) -> Result<()> {
        self.record(Call::CancelWaiver(player_id.clone()));
        Ok(())
    }

    async fn resolve_player_name(&self, player_id: &PlayerId) -> Result<String> {
        self.record(Call::ResolveName(player_id.clone()));
        Ok(format!("Player {}", player_id))
    }

    async fn refresh_credentials(&self) -> Result<()> {
        self.record(Call::Refresh);
        Ok(())
    }
}

/// Sample Yahoo API payloads
pub mod api_responses {
    /// Token endpoint answer
    pub const TOKEN: &str = r#"{
        "access_token": "tok-123",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh"
    }"#;

    /// Team roster with two players
    pub const ROSTER: &str = r#"{
        "fantasy_content": {
            "team": [
                [
                    {"team_key": "nhl.l.31175.t.4"},
                    {"team_id": "4"},
                    {"name": "Larkin Around"},
                    {"faab_balance": "87"}
                ],
                {
                    "roster": {
                        "0": {
                            "players": {
                                "0": {"player": [[
                                    {"player_key": "nhl.p.6744"},
                                    {"player_id": "6744"},
                                    {"name": {"full": "Jack Eichel"}}
                                ]]},
                                "1": {"player": [[
                                    {"player_key": "nhl.p.6751"},
                                    {"player_id": "6751"},
                                    {"name": {"full": "Timo Meier"}}
                                ]]},
                                "count": 2
                            }
                        }
                    }
                }
            ]
        }
    }"#;

    /// Player lookup answer
    pub const PLAYER: &str = r#"{
        "fantasy_content": {
            "league": [
                {"league_key": "nhl.l.31175"},
                {"players": {
                    "0": {"player": [[
                        {"player_key": "nhl.p.8290"},
                        {"player_id": "8290"},
                        {"name": {"full": "Matt Boldy", "first": "Matt", "last": "Boldy"}}
                    ]]},
                    "count": 1
                }}
            ]
        }
    }"#;
}
