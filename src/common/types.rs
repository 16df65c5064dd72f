//! Unified types shared by the engine and platform clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{FantasyError, Result};

/// Fantasy platform identifier
///
/// Only platforms with a working client are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Yahoo,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Yahoo => write!(f, "yahoo"),
        }
    }
}

/// Platform-assigned player identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// Snapshot of the managed team's roster
///
/// True only as of `fetched_at`; a later fetch replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    /// Platform key of the team (e.g. `nhl.l.31175.t.1`)
    pub team_key: String,
    /// Display name of the team, when the platform returns it
    #[serde(default)]
    pub team_name: Option<String>,
    /// Rostered player ids in the order the platform lists them
    pub players: Vec<PlayerId>,
    /// Remaining FAAB balance, for leagues that use bidding
    #[serde(default)]
    pub faab_balance: Option<u32>,
    /// When this snapshot was taken
    pub fetched_at: DateTime<Utc>,
}

impl Roster {
    /// Create a roster snapshot taken now
    pub fn new(team_key: impl Into<String>, players: Vec<PlayerId>) -> Self {
        Self {
            team_key: team_key.into(),
            team_name: None,
            players,
            faab_balance: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn with_team_name(mut self, name: impl Into<String>) -> Self {
        self.team_name = Some(name.into());
        self
    }

    pub fn with_faab_balance(mut self, balance: u32) -> Self {
        self.faab_balance = Some(balance);
        self
    }

    /// Check whether a player is on this snapshot
    pub fn contains(&self, player: &PlayerId) -> bool {
        self.players.iter().any(|p| p == player)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Kind of roster change, derived from a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Free-agent add with no drop
    Add,
    /// Drop with no add
    Drop,
    /// Free-agent add paired with a drop
    Replace,
    /// Waiver claim, optionally with a drop and a FAAB bid
    WaiverClaim,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Add => write!(f, "Free Agent Add"),
            TransactionKind::Drop => write!(f, "Drop"),
            TransactionKind::Replace => write!(f, "Free Agent Add/Drop"),
            TransactionKind::WaiverClaim => write!(f, "Waiver Claim"),
        }
    }
}

/// A single pending roster change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub add_player_id: Option<PlayerId>,
    pub drop_player_id: Option<PlayerId>,
    pub is_waiver_claim: bool,
    pub bid_amount: Option<u32>,
}

impl TransactionRequest {
    /// Build a request, enforcing that something is added or dropped and
    /// that a bid only accompanies a waiver claim.
    pub fn new(
        add_player_id: Option<PlayerId>,
        drop_player_id: Option<PlayerId>,
        is_waiver_claim: bool,
        bid_amount: Option<u32>,
    ) -> Result<Self> {
        if add_player_id.is_none() && drop_player_id.is_none() {
            return Err(FantasyError::Input(
                "a transaction needs a player to add or a player to drop".to_string(),
            ));
        }
        if is_waiver_claim && add_player_id.is_none() {
            return Err(FantasyError::Input(
                "a waiver claim needs a player to add".to_string(),
            ));
        }
        if bid_amount.is_some() && !is_waiver_claim {
            return Err(FantasyError::Input(
                "a FAAB bid is only valid on a waiver claim".to_string(),
            ));
        }
        if let (Some(add), Some(drop)) = (&add_player_id, &drop_player_id) {
            if add == drop {
                return Err(FantasyError::Input(format!(
                    "cannot add and drop the same player ({})",
                    add
                )));
            }
        }

        Ok(Self {
            add_player_id,
            drop_player_id,
            is_waiver_claim,
            bid_amount,
        })
    }

    /// Free-agent add, no drop
    pub fn add(player: impl Into<PlayerId>) -> Self {
        Self {
            add_player_id: Some(player.into()),
            drop_player_id: None,
            is_waiver_claim: false,
            bid_amount: None,
        }
    }

    /// Drop only
    pub fn drop(player: impl Into<PlayerId>) -> Self {
        Self {
            add_player_id: None,
            drop_player_id: Some(player.into()),
            is_waiver_claim: false,
            bid_amount: None,
        }
    }

    /// Free-agent add paired with a drop
    pub fn replace(add: impl Into<PlayerId>, drop: impl Into<PlayerId>) -> Self {
        Self {
            add_player_id: Some(add.into()),
            drop_player_id: Some(drop.into()),
            is_waiver_claim: false,
            bid_amount: None,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        match (&self.add_player_id, &self.drop_player_id, self.is_waiver_claim) {
            (_, _, true) => TransactionKind::WaiverClaim,
            (Some(_), Some(_), false) => TransactionKind::Replace,
            (Some(_), None, false) => TransactionKind::Add,
            (None, _, false) => TransactionKind::Drop,
        }
    }
}

/// Raw response of a roster-change request, uninterpreted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body text
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Shorthand for a 200 response
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Classified result of one submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionOutcome {
    /// The platform accepted the change
    Success,
    /// The player to add is already on the roster
    AlreadyRostered,
    /// Player already played today, or no longer fits the position
    PlayerLocked,
    /// Weekly add limit reached
    QuotaExceeded,
    /// The add turned into a waiver claim nobody asked for
    UnintendedWaiverSideEffect,
    /// The player to drop is no longer on the roster
    DropTargetGone,
    /// Anything that cannot be read as a definite answer
    TransientUnknown,
    /// Not worth retrying
    Fatal(String),
}

impl TransactionOutcome {
    /// Outcome that leaves the roster in an acceptable end state
    pub fn is_success_equivalent(&self) -> bool {
        matches!(
            self,
            TransactionOutcome::Success
                | TransactionOutcome::AlreadyRostered
                | TransactionOutcome::DropTargetGone
        )
    }

    /// Outcome where nothing had to be done
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            TransactionOutcome::AlreadyRostered | TransactionOutcome::DropTargetGone
        )
    }

    /// Rejection imposed by league rules
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TransactionOutcome::PlayerLocked | TransactionOutcome::QuotaExceeded
        )
    }
}

impl std::fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionOutcome::Success => write!(f, "success"),
            TransactionOutcome::AlreadyRostered => write!(f, "already rostered"),
            TransactionOutcome::PlayerLocked => write!(f, "player locked"),
            TransactionOutcome::QuotaExceeded => write!(f, "weekly add limit reached"),
            TransactionOutcome::UnintendedWaiverSideEffect => {
                write!(f, "unintended waiver claim")
            }
            TransactionOutcome::DropTargetGone => write!(f, "drop target gone"),
            TransactionOutcome::TransientUnknown => write!(f, "unknown (transient)"),
            TransactionOutcome::Fatal(reason) => write!(f, "fatal: {}", reason),
        }
    }
}
