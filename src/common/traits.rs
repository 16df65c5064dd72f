//! Trait definitions for platform clients

use async_trait::async_trait;

use super::errors::Result;
use super::types::{PlayerId, RawResponse, Roster, TransactionRequest};

/// Capabilities the transaction engine needs from a fantasy platform
///
/// Every call may fail with `FantasyError::Authentication` when the session
/// has expired; callers refresh credentials and retry once. Network-level
/// failures surface as transient errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Verify the session is live and belongs to the configured team
    async fn check_auth(&self) -> Result<()>;

    /// Fetch a fresh snapshot of the managed team's roster
    async fn fetch_roster(&self) -> Result<Roster>;

    /// Submit a roster change and return the platform's raw answer
    ///
    /// The body is not interpreted here; see `ResponseClassifier`.
    async fn submit_transaction(&self, request: &TransactionRequest) -> Result<RawResponse>;

    /// Cancel a pending waiver claim for a player
    async fn cancel_waiver(&self, player_id: &PlayerId) -> Result<()>;

    /// Look up a player's display name
    async fn resolve_player_name(&self, player_id: &PlayerId) -> Result<String>;

    /// Re-establish the authenticated session
    ///
    /// Idempotent; safe to call speculatively.
    async fn refresh_credentials(&self) -> Result<()>;
}
