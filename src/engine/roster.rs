//! In-memory view of the latest roster snapshot

use tracing::debug;

use crate::common::errors::Result;
use crate::common::traits::PlatformClient;
use crate::common::types::{PlayerId, Roster};

/// Answers "is this player on my roster" from the most recent fetch
///
/// Holds one snapshot at a time. Every `refresh` replaces it wholesale;
/// answers are only as fresh as the snapshot's `fetched_at`.
#[derive(Debug, Clone, Default)]
pub struct RosterState {
    latest: Option<Roster>,
}

impl RosterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a new snapshot and make it current
    pub async fn refresh<C>(&mut self, client: &C) -> Result<&Roster>
    where
        C: PlatformClient + ?Sized,
    {
        let roster = client.fetch_roster().await?;
        Ok(self.replace(roster))
    }

    /// Swap in a snapshot fetched elsewhere
    pub fn replace(&mut self, roster: Roster) -> &Roster {
        debug!(
            team = %roster.team_key,
            players = roster.len(),
            "Roster snapshot updated"
        );
        self.latest.insert(roster)
    }

    /// Membership according to the latest snapshot; `None` before any fetch
    pub fn is_rostered(&self, player: &PlayerId) -> Option<bool> {
        self.latest.as_ref().map(|roster| roster.contains(player))
    }
}
