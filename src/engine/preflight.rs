//! Roster preconditions checked before a transaction is scheduled or sent

use crate::common::errors::{FantasyError, Result};
use crate::common::types::{PlayerId, Roster, TransactionRequest};

/// Pure legality checks against a roster snapshot
///
/// Snapshots go stale during long waits, so this runs once when the
/// transaction is scheduled and again right before submission.
pub struct PreflightValidator;

impl PreflightValidator {
    /// Check that `add` is not already rostered and `drop` (if any) is
    pub fn validate(
        add: Option<&PlayerId>,
        drop: Option<&PlayerId>,
        roster: &Roster,
    ) -> Result<()> {
        if let Some(add) = add {
            if roster.contains(add) {
                return Err(FantasyError::AlreadyRostered(add.clone()));
            }
        }
        if let Some(drop) = drop {
            if !roster.contains(drop) {
                return Err(FantasyError::NotOnRoster(drop.clone()));
            }
        }
        Ok(())
    }

    /// Validate a whole request
    pub fn validate_request(request: &TransactionRequest, roster: &Roster) -> Result<()> {
        Self::validate(
            request.add_player_id.as_ref(),
            request.drop_player_id.as_ref(),
            roster,
        )
    }
}
