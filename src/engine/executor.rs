//! Transaction executor: submit, classify, retry, compensate
//!
//! # States
//!
//! ```text
//! Pending ──▶ Submitted ──▶ Succeeded
//!                │  ▲
//!                │  └──── Retrying ◀──── Compensating
//!                │            ▲               ▲
//!                ├────────────┘               │
//!                ├────────────────────────────┘ (unintended waiver claim)
//!                └──▶ Failed
//! ```
//!
//! Every pass through the loop starts from a fresh roster: a player that is
//! already on the team ends the run as `AlreadyRostered`, a drop target that
//! vanished ends it as `DropTargetGone`. Re-running a finished transaction
//! is therefore harmless.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, Utc};
use tracing::{debug, error, info, warn};

use super::classifier::ResponseClassifier;
use super::roster::RosterState;
use super::scheduler::sleep_until;
use crate::common::errors::{FantasyError, Result};
use crate::common::traits::PlatformClient;
use crate::common::types::{PlayerId, TransactionOutcome, TransactionRequest};
use crate::config::types::RetrySettings;

// =============================================================================
// Retry policy
// =============================================================================

/// Bounds on the retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Transient failures tolerated in a row before giving up
    pub max_attempts: u32,
    /// Wall-clock budget for a run of transient failures
    pub max_elapsed: Duration,
    /// Pause between transient retries
    pub backoff: Duration,
    /// Wait after cancelling an unintended waiver claim
    pub waiver_cooldown: Duration,
    /// Cancellations allowed before giving up
    pub max_compensations: u32,
    /// Longest single sleep during the cooldown
    pub sleep_slice: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            max_elapsed: Duration::from_secs(settings.max_elapsed_seconds),
            backoff: Duration::from_millis(settings.backoff_ms),
            waiver_cooldown: Duration::from_secs(settings.waiver_cooldown_minutes * 60),
            max_compensations: settings.max_compensations,
            sleep_slice: Duration::from_secs(60),
        }
    }
}

// =============================================================================
// Execution state and report
// =============================================================================

/// Where the executor is in its state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Pending,
    Submitted,
    Retrying,
    Compensating,
    Succeeded,
    Failed,
}

impl ExecutionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionState::Succeeded | ExecutionState::Failed)
    }
}

/// Result of a run that ended in an acceptable roster state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// `Success`, `AlreadyRostered` or `DropTargetGone`
    pub outcome: TransactionOutcome,
    /// Submissions made
    pub attempts: u32,
    /// Waiver claims cancelled along the way
    pub compensations: u32,
    /// One-line summary for the operator
    pub message: String,
}

impl ExecutionReport {
    /// Nothing needed doing
    pub fn is_benign(&self) -> bool {
        self.outcome.is_benign()
    }
}

/// Mutable bookkeeping for one `execute` call
struct Run {
    state: ExecutionState,
    attempts: u32,
    compensations: u32,
    transient_failures: u32,
    transient_since: Instant,
    last_failure: String,
    roster: RosterState,
}

impl Run {
    fn new() -> Self {
        Self {
            state: ExecutionState::Pending,
            attempts: 0,
            compensations: 0,
            transient_failures: 0,
            transient_since: Instant::now(),
            last_failure: String::new(),
            roster: RosterState::new(),
        }
    }

    fn transition(&mut self, next: ExecutionState) {
        debug_assert!(!self.state.is_terminal(), "run already finished");
        debug!(from = ?self.state, to = ?next, attempt = self.attempts, "State transition");
        self.state = next;
    }

    fn reset_transient(&mut self) {
        self.transient_failures = 0;
        self.transient_since = Instant::now();
    }
}

// =============================================================================
// Executor
// =============================================================================

/// Drives one transaction to a terminal state
pub struct TransactionExecutor<C: PlatformClient + ?Sized> {
    client: Arc<C>,
    policy: RetryPolicy,
}

impl<C: PlatformClient + ?Sized> TransactionExecutor<C> {
    pub fn new(client: Arc<C>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Execute `request` until it succeeds or fails for good
    ///
    /// Success-equivalent outcomes (`Success`, `AlreadyRostered`,
    /// `DropTargetGone`) come back as a report. League-rule rejections,
    /// fatal responses and exhausted retry bounds come back as errors.
    pub async fn execute(&self, request: &TransactionRequest) -> Result<ExecutionReport> {
        let mut run = Run::new();

        loop {
            info!("The time is {}.", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"));

            // Preconditions may have changed while we slept or backed off
            match self.fetch_roster(&mut run).await {
                Ok(()) => {}
                Err(err) if err.is_transient() => {
                    self.note_transient(&mut run, format!("roster fetch failed: {}", err))
                        .await?;
                    continue;
                }
                Err(err) => return Err(self.fail(&mut run, err)),
            };
            if let Some(outcome) = Self::short_circuit(request, &run.roster) {
                return Ok(self.succeed(&mut run, request, outcome));
            }

            run.attempts += 1;
            run.transition(ExecutionState::Submitted);

            let client = self.client.as_ref();
            let result = self
                .authed("submit transaction", move || client.submit_transaction(request))
                .await;
            let classified = ResponseClassifier::classify(&result);
            debug!(attempt = run.attempts, outcome = %classified, "Submission classified");

            match self.confirm(&mut run, request, classified).await {
                outcome if outcome.is_success_equivalent() => {
                    return Ok(self.succeed(&mut run, request, outcome));
                }
                outcome if outcome.is_rejection() => {
                    let message = match &result {
                        Ok(response) => excerpt(&response.body),
                        Err(err) => err.to_string(),
                    };
                    return Err(self.fail(&mut run, FantasyError::Rejected { outcome, message }));
                }
                TransactionOutcome::Fatal(reason) => {
                    return Err(self.fail(&mut run, FantasyError::Fatal(reason)));
                }
                TransactionOutcome::UnintendedWaiverSideEffect => {
                    self.compensate(&mut run, request).await?;
                }
                _ => {
                    let detail = match &result {
                        Ok(response) => format!(
                            "unconfirmed response (status {}): {}",
                            response.status,
                            excerpt(&response.body)
                        ),
                        Err(err) => err.to_string(),
                    };
                    self.note_transient(&mut run, detail).await?;
                }
            }
        }
    }

    /// Terminal outcome readable straight off the roster, before submitting
    fn short_circuit(
        request: &TransactionRequest,
        roster: &RosterState,
    ) -> Option<TransactionOutcome> {
        if let Some(add) = &request.add_player_id {
            if roster.is_rostered(add) == Some(true) {
                return Some(TransactionOutcome::AlreadyRostered);
            }
        }
        if let Some(drop) = &request.drop_player_id {
            if roster.is_rostered(drop) == Some(false) {
                return Some(TransactionOutcome::DropTargetGone);
            }
        }
        None
    }

    /// Check a classified outcome against the roster where the roster can tell
    ///
    /// A response never proves success on its own: a `Success` whose effect
    /// is not visible on a fresh roster becomes `TransientUnknown`. The one
    /// exception is the explicit "created a waiver claim" signal on a
    /// waiver request, since a pending claim never shows on the roster.
    async fn confirm(
        &self,
        run: &mut Run,
        request: &TransactionRequest,
        outcome: TransactionOutcome,
    ) -> TransactionOutcome {
        if request.is_waiver_claim && outcome == TransactionOutcome::UnintendedWaiverSideEffect {
            return TransactionOutcome::Success;
        }
        if !outcome.is_success_equivalent() {
            return outcome;
        }

        if let Err(err) = self.fetch_roster(run).await {
            warn!(error = %err, "Could not confirm outcome against roster");
            return TransactionOutcome::TransientUnknown;
        }
        let added = request
            .add_player_id
            .as_ref()
            .map_or(true, |add| run.roster.is_rostered(add) == Some(true));
        let dropped = request
            .drop_player_id
            .as_ref()
            .map_or(true, |drop| run.roster.is_rostered(drop) == Some(false));

        let confirmed = match outcome {
            TransactionOutcome::Success => added && dropped,
            TransactionOutcome::AlreadyRostered => request.add_player_id.is_some() && added,
            TransactionOutcome::DropTargetGone => request.drop_player_id.is_some() && dropped,
            _ => true,
        };
        if confirmed {
            outcome
        } else {
            warn!(claimed = %outcome, "Roster does not reflect the reported outcome");
            TransactionOutcome::TransientUnknown
        }
    }

    /// Cancel an unintended waiver claim and wait for it to clear
    async fn compensate(&self, run: &mut Run, request: &TransactionRequest) -> Result<()> {
        let Some(add) = request.add_player_id.as_ref() else {
            return Err(self.fail(
                run,
                FantasyError::Fatal("waiver claim reported for a drop-only transaction".into()),
            ));
        };

        if run.compensations >= self.policy.max_compensations {
            return Err(self.fail(
                run,
                FantasyError::CompensationExhausted {
                    player: add.clone(),
                    attempts: run.compensations,
                },
            ));
        }

        run.compensations += 1;
        run.transition(ExecutionState::Compensating);
        info!("Accidentally added player to waivers, canceling now.");
        self.cancel_waiver(add).await;

        info!(
            "Waiting {} minutes for waivers to clear before trying to add player {} from FA again.",
            self.policy.waiver_cooldown.as_secs() / 60,
            add
        );
        let cooldown = chrono::Duration::from_std(self.policy.waiver_cooldown)
            .map_err(|e| FantasyError::Internal(format!("cooldown out of range: {}", e)))?;
        sleep_until(Utc::now() + cooldown, self.policy.sleep_slice).await;

        run.reset_transient();
        run.transition(ExecutionState::Retrying);
        Ok(())
    }

    async fn cancel_waiver(&self, player: &PlayerId) {
        let client = self.client.as_ref();
        match self
            .authed("cancel waiver", move || client.cancel_waiver(player))
            .await
        {
            Ok(()) => info!("Successfully canceled waiver claim"),
            // The next submission reports the claim again if it is still there
            Err(err) => error!(error = %err, player = %player, "Failed to cancel waiver claim"),
        }
    }

    /// Record a transient failure, then back off or give up
    async fn note_transient(&self, run: &mut Run, detail: String) -> Result<()> {
        run.transient_failures += 1;
        run.last_failure = detail;

        let elapsed = run.transient_since.elapsed();
        if run.transient_failures >= self.policy.max_attempts || elapsed >= self.policy.max_elapsed
        {
            let err = FantasyError::RetriesExhausted {
                attempts: run.attempts,
                last: run.last_failure.clone(),
            };
            return Err(self.fail(run, err));
        }

        run.transition(ExecutionState::Retrying);
        info!(
            "Error: {}. Sleeping {} seconds.",
            run.last_failure,
            self.policy.backoff.as_secs_f64()
        );
        tokio::time::sleep(self.policy.backoff).await;
        Ok(())
    }

    fn succeed(
        &self,
        run: &mut Run,
        request: &TransactionRequest,
        outcome: TransactionOutcome,
    ) -> ExecutionReport {
        run.transition(ExecutionState::Succeeded);
        let message = success_message(request, &outcome);
        info!("{}", message);
        ExecutionReport {
            outcome,
            attempts: run.attempts,
            compensations: run.compensations,
            message,
        }
    }

    fn fail(&self, run: &mut Run, err: FantasyError) -> FantasyError {
        run.transition(ExecutionState::Failed);
        error!(attempts = run.attempts, error = %err, "Transaction failed");
        err
    }

    async fn fetch_roster(&self, run: &mut Run) -> Result<()> {
        let client = self.client.as_ref();
        let roster = self.authed("fetch roster", move || client.fetch_roster()).await?;
        run.roster.replace(roster);
        Ok(())
    }

    /// Run `op`, refreshing credentials and retrying once on an auth failure
    async fn authed<T, F, Fut>(&self, what: &str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match op().await {
            Err(FantasyError::Authentication(msg)) => {
                warn!(reason = %msg, "{} hit an expired session, refreshing credentials", what);
                self.client.refresh_credentials().await?;
                op().await
            }
            other => other,
        }
    }
}

fn success_message(request: &TransactionRequest, outcome: &TransactionOutcome) -> String {
    let add = request.add_player_id.as_ref();
    let drop = request.drop_player_id.as_ref();
    match (outcome, add, drop) {
        (TransactionOutcome::Success, _, _) if request.is_waiver_claim => format!(
            "Success! Waiver claim placed for player {}.",
            add.map(PlayerId::as_str).unwrap_or("-")
        ),
        (TransactionOutcome::Success, Some(add), _) => {
            format!("Success!  Player {} is now on roster.", add)
        }
        (TransactionOutcome::Success, None, Some(drop)) => {
            format!("Success!  Player {} has been dropped.", drop)
        }
        (TransactionOutcome::AlreadyRostered, Some(add), _) => {
            format!("Nothing to do: player {} is already on roster.", add)
        }
        (TransactionOutcome::DropTargetGone, _, Some(drop)) => {
            format!("Nothing to do: player {} has already been dropped.", drop)
        }
        (outcome, _, _) => format!("Finished: {}.", outcome),
    }
}

/// First line of a response body, trimmed for logs
fn excerpt(body: &str) -> String {
    const MAX: usize = 160;
    let line = body.trim().lines().next().unwrap_or_default().trim();
    if line.chars().count() > MAX {
        format!("{}…", line.chars().take(MAX).collect::<String>())
    } else {
        line.to_string()
    }
}
