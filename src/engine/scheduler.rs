//! Target-instant resolution and wall-clock waiting

use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use tracing::{debug, info, instrument, warn};

use crate::common::errors::{FantasyError, Result};
use crate::common::traits::PlatformClient;
use crate::config::types::SchedulerSettings;

/// Naive forms accepted for `--start`, interpreted in local time
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// When to run, fixed once per invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledMoment {
    /// Instant the transaction should be submitted
    pub target: DateTime<Utc>,
    /// How long before `target` credentials are refreshed
    pub preflight_lead: Duration,
}

impl ScheduledMoment {
    pub fn new<Tz: TimeZone>(target: DateTime<Tz>, preflight_lead: Duration) -> Self {
        Self {
            target: target.with_timezone(&Utc),
            preflight_lead,
        }
    }
}

/// Computes the target instant and waits for it
#[derive(Debug, Clone)]
pub struct Scheduler {
    lock_time: NaiveTime,
    max_slice: Duration,
    early_wake: Duration,
}

impl Scheduler {
    /// Scheduler with a daily lock boundary at `lock_time` local time
    pub fn new(lock_time: NaiveTime) -> Self {
        Self {
            lock_time,
            max_slice: Duration::from_secs(60),
            early_wake: Duration::ZERO,
        }
    }

    pub fn from_settings(settings: &SchedulerSettings) -> Result<Self> {
        Ok(Self::new(settings.lock_time()?)
            .with_max_slice(settings.max_sleep_slice())
            .with_early_wake(settings.early_wake()))
    }

    /// Longest single sleep before the wall clock is re-read
    pub fn with_max_slice(mut self, max_slice: Duration) -> Self {
        self.max_slice = max_slice.max(Duration::from_millis(1));
        self
    }

    /// Wake this long before the target to absorb request latency
    pub fn with_early_wake(mut self, early_wake: Duration) -> Self {
        self.early_wake = early_wake;
        self
    }

    pub fn lock_time(&self) -> NaiveTime {
        self.lock_time
    }

    /// Resolve the target instant against the local clock
    pub fn resolve_target(&self, explicit: Option<&str>, run_now: bool) -> Result<DateTime<Local>> {
        self.resolve_target_at(Local::now(), explicit, run_now)
    }

    /// Resolve the target instant relative to `now`
    ///
    /// `run_now` wins, then an explicit timestamp, then the next lock
    /// boundary strictly after `now`.
    pub fn resolve_target_at<Tz: TimeZone>(
        &self,
        now: DateTime<Tz>,
        explicit: Option<&str>,
        run_now: bool,
    ) -> Result<DateTime<Tz>> {
        if run_now {
            return Ok(now);
        }
        match explicit {
            Some(input) => parse_start(input, &now.timezone()),
            None => self.next_lock_boundary(&now),
        }
    }

    /// Next occurrence of the lock time strictly after `now`
    pub fn next_lock_boundary<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<DateTime<Tz>> {
        let tz = now.timezone();
        let mut day = now.date_naive();

        // a DST gap can swallow the boundary on one day, never on three
        for _ in 0..3 {
            if let Some(candidate) = tz.from_local_datetime(&day.and_time(self.lock_time)).earliest() {
                if candidate > *now {
                    return Ok(candidate);
                }
            }
            day = day
                .succ_opt()
                .ok_or_else(|| FantasyError::Input("date out of range".to_string()))?;
        }

        Err(FantasyError::Internal(format!(
            "no lock boundary at {} found after {}",
            self.lock_time,
            now.naive_local()
        )))
    }

    /// Sleep until `moment.target`, refreshing credentials at the lead time
    ///
    /// When more than the lead remains, sleeps to `target - lead`, refreshes
    /// and re-checks the session, then sleeps the rest. Otherwise sleeps
    /// straight to the target.
    #[instrument(skip(self, client), fields(target = %moment.target))]
    pub async fn await_target<C>(&self, moment: &ScheduledMoment, client: &C) -> Result<()>
    where
        C: PlatformClient + ?Sized,
    {
        let lead = chrono::Duration::from_std(moment.preflight_lead)
            .map_err(|e| FantasyError::Input(format!("preflight lead out of range: {}", e)))?;
        let early = chrono::Duration::from_std(self.early_wake)
            .map_err(|e| FantasyError::Input(format!("early wake out of range: {}", e)))?;
        let wake_at = moment.target - early;

        if moment.target - Utc::now() > lead {
            let preflight_at = moment.target - lead;
            info!(
                "Time until {}: {}. Preflight check at {}.",
                moment.target.with_timezone(&Local).to_rfc3339(),
                describe_remaining(moment.target),
                preflight_at.with_timezone(&Local).to_rfc3339()
            );
            sleep_until(preflight_at, self.max_slice).await;

            info!("Running preflight: refreshing credentials");
            tolerate_transient("credential refresh", client.refresh_credentials().await)?;
            tolerate_transient("session check", client.check_auth().await)?;
        }

        info!(
            "Time until {}: {}.",
            moment.target.with_timezone(&Local).to_rfc3339(),
            describe_remaining(wake_at)
        );
        sleep_until(wake_at, self.max_slice).await;
        debug!(now = %Utc::now(), "Target reached");
        Ok(())
    }
}

/// Let a network hiccup at the preflight pass; the executor refreshes on
/// demand. Anything else, including a dead session, stops the run.
fn tolerate_transient(step: &str, result: Result<()>) -> Result<()> {
    match result {
        Err(err) if err.is_transient() => {
            warn!(error = %err, "Preflight {} failed, continuing to target", step);
            Ok(())
        }
        other => other,
    }
}

/// Parse a `--start` value
///
/// Accepts RFC 3339 with an offset, or a naive date/time read in `tz`.
/// A bare date means midnight.
pub fn parse_start<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<DateTime<Tz>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(tz));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| FantasyError::Input(format!("Unrecognised start time: '{}'", input)))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| FantasyError::Input(format!("'{}' does not exist in local time", input)))
}

/// Sleep until the wall clock reaches `deadline`
///
/// Sleeps in slices of at most `max_slice`, re-reading the clock after each,
/// so an interrupt is observed promptly and clock jumps are followed.
pub async fn sleep_until(deadline: DateTime<Utc>, max_slice: Duration) {
    loop {
        let remaining = match (deadline - Utc::now()).to_std() {
            Ok(remaining) if !remaining.is_zero() => remaining,
            _ => return,
        };
        tokio::time::sleep(remaining.min(max_slice)).await;
    }
}

/// Human-readable time left until `deadline`
fn describe_remaining(deadline: DateTime<Utc>) -> String {
    let total = (deadline - Utc::now()).to_std().unwrap_or_default();
    let secs = total.as_secs_f64();
    let hours = (secs / 3600.0).floor();
    let minutes = ((secs % 3600.0) / 60.0).floor();
    let seconds = secs % 60.0;
    format!(
        "sleeping {} hours {} minutes {:.2} seconds",
        hours as u64, minutes as u64, seconds
    )
}
