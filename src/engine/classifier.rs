//! Maps raw platform answers onto transaction outcomes
//!
//! The platform has no structured error codes, only text. Every text
//! signal the engine understands lives in [`SIGNALS`]; nothing else in the
//! crate inspects response bodies.

use crate::common::errors::{FantasyError, Result};
use crate::common::types::{RawResponse, TransactionOutcome};

/// Outcome a text signal stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    AlreadyRostered,
    PlayerLocked,
    QuotaExceeded,
    UnintendedWaiver,
    DropTargetGone,
}

impl SignalKind {
    fn outcome(self) -> TransactionOutcome {
        match self {
            SignalKind::AlreadyRostered => TransactionOutcome::AlreadyRostered,
            SignalKind::PlayerLocked => TransactionOutcome::PlayerLocked,
            SignalKind::QuotaExceeded => TransactionOutcome::QuotaExceeded,
            SignalKind::UnintendedWaiver => TransactionOutcome::UnintendedWaiverSideEffect,
            SignalKind::DropTargetGone => TransactionOutcome::DropTargetGone,
        }
    }
}

/// Ordered (pattern, kind) table; first match wins
///
/// Patterns are matched case-insensitively. "Already rostered" comes first:
/// it is the desired end state, and the executor confirms it against the
/// roster anyway.
pub const SIGNALS: &[(&str, SignalKind)] = &[
    ("is already on your team", SignalKind::AlreadyRostered),
    ("is already on your roster", SignalKind::AlreadyRostered),
    ("player has already played and is no longer", SignalKind::PlayerLocked),
    ("no longer qualifies for that position", SignalKind::PlayerLocked),
    ("you have reached the weekly limit", SignalKind::QuotaExceeded),
    ("created%2520a%2520waiver%2520claim%2520for", SignalKind::UnintendedWaiver),
    ("created a waiver claim for", SignalKind::UnintendedWaiver),
    ("is not on team", SignalKind::DropTargetGone),
];

/// Pure classification of a submission result
pub struct ResponseClassifier;

impl ResponseClassifier {
    /// Classify the result of `submit_transaction`
    ///
    /// Errors are matched against the same table through their message;
    /// unmatched errors are transient, except authentication failures,
    /// which reach here only after a refresh already failed. A 2xx response
    /// with a non-empty body and no signal reads as `Success`; the executor
    /// still confirms it against the roster. Anything else is transient.
    pub fn classify(result: &Result<RawResponse>) -> TransactionOutcome {
        match result {
            Ok(response) => Self::classify_response(response),
            Err(err) => Self::classify_error(err),
        }
    }

    pub fn classify_response(response: &RawResponse) -> TransactionOutcome {
        if let Some(kind) = Self::match_signal(&response.body) {
            return kind.outcome();
        }
        if response.is_success() && !response.body.trim().is_empty() {
            TransactionOutcome::Success
        } else {
            TransactionOutcome::TransientUnknown
        }
    }

    pub fn classify_error(err: &FantasyError) -> TransactionOutcome {
        if let Some(kind) = Self::match_signal(&err.to_string()) {
            return kind.outcome();
        }
        match err {
            FantasyError::Authentication(msg) => {
                TransactionOutcome::Fatal(format!("session is not authenticated: {}", msg))
            }
            FantasyError::Configuration(msg) => {
                TransactionOutcome::Fatal(format!("configuration: {}", msg))
            }
            _ => TransactionOutcome::TransientUnknown,
        }
    }

    /// First signal found in `text`, in table order
    pub fn match_signal(text: &str) -> Option<SignalKind> {
        let text = text.to_lowercase();
        SIGNALS
            .iter()
            .find(|(pattern, _)| text.contains(pattern))
            .map(|(_, kind)| *kind)
    }
}
