//! Fantasy Manager Library
//!
//! Timed roster transactions against a fantasy sports platform: preflight
//! checks, wall-clock scheduling, and a retrying executor that classifies
//! platform responses and compensates for unintended waiver claims.

pub mod cli;
pub mod common;
pub mod config;
pub mod controller;
pub mod engine;
pub mod yahoo;

// Re-export commonly used types
pub use common::errors::{FantasyError, Result};
pub use common::traits::PlatformClient;
pub use common::types::{
    Platform, PlayerId, RawResponse, Roster, TransactionKind, TransactionOutcome,
    TransactionRequest,
};
pub use config::types::AppConfig;
pub use controller::RosterController;
pub use engine::{
    ExecutionReport, ExecutionState, PreflightValidator, ResponseClassifier, RetryPolicy,
    RosterState, ScheduledMoment, Scheduler, TransactionExecutor,
};
pub use yahoo::client::YahooClient;
pub use yahoo::rest::YahooRestClient;
