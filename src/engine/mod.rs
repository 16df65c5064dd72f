//! Transaction engine: roster view, preflight checks, scheduling,
//! response classification and the retrying executor

pub mod classifier;
pub mod executor;
pub mod preflight;
pub mod roster;
pub mod scheduler;

pub use classifier::{ResponseClassifier, SignalKind};
pub use executor::{ExecutionReport, ExecutionState, RetryPolicy, TransactionExecutor};
pub use preflight::PreflightValidator;
pub use roster::RosterState;
pub use scheduler::{parse_start, sleep_until, ScheduledMoment, Scheduler};
