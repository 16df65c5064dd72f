//! Error types for the application

use thiserror::Error;

use super::types::{PlayerId, TransactionOutcome};

/// Result type alias using our FantasyError
pub type Result<T> = std::result::Result<T, FantasyError>;

/// Exit code for a successful run
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for hard or unexpected errors
pub const EXIT_ERROR: i32 = 1;
/// Exit code for business-rule rejections and user aborts
pub const EXIT_NOT_PERMITTED: i32 = 2;

/// Main error type for roster operations
#[derive(Error, Debug)]
pub enum FantasyError {
    /// Bad command-line or date input
    #[error("Invalid input: {0}")]
    Input(String),

    /// Session expired or belongs to the wrong team
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The player to add is already on the roster
    #[error("Player \"{0}\" is already on the roster")]
    AlreadyRostered(PlayerId),

    /// The player to drop is not on the roster
    #[error("Player \"{0}\" is not on the roster")]
    NotOnRoster(PlayerId),

    /// League rules rejected the transaction
    #[error("Transaction rejected ({outcome}): {message}")]
    Rejected {
        outcome: TransactionOutcome,
        message: String,
    },

    /// Transient failures did not clear within the retry bounds
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// Waiver claims kept reappearing after cancellation
    #[error("Waiver claim for player \"{player}\" persisted after {attempts} cancellations")]
    CompensationExhausted { player: PlayerId, attempts: u32 },

    /// The operator declined to proceed
    #[error("Aborting per user input")]
    UserAbort,

    /// Unrecoverable transaction failure
    #[error("Transaction failed: {0}")]
    Fatal(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FantasyError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            FantasyError::AlreadyRostered(_)
            | FantasyError::NotOnRoster(_)
            | FantasyError::Rejected { .. }
            | FantasyError::UserAbort => EXIT_NOT_PERMITTED,
            _ => EXIT_ERROR,
        }
    }

    /// Network-level failure that may clear on its own
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FantasyError::HttpRequest(_)
                | FantasyError::InvalidResponse(_)
                | FantasyError::Timeout(_)
                | FantasyError::JsonParse(_)
        )
    }

    /// Failure caused by league rules or the operator, not by the system
    pub fn is_not_permitted(&self) -> bool {
        self.exit_code() == EXIT_NOT_PERMITTED
    }
}
