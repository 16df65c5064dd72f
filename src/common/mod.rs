//! Shared errors, domain types and the platform capability trait

pub mod errors;
pub mod traits;
pub mod types;
