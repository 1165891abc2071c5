//! Core error types for the rebalancer.
//!
//! Degenerate numeric inputs (empty pools, zero capital) are never errors; they
//! resolve to zero actions. Only input-shape problems and rejected user input
//! surface here.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the rebalancer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Snapshot could not be loaded: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Errors raised while fetching or parsing a portfolio snapshot.
///
/// Any of these aborts the load entirely; a snapshot is either accepted in full
/// or not at all.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The data provider could not be reached.
    #[error("Failed to fetch snapshot: {0}")]
    Fetch(String),

    /// The data provider answered with a non-success status.
    #[error("Snapshot provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The payload is not valid JSON or does not match the expected shape.
    #[error("Malformed snapshot: {0}")]
    Malformed(String),

    /// The payload has no `portfolios` array.
    #[error("Snapshot has no portfolios array")]
    MissingPortfolios,
}

/// Validation errors for user-supplied parameters.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Portfolio '{0}' does not exist in the snapshot")]
    UnknownPortfolio(String),

    #[error("Investment amount must not be negative, got {0}")]
    NegativeAmount(String),

    #[error("Duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Snapshot(SnapshotError::Malformed(err.to_string()))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Snapshot(SnapshotError::Fetch(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
