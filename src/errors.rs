//! Unified error types for the earnings ledger.
//!
//! Validation failures (bad amount, wrong OTP, UPI mismatch) and expected
//! consistency outcomes (insufficient balance, already-processed withdrawal)
//! are modeled as typed variants so callers can decide how to surface them.
//! Aggregate/log drift is an [`Error::Integrity`] and halts the computation
//! that detected it rather than returning a wrong number.

use thiserror::Error;

/// All error conditions the ledger can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or seed-data problem
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure (config file reads and similar)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Amount is zero, negative, or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The offending amount
        amount: f64,
    },

    /// No user with the given id
    #[error("User {id} not found")]
    UserNotFound {
        /// Requested user id
        id: i64,
    },

    /// Registration attempted with an email that is already taken
    #[error("Email already registered: {email}")]
    EmailTaken {
        /// The duplicate email address
        email: String,
    },

    /// Short code already in use by another link
    #[error("Short code already taken: {code}")]
    CodeTaken {
        /// The duplicate short code
        code: String,
    },

    /// Link missing, expired, or otherwise unable to accrue earnings
    #[error("Link {id} not found or no longer active")]
    LinkNotFound {
        /// Requested link id
        id: i64,
    },

    /// No withdrawal with the given id
    #[error("Withdrawal {id} not found")]
    WithdrawalNotFound {
        /// Requested withdrawal id
        id: i64,
    },

    /// Withdrawal is already in a terminal state
    #[error("Withdrawal {id} has already been processed")]
    AlreadyProcessed {
        /// The withdrawal id
        id: i64,
    },

    /// One-time code missing or does not match
    #[error("Invalid one-time code")]
    InvalidOtp,

    /// Supplied UPI handle differs from the registered one
    #[error("UPI handle does not match the registered handle")]
    UpiMismatch,

    /// Requested amount exceeds the withdrawable balance
    #[error("Insufficient balance: requested {requested:.2}, available {available:.2}")]
    InsufficientBalance {
        /// Amount the user asked for
        requested: f64,
        /// Amount actually withdrawable
        available: f64,
    },

    /// Requested amount is below the configured minimum withdrawal
    #[error("Amount {amount:.2} is below the minimum withdrawal of {minimum:.2}")]
    BelowMinimum {
        /// Amount the user asked for
        amount: f64,
        /// Configured minimum
        minimum: f64,
    },

    /// Requested amount is above the configured maximum withdrawal
    #[error("Amount {amount:.2} is above the maximum withdrawal of {maximum:.2}")]
    AboveMaximum {
        /// Amount the user asked for
        amount: f64,
        /// Configured maximum
        maximum: f64,
    },

    /// Stored aggregate diverged from the append-only log it summarizes
    #[error("Integrity violation: {message}")]
    Integrity {
        /// Description of the detected drift
        message: String,
    },
}

// Convenience `Result` type
/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;
