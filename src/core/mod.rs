//! Core business logic - framework-agnostic ledger operations.
//!
//! Each submodule owns one subsystem; all of them are async free functions
//! over a SeaORM connection so they compose inside transactions and stay
//! independent of whatever transport sits on top.

/// Platform-wide rollups for the admin dashboard
pub mod admin;
/// Balance snapshot recomputation from raw event history
pub mod balance;
/// Link creation, lookups, and the expiry sweep
pub mod link;
/// Referral fan-out, aggregate upkeep, and drift repair
pub mod referral;
/// Admin-tunable settings provider
pub mod settings;
/// Registration and account field management
pub mod user;
/// Deduplicated view recording and earnings accrual
pub mod view;
/// Withdrawal request admission and admin transitions
pub mod withdrawal;
