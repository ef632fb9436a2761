//! Shared test utilities for `LinkLedger`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults, plus a pinned-rate
//! settings provider so tests never depend on seeded settings rows.

use crate::{
    core::{
        link,
        settings::{CpmQuote, SettingsProvider},
        user, withdrawal,
    },
    entities,
    errors::Result,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Admin id used by test fixtures that process withdrawals.
pub const TEST_ADMIN_ID: i64 = 1000;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Seeds default admin settings and a single CPM tier.
pub async fn seed_test_settings(db: &DatabaseConnection) -> Result<()> {
    crate::config::seed::seed_database(db, &crate::config::seed::SeedConfig::default()).await
}

/// Approximate float comparison for accrued amounts.
#[must_use]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// A [`SettingsProvider`] with pinned rates, independent of the database.
///
/// # Defaults
/// * `cpm`: 160.0 (one view earns 0.16)
/// * `multiplier`: 1.0
/// * `referral_percentage`: 5.0
/// * `min_withdrawal`: 0.01
/// * `max_withdrawal`: 5000.0
#[derive(Debug, Clone, Copy)]
pub struct StaticSettings {
    /// Base CPM quoted for every page count
    pub cpm: f64,
    /// Tier multiplier
    pub multiplier: f64,
    /// Referral percentage
    pub referral_percentage: f64,
    /// Minimum withdrawal amount
    pub min_withdrawal: f64,
    /// Maximum withdrawal amount
    pub max_withdrawal: f64,
}

impl Default for StaticSettings {
    fn default() -> Self {
        Self {
            cpm: 160.0,
            multiplier: 1.0,
            referral_percentage: 5.0,
            min_withdrawal: 0.01,
            max_withdrawal: 5000.0,
        }
    }
}

impl SettingsProvider for StaticSettings {
    async fn cpm_for_pages(&self, _page_count: i64) -> Result<CpmQuote> {
        Ok(CpmQuote {
            cpm: self.cpm,
            multiplier: self.multiplier,
        })
    }

    async fn referral_percentage(&self) -> Result<f64> {
        Ok(self.referral_percentage)
    }

    async fn withdrawal_limits(&self) -> Result<(f64, f64)> {
        Ok((self.min_withdrawal, self.max_withdrawal))
    }
}

/// Registers a test user; the email is derived from the name.
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::user::Model> {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    user::register_user(db, name.to_string(), email, "test-hash".to_string(), None).await
}

/// Registers a test user attributed to a referrer.
pub async fn create_referred_user(
    db: &DatabaseConnection,
    name: &str,
    referrer_id: i64,
) -> Result<entities::user::Model> {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    user::register_user(
        db,
        name.to_string(),
        email,
        "test-hash".to_string(),
        Some(referrer_id),
    )
    .await
}

/// Registers a test user ready to withdraw: UPI `"asha@upi"`, OTP `"424242"`.
pub async fn create_payout_user(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::user::Model> {
    let created = create_test_user(db, name).await?;
    user::set_user_upi(db, created.id, "asha@upi".to_string()).await?;
    user::set_user_otp(db, created.id, Some("424242".to_string())).await
}

/// Creates a test link with the default pinned rates (cpm 160).
pub async fn create_test_link(
    db: &DatabaseConnection,
    user_id: i64,
    code: &str,
) -> Result<entities::link::Model> {
    link::create_link(
        db,
        &StaticSettings::default(),
        user_id,
        code.to_string(),
        "https://example.com".to_string(),
        1,
        None,
    )
    .await
}

/// Inserts a `requested` withdrawal directly, bypassing the OTP/limit checks.
///
/// Balance and rollup tests use this to shape withdrawal history without
/// dragging in the full request workflow.
pub async fn request_test_withdrawal(
    db: &DatabaseConnection,
    user_id: i64,
    amount: f64,
) -> Result<entities::withdrawal::Model> {
    entities::withdrawal::ActiveModel {
        user_id: Set(user_id),
        amount: Set(amount),
        upi: Set("asha@upi".to_string()),
        status: Set(withdrawal::STATUS_REQUESTED.to_string()),
        requested_at: Set(chrono::Utc::now()),
        processed_at: Set(None),
        processed_by: Set(None),
        rejection_reason: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Completes a withdrawal as the test admin.
pub async fn complete_test_withdrawal(
    db: &DatabaseConnection,
    withdrawal_id: i64,
) -> Result<entities::withdrawal::Model> {
    withdrawal::complete_withdrawal(db, withdrawal_id, TEST_ADMIN_ID).await
}
