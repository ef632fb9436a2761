//! Referral aggregate entity - Denormalized running sums per referral pair.
//!
//! One row per `(referrer_id, referred_user_id)` pair (unique index created
//! in [`crate::config::database`]), upserted on every fan-out. Doubles as the
//! referrer's referred-users set: registration inserts a zero-amount row.
//! Must always equal the sums of matching `referral_earnings` rows; drift is
//! repairable from the log.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Referral aggregate database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
    /// Unique identifier for the aggregate row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User receiving referral cuts
    pub referrer_id: i64,
    /// User they referred
    pub referred_user_id: i64,
    /// Running sum of the referrer's cuts for this pair
    pub earnings_amount: f64,
    /// Running sum of the referred user's own earnings that generated cuts
    pub total_referred_earnings: f64,
}

/// Referral aggregates have no navigable relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
