//! Referral earning entity - Append-only audit log of referral payouts.
//!
//! One row per qualifying link view: `amount` is the referrer's cut,
//! `base_amount` the per-view earning it was computed from. Rows are never
//! updated or deleted; the mutable `referrals` aggregate must always equal
//! the sum of matching rows here and can be rebuilt from them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Referral earning log database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referral_earnings")]
pub struct Model {
    /// Unique identifier for the log entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User receiving the referral cut
    pub referrer_id: i64,
    /// User whose view generated the earning
    pub referred_user_id: i64,
    /// Link the qualifying view landed on
    pub source_link_id: i64,
    /// The referrer's cut for this view
    pub amount: f64,
    /// The referred user's per-view earning the cut was computed from
    pub base_amount: f64,
    /// When the referral earning accrued
    pub earned_at: DateTimeUtc,
}

/// Referral earnings have no navigable relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
