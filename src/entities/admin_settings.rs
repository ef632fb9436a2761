//! Admin settings entity - Singleton row of platform-wide tunables.
//!
//! Mutated only by admins, read frequently by the core. Components receive
//! these values through the injected settings provider rather than a
//! process-wide singleton.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Admin settings database model - a single row
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_settings")]
pub struct Model {
    /// Unique identifier; exactly one row exists
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Percentage of a referred user's earnings paid to the referrer
    pub referral_percentage: f64,
    /// Public domain short links are served from
    pub domain: String,
    /// Smallest withdrawal amount accepted
    pub min_withdrawal: f64,
    /// Largest withdrawal amount accepted
    pub max_withdrawal: f64,
    /// When these settings were last modified
    pub updated_at: DateTimeUtc,
}

/// `AdminSettings` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
