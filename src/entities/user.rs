//! User entity - Account holders who own links and withdraw earnings.
//!
//! `referred_by` is set once at registration and immutable thereafter. The
//! denormalized set of users someone referred lives in the `referrals`
//! aggregate table keyed by `referrer_id`, not on this row. The `otp` column
//! holds the current short-lived one-time code for sensitive actions and is
//! cleared on use.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login email, unique across the platform
    #[sea_orm(unique)]
    pub email: String,
    /// Opaque password hash, produced and verified by the auth layer
    pub password_hash: String,
    /// Registered UPI payout handle, None until the user sets one
    pub upi: Option<String>,
    /// Current one-time code for sensitive actions, cleared on use
    pub otp: Option<String>,
    /// User id of the referrer, set once at registration
    pub referred_by: Option<i64>,
    /// Role: `"user"` or `"admin"`
    pub role: String,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user owns many links
    #[sea_orm(has_many = "super::link::Entity")]
    Links,
    /// One user owns many withdrawals
    #[sea_orm(has_many = "super::withdrawal::Entity")]
    Withdrawals,
}

impl Related<super::link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Links.def()
    }
}

impl Related<super::withdrawal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Withdrawals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
