//! Withdrawal entity - A payout request and its manual processing state.
//!
//! Lifecycle: `requested` → `completed` | `rejected`; the terminal states are
//! immutable and rows are never deleted. Transitions are applied with a
//! conditional update on the current status so a second admin action fails
//! cleanly instead of overwriting the first.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Withdrawal database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "withdrawals")]
pub struct Model {
    /// Unique identifier for the withdrawal
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Requesting user's id
    pub user_id: i64,
    /// Requested payout amount
    pub amount: f64,
    /// UPI handle the payout goes to, snapshotted at request time
    pub upi: String,
    /// Lifecycle status: `"requested"`, `"completed"`, or `"rejected"`
    pub status: String,
    /// When the request was made
    pub requested_at: DateTimeUtc,
    /// When an admin completed or rejected the request
    pub processed_at: Option<DateTimeUtc>,
    /// Admin who processed the request
    pub processed_by: Option<i64>,
    /// Reason recorded on rejection
    pub rejection_reason: Option<String>,
}

/// Defines relationships between Withdrawal and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each withdrawal belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
