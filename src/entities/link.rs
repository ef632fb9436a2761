//! Link entity - A monetized short link owned by one user.
//!
//! `cpm` is a snapshot of the effective rate at creation time and never
//! changes afterwards, even if the admin retunes the global CPM table; this
//! keeps historical earnings reproducible. `status` is derived from
//! `expires_at` but persisted for query efficiency and flipped by the
//! periodic sweep.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Link database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "links")]
pub struct Model {
    /// Unique identifier for the link
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user's id
    pub user_id: i64,
    /// Short code used in the public URL, unique across the platform
    #[sea_orm(unique)]
    pub code: String,
    /// Destination URL the short link resolves to
    pub destination: String,
    /// Effective earnings rate per 1000 views, snapshotted at creation
    pub cpm: f64,
    /// Page count the rate was quoted for
    pub pages: i64,
    /// Running count of deduplicated views
    pub clicks: i64,
    /// Running earnings accrued by this link
    pub earnings: f64,
    /// Lifecycle status: `"active"` or `"expired"`
    pub status: String,
    /// When the link stops accruing, None for no expiry
    pub expires_at: Option<DateTimeUtc>,
    /// When the link was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Link and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each link belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One link has many recorded views
    #[sea_orm(has_many = "super::link_view::Entity")]
    LinkViews,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::link_view::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LinkViews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
