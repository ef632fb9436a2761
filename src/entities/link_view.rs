//! Link view entity - Append-only record of deduplicated page views.
//!
//! At most one row exists per `(link_id, fingerprint)` pair, enforced by a
//! unique index created in [`crate::config::database`]. That constraint is
//! the system's idempotency key: a second view from the same visitor fails
//! the insert and is treated as a duplicate. Rows are never updated or
//! deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Link view database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "link_views")]
pub struct Model {
    /// Unique identifier for the view
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The link that was viewed
    pub link_id: i64,
    /// Coarse visitor identity: IP address plus user agent
    pub fingerprint: String,
    /// When the view was recorded
    pub viewed_at: DateTimeUtc,
}

/// Defines relationships between `LinkView` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each view belongs to one link
    #[sea_orm(
        belongs_to = "super::link::Entity",
        from = "Column::LinkId",
        to = "super::link::Column::Id"
    )]
    Link,
}

impl Related<super::link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Link.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
