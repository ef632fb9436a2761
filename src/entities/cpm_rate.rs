//! CPM rate entity - Admin-tunable earnings rates keyed by page count.
//!
//! The effective per-link rate is `cpm * multiplier`; links snapshot it at
//! creation so later retuning never rewrites history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// CPM rate database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cpm_rates")]
pub struct Model {
    /// Unique identifier for the rate row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Page count this tier applies to
    #[sea_orm(unique)]
    pub page_count: i64,
    /// Base earnings per 1000 views
    pub cpm: f64,
    /// Multiplier applied to the base rate for this tier
    pub multiplier: f64,
}

/// CPM rates have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
