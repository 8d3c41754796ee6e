//! Map tier entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "maptiers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub map: String,

    /// Difficulty tier (1 = easiest)
    pub tier: i32,

    /// e.g. "linear", "staged"
    pub map_type: Option<String>,

    /// Velocity cap in units per second
    pub maxvelocity: Option<f64>,

    pub autobhop_enabled: Option<bool>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
