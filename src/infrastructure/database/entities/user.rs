//! Game server user entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub auth: i32,

    pub name: Option<String>,

    /// Last known IPv4 address as an integer
    pub ip: Option<i64>,

    /// Unix epoch seconds
    pub firstlogin: Option<i64>,
    pub lastlogin: Option<i64>,

    pub points: f64,

    /// Seconds played
    pub playtime: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
