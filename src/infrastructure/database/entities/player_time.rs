//! Player time entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One finished run
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "playertimes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Steam account id (SteamID3 without the prefix)
    pub auth: i32,

    pub map: String,

    /// Run time in seconds
    pub time: f64,

    /// 0 = main, n = bonus n
    pub track: i32,

    pub points: f64,

    /// Unix epoch seconds
    pub date: i64,

    pub style: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::Auth",
        to = "super::user::Column::Auth"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::map_tier::Entity",
        from = "Column::Map",
        to = "super::map_tier::Column::Map"
    )]
    MapTier,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::map_tier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MapTier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
