//! Statements built from the SeaORM entities
//!
//! Each function renders a [`SqlQuery`] for the given backend so the caller
//! can run it through any `SqlDataSource`, including the instrumented one.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DbBackend, EntityTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Select,
};

use super::entities::{map_tier, user, MapTier, User};
use crate::domain::{MapTierInfo, PlayerInfo};
use crate::shared::{SqlQuery, Window};

/// `SELECT COUNT(*) AS count` over the rows `select` matches.
fn count_of<E: EntityTrait>(select: Select<E>, backend: DbBackend) -> SqlQuery {
    select
        .select_only()
        .column_as(Expr::cust("COUNT(*)"), "count")
        .build(backend)
        .into()
}

/// Easiest tier first, then by name.
pub fn map_tiers_page(backend: DbBackend, window: Window) -> SqlQuery {
    MapTier::find()
        .order_by_asc(map_tier::Column::Tier)
        .order_by_asc(map_tier::Column::Map)
        .limit(window.take)
        .offset(window.skip)
        .build(backend)
        .into()
}

pub fn map_tiers_count(backend: DbBackend) -> SqlQuery {
    count_of(MapTier::find(), backend)
}

pub fn map_tier_by_name(backend: DbBackend, map: &str) -> SqlQuery {
    MapTier::find_by_id(map.to_string()).build(backend).into()
}

/// Most points first; ties by account id.
pub fn users_page(backend: DbBackend, window: Window) -> SqlQuery {
    User::find()
        .order_by_desc(user::Column::Points)
        .order_by_asc(user::Column::Auth)
        .limit(window.take)
        .offset(window.skip)
        .build(backend)
        .into()
}

pub fn users_count(backend: DbBackend) -> SqlQuery {
    count_of(User::find(), backend)
}

pub fn user_by_auth(backend: DbBackend, auth: i32) -> SqlQuery {
    User::find_by_id(auth).build(backend).into()
}

/// Users with strictly more points.
pub fn users_ahead_of(backend: DbBackend, points: f64) -> SqlQuery {
    count_of(User::find().filter(user::Column::Points.gt(points)), backend)
}

impl From<map_tier::Model> for MapTierInfo {
    fn from(m: map_tier::Model) -> Self {
        Self {
            map: m.map,
            tier: m.tier,
            maxvelocity: m.maxvelocity,
            autobhop_enabled: m.autobhop_enabled,
            map_type: m.map_type,
        }
    }
}

impl From<user::Model> for PlayerInfo {
    fn from(m: user::Model) -> Self {
        Self {
            auth: m.auth,
            name: m.name,
            firstlogin: m.firstlogin,
            lastlogin: m.lastlogin,
            points: m.points,
            playtime: m.playtime,
        }
    }
}
