//! Map tier handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::application::MapTiersService;
use crate::domain::{GameMode, MapTierInfo};
use crate::interfaces::http::common::{ProblemDetails, ValidatedQuery};
use crate::shared::{AppResult, PageQuery, PageResult};

pub type MapTiersState = Arc<MapTiersService>;

#[utoipa::path(
    get,
    path = "/api/v1/{mode}/maptiers",
    tag = "Maps",
    params(
        ("mode" = GameMode, Path, description = "Game mode"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Tiered maps, easiest first", body = PageResult<MapTierInfo>),
        (status = 404, description = "Unknown game mode", body = ProblemDetails),
        (status = 500, description = "Database failure", body = ProblemDetails)
    )
)]
pub async fn list_map_tiers(
    State(service): State<MapTiersState>,
    Path(mode): Path<String>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> AppResult<Json<PageResult<MapTierInfo>>> {
    let mode: GameMode = mode.parse()?;
    let request = service.paginator().from_query(&query);

    Ok(Json(service.map_tiers(mode, request).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/{mode}/maptiers/{map}",
    tag = "Maps",
    params(
        ("mode" = GameMode, Path, description = "Game mode"),
        ("map" = String, Path, description = "Map name", example = "surf_utopia")
    ),
    responses(
        (status = 200, description = "Tier and settings of one map", body = MapTierInfo),
        (status = 404, description = "Unknown game mode or map", body = ProblemDetails),
        (status = 500, description = "Database failure", body = ProblemDetails)
    )
)]
pub async fn get_map_tier(
    State(service): State<MapTiersState>,
    Path((mode, map)): Path<(String, String)>,
) -> AppResult<Json<MapTierInfo>> {
    let mode: GameMode = mode.parse()?;
    Ok(Json(service.map_tier(mode, &map).await?))
}
