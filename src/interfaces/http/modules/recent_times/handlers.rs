//! Recent times and recent records handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::dto::RecentTimesQuery;
use crate::application::RecentTimesService;
use crate::domain::{GameMode, RecentTime};
use crate::interfaces::http::common::{ProblemDetails, ValidatedQuery};
use crate::shared::{AppResult, PageQuery, PageResult};

pub type RecentTimesState = Arc<RecentTimesService>;

#[utoipa::path(
    get,
    path = "/api/v1/{mode}/recent-times",
    tag = "Recent Times",
    params(
        ("mode" = GameMode, Path, description = "Game mode"),
        RecentTimesQuery
    ),
    responses(
        (status = 200, description = "Newest runs first", body = PageResult<RecentTime>),
        (status = 400, description = "Invalid query parameters", body = ProblemDetails),
        (status = 404, description = "Unknown game mode", body = ProblemDetails),
        (status = 500, description = "Database failure", body = ProblemDetails)
    )
)]
pub async fn list_recent_times(
    State(service): State<RecentTimesState>,
    Path(mode): Path<String>,
    ValidatedQuery(query): ValidatedQuery<RecentTimesQuery>,
) -> AppResult<Json<PageResult<RecentTime>>> {
    let mode: GameMode = mode.parse()?;
    let request = service.paginator().from_query(&query.page_query());

    let result = service
        .recent_times(mode, &query.filter(), request)
        .await?;
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/v1/{mode}/recent-records",
    tag = "Recent Times",
    params(
        ("mode" = GameMode, Path, description = "Game mode"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Newest runs across all maps", body = PageResult<RecentTime>),
        (status = 400, description = "Invalid query parameters", body = ProblemDetails),
        (status = 404, description = "Unknown game mode", body = ProblemDetails),
        (status = 500, description = "Database failure", body = ProblemDetails)
    )
)]
pub async fn list_recent_records(
    State(service): State<RecentTimesState>,
    Path(mode): Path<String>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> AppResult<Json<PageResult<RecentTime>>> {
    let mode: GameMode = mode.parse()?;
    let request = service.paginator().from_query(&query);

    let result = service.recent_records(mode, request).await?;
    Ok(Json(result))
}
