//! User listing and profile handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::application::PlayersService;
use crate::domain::{GameMode, PlayerCompletion, PlayerInfo, UserProfile};
use crate::interfaces::http::common::{ProblemDetails, ValidatedQuery};
use crate::shared::{AppResult, DomainError, PageQuery, PageResult};

pub type PlayersState = Arc<PlayersService>;

/// Mode first so an unknown mode is a 404 even with a malformed id.
fn parse_player_path(mode: &str, auth: &str) -> AppResult<(GameMode, i32)> {
    let mode: GameMode = mode.parse()?;
    let auth = auth.trim().parse::<i32>().map_err(|_| {
        DomainError::Validation(format!("'{}' is not a valid account id", auth))
    })?;
    Ok((mode, auth))
}

#[utoipa::path(
    get,
    path = "/api/v1/{mode}/users",
    tag = "Players",
    params(
        ("mode" = GameMode, Path, description = "Game mode"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Users by points, highest first", body = PageResult<PlayerInfo>),
        (status = 404, description = "Unknown game mode", body = ProblemDetails),
        (status = 500, description = "Database failure", body = ProblemDetails)
    )
)]
pub async fn list_users(
    State(service): State<PlayersState>,
    Path(mode): Path<String>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> AppResult<Json<PageResult<PlayerInfo>>> {
    let mode: GameMode = mode.parse()?;
    let request = service.paginator().from_query(&query);

    Ok(Json(service.users(mode, request).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/{mode}/users/{auth}",
    tag = "Players",
    params(
        ("mode" = GameMode, Path, description = "Game mode"),
        ("auth" = i32, Path, description = "Steam account id", example = 39732541)
    ),
    responses(
        (status = 200, description = "One user", body = PlayerInfo),
        (status = 400, description = "Malformed account id", body = ProblemDetails),
        (status = 404, description = "Unknown game mode or user", body = ProblemDetails),
        (status = 500, description = "Database failure", body = ProblemDetails)
    )
)]
pub async fn get_user(
    State(service): State<PlayersState>,
    Path((mode, auth)): Path<(String, String)>,
) -> AppResult<Json<PlayerInfo>> {
    let (mode, auth) = parse_player_path(&mode, &auth)?;
    Ok(Json(service.user(mode, auth).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/{mode}/user-profile/{user_id}",
    tag = "Players",
    params(
        ("mode" = GameMode, Path, description = "Game mode"),
        ("user_id" = i32, Path, description = "Steam account id", example = 39732541)
    ),
    responses(
        (status = 200, description = "Rank, records and completion of one player", body = UserProfile),
        (status = 400, description = "Malformed account id", body = ProblemDetails),
        (status = 404, description = "Unknown game mode or user", body = ProblemDetails),
        (status = 500, description = "Database failure", body = ProblemDetails)
    )
)]
pub async fn get_user_profile(
    State(service): State<PlayersState>,
    Path((mode, user_id)): Path<(String, String)>,
) -> AppResult<Json<UserProfile>> {
    let (mode, auth) = parse_player_path(&mode, &user_id)?;
    Ok(Json(service.profile(mode, auth).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/{mode}/user-profile/{user_id}/completions",
    tag = "Players",
    params(
        ("mode" = GameMode, Path, description = "Game mode"),
        ("user_id" = i32, Path, description = "Steam account id", example = 39732541),
        PageQuery
    ),
    responses(
        (status = 200, description = "Best run per map, track and style, newest first", body = PageResult<PlayerCompletion>),
        (status = 400, description = "Malformed account id", body = ProblemDetails),
        (status = 404, description = "Unknown game mode or user", body = ProblemDetails),
        (status = 500, description = "Database failure", body = ProblemDetails)
    )
)]
pub async fn list_user_completions(
    State(service): State<PlayersState>,
    Path((mode, user_id)): Path<(String, String)>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> AppResult<Json<PageResult<PlayerCompletion>>> {
    let (mode, auth) = parse_player_path(&mode, &user_id)?;
    let request = service.paginator().from_query(&query);

    Ok(Json(service.completions(mode, auth, request).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::AppError;

    #[test]
    fn player_path_checks_mode_before_id() {
        assert_eq!(parse_player_path("surf", " 42").unwrap(), (GameMode::Surf, 42));
        assert!(matches!(
            parse_player_path("kz", "abc"),
            Err(AppError::Domain(DomainError::NotFound { .. }))
        ));
        assert!(matches!(
            parse_player_path("surf", "abc"),
            Err(AppError::Domain(DomainError::Validation(_)))
        ));
    }
}
