//! Users, player profiles and per-course completions

use std::sync::Arc;

use sea_orm::{DbBackend, FromQueryResult};

use crate::domain::leaderboard::track_label;
use crate::domain::{
    percentage, GameMode, MapCompletionSummary, PlayerCompletion, PlayerInfo, PlayerLookup,
    Style, TierCompletion, UserProfile,
};
use crate::infrastructure::database::entities::user;
use crate::infrastructure::database::queries;
use crate::shared::{
    fetch_all, fetch_count, fetch_one, path_url_builder, AppResult, CountSql, DomainError,
    PageRequest, PageResult, PagedSql, Paginator, SqlDataSource, SqlQuery, Window, WhereClause,
};

use super::service::{mode_source, player_details, ModeSources};

/// Best time of the course, any player.
const COURSE_RECORD: &str = "(SELECT MIN(pt2.time) FROM playertimes pt2 \
    WHERE pt2.map = pt.map AND pt2.track = pt.track AND pt2.style = pt.style)";

#[derive(Debug, FromQueryResult)]
struct MostPlayedRow {
    map: String,
}

#[derive(Debug, FromQueryResult)]
struct TierRow {
    tier: i32,
    total_maps: i64,
    completed_maps: i64,
}

#[derive(Debug, FromQueryResult)]
struct CompletionRow {
    map: String,
    track: i32,
    style: i32,
    tier: Option<i32>,
    best_time: f64,
    runs: i64,
    last_completed: i64,
    record_time: Option<f64>,
}

impl From<CompletionRow> for PlayerCompletion {
    fn from(row: CompletionRow) -> Self {
        Self {
            is_record: row.record_time.map_or(true, |record| row.best_time <= record),
            map: row.map,
            track: track_label(row.track),
            style: Style::label(row.style).to_string(),
            tier: row.tier,
            best_time: row.best_time,
            runs: row.runs.max(0) as u64,
            last_completed: row.last_completed,
        }
    }
}

/// `WHERE pt.auth = <auth> AND <predicates...>`
fn runs_of(backend: DbBackend, auth: i32, predicates: &[&str]) -> SqlQuery {
    predicates
        .iter()
        .fold(WhereClause::new(backend).and_eq("pt.auth", auth), |clause, p| {
            clause.and_raw(*p)
        })
        .build()
}

fn played_maps(backend: DbBackend, auth: i32) -> SqlQuery {
    let filter = runs_of(backend, auth, &["pt.track = 0"]);
    SqlQuery::new(
        format!(
            "SELECT COUNT(DISTINCT pt.map) AS count FROM playertimes pt {}",
            filter.sql
        ),
        filter.params,
    )
}

fn played_bonuses(backend: DbBackend, auth: i32) -> SqlQuery {
    let filter = runs_of(backend, auth, &["pt.track > 0"]);
    SqlQuery::new(
        format!(
            "SELECT COUNT(*) AS count FROM \
                (SELECT DISTINCT pt.map, pt.track FROM playertimes pt {}) bonuses",
            filter.sql
        ),
        filter.params,
    )
}

fn all_bonuses() -> SqlQuery {
    SqlQuery::raw(
        "SELECT COUNT(*) AS count FROM \
            (SELECT DISTINCT pt.map, pt.track FROM playertimes pt WHERE pt.track > 0) bonuses",
    )
}

/// Courses on which the player's best time is the course record.
fn records(backend: DbBackend, auth: i32, track_predicate: &str) -> SqlQuery {
    let filter = runs_of(backend, auth, &[track_predicate]);
    SqlQuery::new(
        format!(
            "SELECT COUNT(*) AS count FROM \
                (SELECT pt.map FROM playertimes pt {} \
                 GROUP BY pt.map, pt.track, pt.style \
                 HAVING MIN(pt.time) <= {}) records",
            filter.sql, COURSE_RECORD
        ),
        filter.params,
    )
}

fn most_played_map(backend: DbBackend, auth: i32) -> SqlQuery {
    let filter = runs_of(backend, auth, &[]);
    SqlQuery::new(
        format!(
            "SELECT pt.map AS map FROM playertimes pt {} \
             GROUP BY pt.map ORDER BY COUNT(*) DESC, pt.map ASC LIMIT 1",
            filter.sql
        ),
        filter.params,
    )
}

/// Per tier: maps in the tier and how many of them the player finished.
fn tier_completion(backend: DbBackend, auth: i32) -> SqlQuery {
    let filter = runs_of(backend, auth, &["pt.map = mt.map", "pt.track = 0"]);
    SqlQuery::new(
        format!(
            "SELECT mt.tier AS tier, COUNT(*) AS total_maps, \
                SUM(CASE WHEN EXISTS (SELECT 1 FROM playertimes pt {}) THEN 1 ELSE 0 END) \
                    AS completed_maps \
             FROM maptiers mt GROUP BY mt.tier ORDER BY mt.tier",
            filter.sql
        ),
        filter.params,
    )
}

fn completions(backend: DbBackend, auth: i32) -> (SqlQuery, SqlQuery) {
    let filter = runs_of(backend, auth, &[]);
    let data = SqlQuery::new(
        format!(
            "SELECT pt.map AS map, pt.track AS track, pt.style AS style, mt.tier AS tier, \
                MIN(pt.time) AS best_time, COUNT(*) AS runs, MAX(pt.date) AS last_completed, \
                {} AS record_time \
             FROM playertimes pt LEFT JOIN maptiers mt ON pt.map = mt.map {} \
             GROUP BY pt.map, pt.track, pt.style, mt.tier \
             ORDER BY last_completed DESC, pt.map ASC, pt.track ASC, pt.style ASC",
            COURSE_RECORD, filter.sql
        ),
        filter.params.clone(),
    );
    let count = SqlQuery::new(
        format!(
            "SELECT COUNT(*) AS count FROM \
                (SELECT pt.map FROM playertimes pt {} \
                 GROUP BY pt.map, pt.track, pt.style) completions",
            filter.sql
        ),
        filter.params,
    );
    (data, count)
}

pub struct PlayersService {
    sources: ModeSources,
    lookup: Arc<dyn PlayerLookup>,
    paginator: Paginator,
}

impl PlayersService {
    pub fn new(sources: ModeSources, lookup: Arc<dyn PlayerLookup>, paginator: Paginator) -> Self {
        Self {
            sources,
            lookup,
            paginator,
        }
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    async fn find_user(&self, source: &dyn SqlDataSource, auth: i32) -> AppResult<user::Model> {
        let row: Option<user::Model> =
            fetch_one(source, queries::user_by_auth(source.backend(), auth)).await?;
        row.ok_or_else(|| {
            DomainError::NotFound {
                entity: "User",
                field: "auth",
                value: auth.to_string(),
            }
            .into()
        })
    }

    /// Users by points, highest first.
    pub async fn users(
        &self,
        mode: GameMode,
        request: PageRequest,
    ) -> AppResult<PageResult<PlayerInfo>> {
        let source = mode_source(&self.sources, mode)?;
        let request = request.capped(self.paginator.max_page_size());
        let backend = source.backend();

        let build_url = path_url_builder(
            format!("/api/v1/{}/users", mode),
            request.page_size(),
            Vec::new(),
        );
        let page_sql = move |window: Window| queries::users_page(backend, window);

        let page: PageResult<user::Model> = self
            .paginator
            .paginate_sql(
                source.as_ref(),
                PagedSql::Windowed(&page_sql),
                CountSql::Query(queries::users_count(backend)),
                request,
                Some(&build_url),
            )
            .await?;
        Ok(page.map(PlayerInfo::from))
    }

    pub async fn user(&self, mode: GameMode, auth: i32) -> AppResult<PlayerInfo> {
        let source = mode_source(&self.sources, mode)?;
        Ok(self.find_user(source.as_ref(), auth).await?.into())
    }

    /// Profile with rank, record counts and tier completion.
    pub async fn profile(&self, mode: GameMode, auth: i32) -> AppResult<UserProfile> {
        let source: &dyn SqlDataSource = mode_source(&self.sources, mode)?.as_ref();
        let backend = source.backend();
        let user = self.find_user(source, auth).await?;

        let (
            (ahead, played_maps, played_bonuses, all_bonuses, map_records, bonus_records),
            most_played,
            tiers,
        ) = tokio::try_join!(
            async {
                tokio::try_join!(
                    fetch_count(source, queries::users_ahead_of(backend, user.points)),
                    fetch_count(source, played_maps(backend, auth)),
                    fetch_count(source, played_bonuses(backend, auth)),
                    fetch_count(source, all_bonuses()),
                    fetch_count(source, records(backend, auth, "pt.track = 0")),
                    fetch_count(source, records(backend, auth, "pt.track > 0")),
                )
            },
            fetch_one::<MostPlayedRow, _>(source, most_played_map(backend, auth)),
            fetch_all::<TierRow, _>(source, tier_completion(backend, auth)),
        )?;

        let details = player_details(self.lookup.as_ref(), auth, user.ip).await;

        let completed_maps_tier: Vec<TierCompletion> = tiers
            .into_iter()
            .map(|t| {
                TierCompletion::new(
                    t.tier,
                    t.completed_maps.max(0) as u64,
                    t.total_maps.max(0) as u64,
                )
            })
            .collect();
        let completed: u64 = completed_maps_tier.iter().map(|t| t.completed_maps).sum();
        let tiered: u64 = completed_maps_tier.iter().map(|t| t.total_maps).sum();

        Ok(UserProfile {
            auth: user.auth,
            name: user.name,
            player_nickname: details.summary.as_ref().map(|s| s.nickname.clone()),
            player_profile_url: details.summary.as_ref().map(|s| s.profile_url.clone()),
            player_avatar: details.summary.as_ref().map(|s| s.avatar.clone()),
            server_rank: ahead + 1,
            location_country: details.country,
            location_flag: details.flag,
            total_points: user.points,
            total_playtime: user.playtime,
            first_seen: user.firstlogin,
            last_seen: user.lastlogin,
            world_records_map: map_records,
            world_records_bonus: bonus_records,
            total_played_maps: played_maps,
            total_played_maps_bonus: played_bonuses,
            map_completion: MapCompletionSummary {
                completed_maps_percentage: percentage(completed, tiered),
                completed_bonus_percentage: percentage(played_bonuses, all_bonuses),
                most_played_map: most_played.map(|m| m.map),
                completed_maps_tier,
            },
        })
    }

    /// The player's best run per map, track and style, newest finish first.
    pub async fn completions(
        &self,
        mode: GameMode,
        auth: i32,
        request: PageRequest,
    ) -> AppResult<PageResult<PlayerCompletion>> {
        let source: &dyn SqlDataSource = mode_source(&self.sources, mode)?.as_ref();
        let request = request.capped(self.paginator.max_page_size());
        self.find_user(source, auth).await?;

        let build_url = path_url_builder(
            format!("/api/v1/{}/user-profile/{}/completions", mode, auth),
            request.page_size(),
            Vec::new(),
        );
        let (data, count) = completions(source.backend(), auth);

        let page: PageResult<CompletionRow> = self
            .paginator
            .paginate_sql(
                source,
                PagedSql::Query(data),
                CountSql::Query(count),
                request,
                Some(&build_url),
            )
            .await?;
        Ok(page.map(PlayerCompletion::from))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::application::leaderboard::service::test_support::seeded_db;
    use crate::domain::{NoPlayerLookup, PlayerSummary};
    use crate::shared::AppError;

    struct KnownPlayers;

    #[async_trait]
    impl PlayerLookup for KnownPlayers {
        async fn player_summary(&self, account_id: i64) -> AppResult<Option<PlayerSummary>> {
            Ok(Some(PlayerSummary {
                nickname: format!("player{}", account_id),
                profile_url: "https://steamcommunity.com/id/p".to_string(),
                avatar: "https://avatars.example/p.jpg".to_string(),
                location_country: None,
            }))
        }

        async fn country_code(&self, _ip_long: i64) -> AppResult<Option<String>> {
            Ok(Some("SE".to_string()))
        }
    }

    async fn service(lookup: Arc<dyn PlayerLookup>) -> PlayersService {
        let mut sources: ModeSources = HashMap::new();
        sources.insert(GameMode::Surf, Arc::new(seeded_db().await));
        PlayersService::new(sources, lookup, Paginator::new())
    }

    #[tokio::test]
    async fn users_by_points_without_ip() {
        let svc = service(Arc::new(NoPlayerLookup)).await;
        let page = svc.users(GameMode::Surf, PageRequest::new(1, 10)).await.unwrap();

        assert_eq!(page.meta.total, 2);
        let auths: Vec<i32> = page.data.iter().map(|u| u.auth).collect();
        assert_eq!(auths, vec![2, 1]);
        assert_eq!(page.links.self_link, "/api/v1/surf/users?page=1&pageSize=10");

        let json = serde_json::to_value(&page.data[0]).unwrap();
        assert!(json.get("ip").is_none());
        assert_eq!(json["lastlogin"], 1_700_000_900);
    }

    #[tokio::test]
    async fn single_user_and_unknown_user() {
        let svc = service(Arc::new(NoPlayerLookup)).await;
        let alpha = svc.user(GameMode::Surf, 1).await.unwrap();
        assert_eq!(alpha.name.as_deref(), Some("alpha"));
        assert_eq!(alpha.points, 250.5);

        let err = svc.user(GameMode::Surf, 99).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::NotFound { entity: "User", .. })));
    }

    #[tokio::test]
    async fn profile_stats_come_from_the_tables() {
        let svc = service(Arc::new(KnownPlayers)).await;
        let profile = svc.profile(GameMode::Surf, 1).await.unwrap();

        // bravo has more points
        assert_eq!(profile.server_rank, 2);
        assert_eq!(profile.player_nickname.as_deref(), Some("player1"));
        assert_eq!(profile.location_country.as_deref(), Some("SE"));
        assert_eq!(
            profile.location_flag.as_deref(),
            Some("https://flagsapi.com/SE/flat/64.png")
        );
        assert_eq!(profile.total_playtime, 3_600.0);
        assert_eq!(profile.first_seen, Some(1_600_000_000));

        assert_eq!(profile.total_played_maps, 1);
        assert_eq!(profile.total_played_maps_bonus, 1);
        // 27.0 on utopia main and the only bonus run
        assert_eq!(profile.world_records_map, 1);
        assert_eq!(profile.world_records_bonus, 1);

        let completion = &profile.map_completion;
        assert_eq!(completion.most_played_map.as_deref(), Some("surf_utopia"));
        assert_eq!(completion.completed_maps_percentage, 33);
        assert_eq!(completion.completed_bonus_percentage, 100);
        assert_eq!(
            completion.completed_maps_tier,
            vec![TierCompletion::new(1, 1, 2), TierCompletion::new(3, 0, 1)]
        );
    }

    #[tokio::test]
    async fn profile_of_slower_player() {
        let svc = service(Arc::new(NoPlayerLookup)).await;
        let profile = svc.profile(GameMode::Surf, 2).await.unwrap();

        assert_eq!(profile.server_rank, 1);
        assert_eq!(profile.total_played_maps, 2);
        // 28.5 on utopia is beaten, 45.0 sideways on kitsune is the record
        assert_eq!(profile.world_records_map, 1);
        assert_eq!(profile.world_records_bonus, 0);
        assert_eq!(profile.map_completion.completed_bonus_percentage, 0);
        // No stored IP, no country
        assert_eq!(profile.location_country, None);
        assert_eq!(profile.player_nickname, None);
    }

    #[tokio::test]
    async fn completions_are_paged_newest_first() {
        let svc = service(Arc::new(NoPlayerLookup)).await;
        let page = svc
            .completions(GameMode::Surf, 1, PageRequest::new(1, 1))
            .await
            .unwrap();

        assert_eq!(page.meta.total, 2);
        assert_eq!(page.meta.total_pages, 2);
        let main = &page.data[0];
        assert_eq!(main.map, "surf_utopia");
        assert_eq!(main.track, "Main");
        assert_eq!(main.style, "Normal");
        assert_eq!(main.best_time, 27.0);
        assert_eq!(main.runs, 2);
        assert_eq!(main.last_completed, 500);
        assert_eq!(main.tier, Some(1));
        assert!(main.is_record);
        assert_eq!(
            page.links.next.as_deref(),
            Some("/api/v1/surf/user-profile/1/completions?page=2&pageSize=1")
        );

        let next = svc
            .completions(GameMode::Surf, 1, PageRequest::new(2, 1))
            .await
            .unwrap();
        assert_eq!(next.data[0].track, "Bonus 1");

        let bravo = svc
            .completions(GameMode::Surf, 2, PageRequest::new(1, 10))
            .await
            .unwrap();
        let utopia = bravo.data.iter().find(|c| c.map == "surf_utopia").unwrap();
        assert!(!utopia.is_record);
        let kitsune = bravo.data.iter().find(|c| c.map == "surf_kitsune").unwrap();
        assert_eq!(kitsune.tier, None);
        assert_eq!(kitsune.style, "Sideways");
    }

    #[tokio::test]
    async fn unknown_user_has_no_profile() {
        let svc = service(Arc::new(NoPlayerLookup)).await;
        for err in [
            svc.profile(GameMode::Surf, 99).await.unwrap_err(),
            svc.completions(GameMode::Surf, 99, PageRequest::default())
                .await
                .unwrap_err(),
        ] {
            assert!(matches!(err, AppError::Domain(DomainError::NotFound { entity: "User", .. })));
        }
    }

    #[test]
    fn record_predicates_bind_the_player() {
        let q = records(DbBackend::Postgres, 7, "pt.track = 0");
        assert!(q.sql.contains("WHERE pt.auth = $1 AND pt.track = 0"));
        assert_eq!(q.params, vec![sea_orm::Value::from(7)]);
    }
}
