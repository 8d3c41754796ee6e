//! Recent times and recent records listings

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use sea_orm::FromQueryResult;
use tracing::{debug, warn};

use crate::domain::leaderboard::track_label;
use crate::domain::{
    GameMode, PlayerLookup, PlayerSummary, RecentTime, RecentTimesFilter, Style,
};
use crate::shared::{
    path_url_builder, AppResult, DomainError, PageRequest, PageResult, Paginator, SqlDataSource,
    SqlQuery, UrlBuilder, WhereClause,
};

const RECENT_TIMES_SELECT: &str = "SELECT \
        pt.id, pt.auth, pt.map, pt.time, pt.track, pt.points, pt.date, pt.style, \
        u.auth AS user_auth, u.ip AS user_ip, mt.map_type, mt.tier, \
        (SELECT MIN(pt2.time) FROM playertimes pt2 \
            WHERE pt2.map = pt.map AND pt2.track = pt.track AND pt2.id != pt.id) AS best_time \
    FROM playertimes pt \
    LEFT JOIN users u ON pt.auth = u.auth \
    LEFT JOIN maptiers mt ON pt.map = mt.map";

const ORDER_BY_NEWEST: &str = "ORDER BY pt.date DESC, pt.id DESC";

#[derive(Debug, FromQueryResult)]
struct RecentTimeRow {
    auth: i32,
    map: String,
    time: f64,
    track: i32,
    points: f64,
    date: i64,
    style: i32,
    user_auth: Option<i32>,
    user_ip: Option<i64>,
    map_type: Option<String>,
    tier: Option<i32>,
    best_time: Option<f64>,
}

/// Source of leaderboard rows per game mode.
pub type ModeSources = HashMap<GameMode, Arc<dyn SqlDataSource>>;

/// Data source for `mode`; unconfigured modes are not found.
pub(crate) fn mode_source(
    sources: &ModeSources,
    mode: GameMode,
) -> AppResult<&Arc<dyn SqlDataSource>> {
    sources.get(&mode).ok_or_else(|| {
        DomainError::NotFound {
            entity: "GameMode",
            field: "mode",
            value: mode.to_string(),
        }
        .into()
    })
}

pub struct RecentTimesService {
    sources: ModeSources,
    lookup: Arc<dyn PlayerLookup>,
    paginator: Paginator,
}

impl RecentTimesService {
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

    fn source(&self, mode: GameMode) -> AppResult<&Arc<dyn SqlDataSource>> {
        mode_source(&self.sources, mode)
    }

    /// Newest runs first, optionally filtered by map, style and track.
    pub async fn recent_times(
        &self,
        mode: GameMode,
        filter: &RecentTimesFilter,
        request: PageRequest,
    ) -> AppResult<PageResult<RecentTime>> {
        let source = self.source(mode)?;
        let request = request.capped(self.paginator.max_page_size());

        let where_clause = WhereClause::new(source.backend())
            .and_eq_opt("pt.map", filter.map.clone())
            .and_eq_opt("pt.style", filter.style)
            .and_eq_opt("pt.track", filter.track);

        let mut extra = Vec::new();
        if let Some(map) = &filter.map {
            extra.push(("map".to_string(), map.clone()));
        }
        if let Some(style) = filter.style {
            extra.push(("style".to_string(), style.to_string()));
        }
        if let Some(track) = filter.track {
            extra.push(("track".to_string(), track.to_string()));
        }
        let build_url = path_url_builder(
            format!("/api/v1/{}/recent-times", mode),
            request.page_size(),
            extra,
        );

        self.list(source.as_ref(), where_clause, request, &build_url)
            .await
    }

    /// Newest runs across every map, track and style, unfiltered.
    pub async fn recent_records(
        &self,
        mode: GameMode,
        request: PageRequest,
    ) -> AppResult<PageResult<RecentTime>> {
        let source = self.source(mode)?;
        let request = request.capped(self.paginator.max_page_size());

        let where_clause = WhereClause::new(source.backend());
        let build_url = path_url_builder(
            format!("/api/v1/{}/recent-records", mode),
            request.page_size(),
            Vec::new(),
        );

        self.list(source.as_ref(), where_clause, request, &build_url)
            .await
    }

    async fn list(
        &self,
        source: &dyn SqlDataSource,
        where_clause: WhereClause,
        request: PageRequest,
        build_url: &UrlBuilder,
    ) -> AppResult<PageResult<RecentTime>> {
        let filter = where_clause.build();
        let sql = if filter.sql.is_empty() {
            format!("{} {}", RECENT_TIMES_SELECT, ORDER_BY_NEWEST)
        } else {
            format!("{} {} {}", RECENT_TIMES_SELECT, filter.sql, ORDER_BY_NEWEST)
        };
        let base = SqlQuery::new(sql, filter.params);

        let page: PageResult<RecentTimeRow> = self
            .paginator
            .paginate_sql_auto_count(
                source,
                base,
                "playertimes pt",
                &where_clause,
                request,
                Some(build_url),
            )
            .await?;

        let skip = request.skip();
        let PageResult { data, meta, links } = page;
        let enriched = join_all(
            data.into_iter()
                .enumerate()
                .map(|(i, row)| self.enrich(row, skip.saturating_add(i as u64 + 1))),
        )
        .await;

        Ok(PageResult {
            data: enriched,
            meta,
            links,
        })
    }

    async fn enrich(&self, row: RecentTimeRow, rank: u64) -> RecentTime {
        let details = player_details(self.lookup.as_ref(), row.auth, row.user_ip).await;
        let summary = details.summary;

        RecentTime {
            date: row.date,
            map: row.map,
            map_type: row.map_type,
            player: row.user_auth.unwrap_or(row.auth).to_string(),
            player_nickname: summary.as_ref().map(|s| s.nickname.clone()),
            player_profile_url: summary.as_ref().map(|s| s.profile_url.clone()),
            player_avatar: summary.as_ref().map(|s| s.avatar.clone()),
            player_location_country: details.country,
            player_location_country_flag: details.flag,
            points: row.points,
            rank,
            run_time: row.time,
            run_time_difference: row.best_time.map(|best| row.time - best),
            style: Style::label(row.style).to_string(),
            tier: row.tier,
            track: track_label(row.track),
        }
    }
}

/// Enrichment for one player; failed lookups degrade to `None`.
pub(crate) struct PlayerDetails {
    pub summary: Option<PlayerSummary>,
    pub country: Option<String>,
    pub flag: Option<String>,
}

/// Steam profile and IP country for `auth`, looked up concurrently.
pub(crate) async fn player_details(
    lookup: &dyn PlayerLookup,
    auth: i32,
    ip: Option<i64>,
) -> PlayerDetails {
    let (summary, country) = tokio::join!(lookup.player_summary(auth as i64), async {
        match ip {
            Some(ip) => lookup.country_code(ip).await,
            None => Ok(None),
        }
    });

    let summary = summary.unwrap_or_else(|e| {
        warn!(auth, error = %e, "Player summary lookup failed");
        None
    });
    let country = country.unwrap_or_else(|e| {
        debug!(auth, error = %e, "Country lookup failed");
        None
    });
    let flag = country.as_deref().map(|cc| lookup.flag_url(cc));

    PlayerDetails {
        summary,
        country,
        flag,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

    use crate::infrastructure::database::entities::{map_tier, player_time, user};
    use crate::infrastructure::database::{init_database, run_migrations, DatabaseConfig};

    pub async fn seeded_db() -> DatabaseConnection {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&db).await.unwrap();

        // (auth, name, ip, points, lastlogin)
        let users = [
            (1, "alpha", Some(3_232_235_777i64), 250.5, 1_700_000_500),
            (2, "bravo", None, 400.0, 1_700_000_900),
        ];
        for (auth, name, ip, points, lastlogin) in users {
            user::ActiveModel {
                auth: Set(auth),
                name: Set(Some(name.to_string())),
                ip: Set(ip),
                firstlogin: Set(Some(1_600_000_000)),
                lastlogin: Set(Some(lastlogin)),
                points: Set(points),
                playtime: Set(3_600.0 * auth as f64),
            }
            .insert(&db)
            .await
            .unwrap();
        }

        // surf_kitsune has runs but no tier row
        let tiers = [
            ("surf_utopia", 1, Some("linear"), Some(3_500.0)),
            ("surf_mesa", 1, Some("staged"), None),
            ("surf_forsaken", 3, None, None),
        ];
        for (map, tier, map_type, maxvelocity) in tiers {
            map_tier::ActiveModel {
                map: Set(map.to_string()),
                tier: Set(tier),
                map_type: Set(map_type.map(str::to_string)),
                maxvelocity: Set(maxvelocity),
                autobhop_enabled: Set(Some(true)),
            }
            .insert(&db)
            .await
            .unwrap();
        }

        // (auth, map, time, track, date, style)
        let runs = [
            (1, "surf_utopia", 30.0, 0, 100, 0),
            (2, "surf_utopia", 28.5, 0, 200, 0),
            (1, "surf_utopia", 12.0, 1, 300, 0),
            (2, "surf_kitsune", 45.0, 0, 400, 1),
            (1, "surf_utopia", 27.0, 0, 500, 0),
        ];
        for (auth, map, time, track, date, style) in runs {
            player_time::ActiveModel {
                auth: Set(auth),
                map: Set(map.to_string()),
                time: Set(time),
                track: Set(track),
                points: Set(10.0),
                date: Set(date),
                style: Set(style),
                ..Default::default()
            }
            .insert(&db)
            .await
            .unwrap();
        }
        db
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::seeded_db;
    use super::*;
    use crate::domain::{NoPlayerLookup, PlayerSummary};
    use crate::shared::{AppError, InfraError};
    use async_trait::async_trait;

    struct FakeLookup;

    #[async_trait]
    impl PlayerLookup for FakeLookup {
        async fn player_summary(&self, account_id: i64) -> AppResult<Option<PlayerSummary>> {
            if account_id == 2 {
                return Err(AppError::Infra(InfraError::Serialization(
                    serde_json::from_str::<u8>("x").unwrap_err(),
                )));
            }
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

    async fn service(lookup: Arc<dyn PlayerLookup>) -> RecentTimesService {
        let db = seeded_db().await;
        let mut sources: ModeSources = HashMap::new();
        sources.insert(GameMode::Surf, Arc::new(db));
        RecentTimesService::new(sources, lookup, Paginator::new())
    }

    #[tokio::test]
    async fn lists_newest_first_with_ranks_and_links() {
        let svc = service(Arc::new(NoPlayerLookup)).await;
        let page = svc
            .recent_times(GameMode::Surf, &RecentTimesFilter::default(), PageRequest::new(2, 2))
            .await
            .unwrap();

        assert_eq!(page.meta.total, 5);
        assert_eq!(page.meta.total_pages, 3);
        let dates: Vec<i64> = page.data.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![300, 200]);
        let ranks: Vec<u64> = page.data.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![3, 4]);

        assert_eq!(page.data[0].track, "Bonus 1");
        assert_eq!(page.data[0].map_type.as_deref(), Some("linear"));
        assert_eq!(page.data[0].tier, Some(1));
        assert_eq!(
            page.links.next.as_deref(),
            Some("/api/v1/surf/recent-times?page=3&pageSize=2")
        );
    }

    #[tokio::test]
    async fn run_time_difference_against_best_other_time() {
        let svc = service(Arc::new(NoPlayerLookup)).await;
        let page = svc
            .recent_times(GameMode::Surf, &RecentTimesFilter::default(), PageRequest::new(1, 10))
            .await
            .unwrap();

        // date 500: 27.0 vs best other main-track time 28.5
        let newest = &page.data[0];
        assert_eq!(newest.date, 500);
        assert!((newest.run_time_difference.unwrap() + 1.5).abs() < 1e-9);

        // Only run on the bonus track has nothing to compare with
        let bonus = page.data.iter().find(|r| r.track == "Bonus 1").unwrap();
        assert_eq!(bonus.run_time_difference, None);

        let kitsune = page.data.iter().find(|r| r.map == "surf_kitsune").unwrap();
        assert_eq!(kitsune.style, "Sideways");
        assert_eq!(kitsune.map_type, None);
    }

    #[tokio::test]
    async fn filters_are_bound_and_kept_in_links() {
        let svc = service(Arc::new(NoPlayerLookup)).await;
        let filter = RecentTimesFilter {
            map: Some("surf_utopia".to_string()),
            style: Some(0),
            track: Some(0),
        };
        let page = svc
            .recent_times(GameMode::Surf, &filter, PageRequest::new(1, 2))
            .await
            .unwrap();

        assert_eq!(page.meta.total, 3);
        assert!(page.data.iter().all(|r| r.map == "surf_utopia" && r.track == "Main"));
        assert_eq!(
            page.links.self_link,
            "/api/v1/surf/recent-times?page=1&pageSize=2&map=surf_utopia&style=0&track=0"
        );

        let hostile = RecentTimesFilter {
            map: Some("x' OR '1'='1".to_string()),
            ..Default::default()
        };
        let page = svc
            .recent_times(GameMode::Surf, &hostile, PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.meta.total, 0);
        assert!(page.data.is_empty());
    }

    #[tokio::test]
    async fn recent_records_list_every_run_newest_first() {
        let svc = service(Arc::new(NoPlayerLookup)).await;
        let page = svc
            .recent_records(GameMode::Surf, PageRequest::new(1, 10))
            .await
            .unwrap();

        let dates: Vec<i64> = page.data.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![500, 400, 300, 200, 100]);
        assert_eq!(page.meta.total, 5);
        // Slower runs are listed too, with a positive difference to the best
        let slower = page.data.iter().find(|r| r.date == 100).unwrap();
        assert!((slower.run_time_difference.unwrap() - 3.0).abs() < 1e-9);
        assert_eq!(page.links.first, "/api/v1/surf/recent-records?page=1&pageSize=10");
    }

    #[tokio::test]
    async fn page_far_past_the_end_is_empty_not_an_error() {
        let svc = service(Arc::new(NoPlayerLookup)).await;
        let page = svc
            .recent_times(
                GameMode::Surf,
                &RecentTimesFilter::default(),
                PageRequest::new(u64::MAX / 10, 100),
            )
            .await
            .unwrap();

        assert!(page.data.is_empty());
        assert_eq!(page.meta.total, 5);
        assert!(!page.meta.has_next_page);
        assert!(page.meta.has_previous_page);
    }

    #[tokio::test]
    async fn enrichment_degrades_failed_lookups() {
        let svc = service(Arc::new(FakeLookup)).await;
        let page = svc
            .recent_times(GameMode::Surf, &RecentTimesFilter::default(), PageRequest::new(1, 10))
            .await
            .unwrap();

        let alpha = page.data.iter().find(|r| r.player == "1").unwrap();
        assert_eq!(alpha.player_nickname.as_deref(), Some("player1"));
        assert_eq!(alpha.player_location_country.as_deref(), Some("SE"));
        assert_eq!(
            alpha.player_location_country_flag.as_deref(),
            Some("https://flagsapi.com/SE/flat/64.png")
        );

        let bravo = page.data.iter().find(|r| r.player == "2").unwrap();
        assert_eq!(bravo.player_nickname, None);
        // No stored IP, no country lookup
        assert_eq!(bravo.player_location_country, None);
    }

    #[tokio::test]
    async fn unconfigured_mode_is_not_found() {
        let svc = service(Arc::new(NoPlayerLookup)).await;
        let err = svc
            .recent_records(GameMode::Bhop, PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::NotFound { .. })));
    }
}
