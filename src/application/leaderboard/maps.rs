//! Map tier listings

use crate::domain::{GameMode, MapTierInfo};
use crate::infrastructure::database::entities::map_tier;
use crate::infrastructure::database::queries;
use crate::shared::{
    fetch_one, path_url_builder, AppResult, CountSql, DomainError, PageRequest, PageResult,
    PagedSql, Paginator, Window,
};

use super::service::{mode_source, ModeSources};

pub struct MapTiersService {
    sources: ModeSources,
    paginator: Paginator,
}

impl MapTiersService {
    pub fn new(sources: ModeSources, paginator: Paginator) -> Self {
        Self { sources, paginator }
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// Every tiered map, easiest first.
    pub async fn map_tiers(
        &self,
        mode: GameMode,
        request: PageRequest,
    ) -> AppResult<PageResult<MapTierInfo>> {
        let source = mode_source(&self.sources, mode)?;
        let request = request.capped(self.paginator.max_page_size());
        let backend = source.backend();

        let build_url = path_url_builder(
            format!("/api/v1/{}/maptiers", mode),
            request.page_size(),
            Vec::new(),
        );
        let page_sql = move |window: Window| queries::map_tiers_page(backend, window);

        let page: PageResult<map_tier::Model> = self
            .paginator
            .paginate_sql(
                source.as_ref(),
                PagedSql::Windowed(&page_sql),
                CountSql::Query(queries::map_tiers_count(backend)),
                request,
                Some(&build_url),
            )
            .await?;
        Ok(page.map(MapTierInfo::from))
    }

    pub async fn map_tier(&self, mode: GameMode, map: &str) -> AppResult<MapTierInfo> {
        let source = mode_source(&self.sources, mode)?;
        let row: Option<map_tier::Model> =
            fetch_one(source.as_ref(), queries::map_tier_by_name(source.backend(), map)).await?;

        row.map(MapTierInfo::from).ok_or_else(|| {
            DomainError::NotFound {
                entity: "MapTier",
                field: "map",
                value: map.to_string(),
            }
            .into()
        })
    }
}
