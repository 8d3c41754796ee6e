//! Query DTOs for the leaderboard listings

use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::domain::RecentTimesFilter;
use crate::shared::{lenient_integer, PageQuery};

/// Query parameters of `GET /api/v1/{mode}/recent-times`
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RecentTimesQuery {
    /// Page number (starting at 1). Default: 1
    #[serde(default, deserialize_with = "lenient_integer")]
    pub page: Option<i64>,
    /// Items per page, clamped to 1..=100. Default: 10
    #[serde(default, deserialize_with = "lenient_integer")]
    pub page_size: Option<i64>,
    /// Exact map name, e.g. `surf_utopia`
    #[validate(length(min = 1, max = 255, message = "must be 1 to 255 characters"))]
    pub map: Option<String>,
    /// Style index (0 = Normal)
    #[validate(range(min = 0, message = "must not be negative"))]
    pub style: Option<i32>,
    /// Track index (0 = main, 1.. = bonus)
    #[validate(range(min = 0, message = "must not be negative"))]
    pub track: Option<i32>,
}

impl RecentTimesQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }

    pub fn filter(&self) -> RecentTimesFilter {
        RecentTimesFilter {
            map: self.map.clone(),
            style: self.style,
            track: self.track,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_query() {
        let uri: axum::http::Uri = "/x?page=2&pageSize=20&map=surf_utopia&style=1".parse().unwrap();
        let axum::extract::Query(q) = axum::extract::Query::<RecentTimesQuery>::try_from_uri(&uri).unwrap();
        assert!(q.validate().is_ok());
        assert_eq!(q.page_query().page_size, Some(20));
        let filter = q.filter();
        assert_eq!(filter.map.as_deref(), Some("surf_utopia"));
        assert_eq!(filter.style, Some(1));
        assert_eq!(filter.track, None);
    }

    #[test]
    fn paging_values_are_never_validation_errors() {
        let q = RecentTimesQuery {
            page: Some(0),
            page_size: Some(500),
            ..Default::default()
        };
        assert!(q.validate().is_ok());
        assert_eq!(q.page_query().page_number(), Some(0));
    }

    #[test]
    fn rejects_negative_style() {
        let q = RecentTimesQuery {
            style: Some(-1),
            ..Default::default()
        };
        assert!(q.validate().is_err());
    }
}
