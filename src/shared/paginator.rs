//! Offset paginator
//!
//! Turns a `(page, pageSize)` request plus a data source into a
//! [`PageResult`]: runs the data and count calls concurrently, computes
//! [`PageMeta`] and builds navigation [`PageLinks`].

use std::future::Future;

use sea_orm::{DbErr, FromQueryResult};
use serde::{Deserialize, Serialize};
use urlencoding::encode;

use crate::shared::sql::{fetch_all, fetch_count, SqlDataSource, SqlQuery, WhereClause};
use crate::shared::types::pagination::{
    PageLinks, PageMeta, PageQuery, PageRequest, PageResult, Window, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};

/// Largest offset a SQL backend accepts (a signed 64-bit integer).
pub const MAX_SQL_OFFSET: u64 = i64::MAX as u64;

/// Maps a page number to a URL.
pub type UrlBuilder = dyn Fn(u64) -> String + Send + Sync;

/// Which page the `last` link points at when the result set is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastPageLink {
    /// `last = url(0)`, i.e. `totalPages` verbatim.
    #[default]
    PageZero,
    /// `last = url(1)` when there are no pages.
    FirstPage,
}

/// Data query for [`Paginator::paginate_sql`].
pub enum PagedSql<'a> {
    /// A complete query; `LIMIT take OFFSET skip` is appended.
    Query(SqlQuery),
    /// A builder that applies the window itself.
    Windowed(&'a (dyn Fn(Window) -> SqlQuery + Send + Sync)),
}

impl PagedSql<'_> {
    fn render(&self, window: Window) -> SqlQuery {
        match self {
            PagedSql::Query(q) => q.clone().with_limit_offset(window.take, window.skip),
            PagedSql::Windowed(build) => build(window),
        }
    }
}

/// Count query for [`Paginator::paginate_sql`].
pub enum CountSql<'a> {
    Query(SqlQuery),
    Built(&'a (dyn Fn() -> SqlQuery + Send + Sync)),
}

impl CountSql<'_> {
    fn render(&self) -> SqlQuery {
        match self {
            CountSql::Query(q) => q.clone(),
            CountSql::Built(build) => build(),
        }
    }
}

/// Offset paginator with configurable limits.
#[derive(Debug, Clone)]
pub struct Paginator {
    default_page_size: u64,
    max_page_size: u64,
    last_page_link: LastPageLink,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            last_page_link: LastPageLink::default(),
        }
    }
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_page_size(mut self, max_page_size: u64) -> Self {
        self.max_page_size = max_page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_default_page_size(mut self, default_page_size: u64) -> Self {
        self.default_page_size = default_page_size.max(1);
        self
    }

    pub fn with_last_page_link(mut self, policy: LastPageLink) -> Self {
        self.last_page_link = policy;
        self
    }

    pub fn max_page_size(&self) -> u64 {
        self.max_page_size
    }

    /// Build a request from optional query values, falling back to the
    /// configured default page size.
    pub fn request(&self, page: Option<u64>, page_size: Option<u64>) -> PageRequest {
        PageRequest::new(
            page.unwrap_or(1),
            page_size.unwrap_or(self.default_page_size),
        )
        .capped(self.max_page_size)
    }

    /// [`request`](Self::request) from raw query values.
    pub fn from_query(&self, query: &PageQuery) -> PageRequest {
        self.request(query.page_number(), query.page_size_value())
    }

    /// Paginate over an arbitrary async data source.
    ///
    /// `query_fn` and `count_fn` are polled concurrently; the first error is
    /// returned as-is. The caller keeps both calls filtered identically.
    pub async fn paginate<T, E, Q, QFut, C, CFut>(
        &self,
        query_fn: Q,
        count_fn: C,
        request: PageRequest,
        build_url: Option<&UrlBuilder>,
    ) -> Result<PageResult<T>, E>
    where
        Q: FnOnce(Window) -> QFut,
        QFut: Future<Output = Result<Vec<T>, E>>,
        C: FnOnce() -> CFut,
        CFut: Future<Output = Result<u64, E>>,
    {
        let request = request.capped(self.max_page_size);
        let window = request.window();

        let (data, total) = tokio::try_join!(query_fn(window), count_fn())?;

        let meta = PageMeta::new(total, request.page(), request.page_size());
        let links = self.links(&meta, build_url);

        Ok(PageResult { data, meta, links })
    }

    /// Paginate a raw SQL query. Rows are decoded with `FromQueryResult`.
    ///
    /// Windows starting past [`MAX_SQL_OFFSET`] cannot hold rows; the data
    /// query is skipped for them and only the count runs.
    pub async fn paginate_sql<T, S>(
        &self,
        source: &S,
        base: PagedSql<'_>,
        count: CountSql<'_>,
        request: PageRequest,
        build_url: Option<&UrlBuilder>,
    ) -> Result<PageResult<T>, DbErr>
    where
        T: FromQueryResult,
        S: SqlDataSource + ?Sized,
    {
        self.paginate(
            |window| async move {
                if window.skip > MAX_SQL_OFFSET {
                    return Ok(Vec::new());
                }
                fetch_all(source, base.render(window)).await
            },
            || async move { fetch_count(source, count.render()).await },
            request,
            build_url,
        )
        .await
    }

    /// Like [`paginate_sql`](Self::paginate_sql) with the count query derived
    /// as `SELECT COUNT(*) AS count FROM <table_expression> <where>`.
    ///
    /// `base` must already contain `where_clause`; its parameters are reused
    /// for the count.
    pub async fn paginate_sql_auto_count<T, S>(
        &self,
        source: &S,
        base: SqlQuery,
        table_expression: &str,
        where_clause: &WhereClause,
        request: PageRequest,
        build_url: Option<&UrlBuilder>,
    ) -> Result<PageResult<T>, DbErr>
    where
        T: FromQueryResult,
        S: SqlDataSource + ?Sized,
    {
        let count = count_query(table_expression, where_clause);
        self.paginate_sql(
            source,
            PagedSql::Query(base),
            CountSql::Query(count),
            request,
            build_url,
        )
        .await
    }

    fn links(&self, meta: &PageMeta, build_url: Option<&UrlBuilder>) -> PageLinks {
        let page_size = meta.page_size;
        let default_builder = move |p: u64| format!("?page={}&pageSize={}", p, page_size);
        let url_for = |p: u64| match build_url {
            Some(build) => build(p),
            None => default_builder(p),
        };

        let last_page = match (meta.total_pages, self.last_page_link) {
            (0, LastPageLink::FirstPage) => 1,
            (n, _) => n,
        };

        PageLinks {
            self_link: url_for(meta.page),
            first: url_for(1),
            prev: meta.has_previous_page.then(|| url_for(meta.page - 1)),
            next: meta.has_next_page.then(|| url_for(meta.page + 1)),
            last: url_for(last_page),
        }
    }
}

/// `SELECT COUNT(*) AS count FROM <table> <where>`
pub fn count_query(table_expression: &str, where_clause: &WhereClause) -> SqlQuery {
    let filter = where_clause.build();
    let sql = if filter.sql.is_empty() {
        format!("SELECT COUNT(*) AS count FROM {}", table_expression)
    } else {
        format!("SELECT COUNT(*) AS count FROM {} {}", table_expression, filter.sql)
    };
    SqlQuery::new(sql, filter.params)
}

/// Builds `<path>?page=P&pageSize=S[&k=v...]`, keeping filter parameters
/// on every link.
pub fn path_url_builder(
    path: impl Into<String>,
    page_size: u64,
    extra: Vec<(String, String)>,
) -> impl Fn(u64) -> String + Send + Sync {
    let path = path.into();
    let suffix: String = extra
        .iter()
        .map(|(k, v)| format!("&{}={}", encode(k), encode(v)))
        .collect();
    move |page| format!("{}?page={}&pageSize={}{}", path, page, page_size, suffix)
}
