//! Parameterized SQL fragments and the raw-query data source seam
//!
//! Raw SQL only ever travels as `SqlQuery { sql, params }`. Filter values are
//! bound through [`WhereClause`], never interpolated into the SQL text.

use async_trait::async_trait;
use sea_orm::{DbBackend, DbErr, FromQueryResult, QueryResult, Statement, Value};

/// A SQL string with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlQuery {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A query without bound parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// Append `LIMIT take OFFSET skip`. Both values are integers produced by
    /// the caller, so they are rendered inline.
    pub fn with_limit_offset(mut self, take: u64, skip: u64) -> Self {
        let trimmed = self.sql.trim_end().to_string();
        self.sql = format!("{} LIMIT {} OFFSET {}", trimmed, take, skip);
        self
    }
}

/// Statements built with SeaORM's query builder (`Entity::find()...build(backend)`).
impl From<Statement> for SqlQuery {
    fn from(stmt: Statement) -> Self {
        Self::new(stmt.sql, stmt.values.map(|v| v.0).unwrap_or_default())
    }
}

/// Builder for `WHERE a = ? AND b = ?` clauses with backend-correct placeholders.
#[derive(Debug, Clone)]
pub struct WhereClause {
    backend: DbBackend,
    predicates: Vec<String>,
    params: Vec<Value>,
}

impl WhereClause {
    pub fn new(backend: DbBackend) -> Self {
        Self {
            backend,
            predicates: Vec::new(),
            params: Vec::new(),
        }
    }

    fn next_placeholder(&self) -> String {
        match self.backend {
            DbBackend::Postgres => format!("${}", self.params.len() + 1),
            _ => "?".to_string(),
        }
    }

    /// `column = <bound value>`. `column` must be a trusted identifier.
    pub fn and_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        let placeholder = self.next_placeholder();
        self.predicates.push(format!("{} = {}", column, placeholder));
        self.params.push(value.into());
        self
    }

    /// Same as [`and_eq`](Self::and_eq), skipped when `value` is `None`.
    pub fn and_eq_opt<V: Into<Value>>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.and_eq(column, v),
            None => self,
        }
    }

    /// A static predicate without parameters (joins, correlated subqueries).
    pub fn and_raw(mut self, predicate: impl Into<String>) -> Self {
        self.predicates.push(predicate.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Render to `WHERE ...` (empty string when there are no predicates).
    pub fn build(&self) -> SqlQuery {
        if self.predicates.is_empty() {
            return SqlQuery::raw("");
        }
        SqlQuery::new(
            format!("WHERE {}", self.predicates.join(" AND ")),
            self.params.clone(),
        )
    }
}

/// Anything that can execute a raw parameterized query and hand back rows.
#[async_trait]
pub trait SqlDataSource: Send + Sync {
    fn backend(&self) -> DbBackend;

    async fn fetch_rows(&self, query: SqlQuery) -> Result<Vec<QueryResult>, DbErr>;
}

#[async_trait]
impl SqlDataSource for sea_orm::DatabaseConnection {
    fn backend(&self) -> DbBackend {
        sea_orm::ConnectionTrait::get_database_backend(self)
    }

    async fn fetch_rows(&self, query: SqlQuery) -> Result<Vec<QueryResult>, DbErr> {
        let backend = SqlDataSource::backend(self);
        let stmt = sea_orm::Statement::from_sql_and_values(backend, query.sql, query.params);
        sea_orm::ConnectionTrait::query_all(self, stmt).await
    }
}

/// Run `query` and decode every row.
pub async fn fetch_all<T, S>(source: &S, query: SqlQuery) -> Result<Vec<T>, DbErr>
where
    T: FromQueryResult,
    S: SqlDataSource + ?Sized,
{
    let rows = source.fetch_rows(query).await?;
    rows.iter().map(|row| T::from_query_result(row, "")).collect()
}

/// Run `query` and decode the first row, if any.
pub async fn fetch_one<T, S>(source: &S, query: SqlQuery) -> Result<Option<T>, DbErr>
where
    T: FromQueryResult,
    S: SqlDataSource + ?Sized,
{
    let rows = source.fetch_rows(query).await?;
    rows.first().map(|row| T::from_query_result(row, "")).transpose()
}

/// Run a `SELECT COUNT(*) AS count ...` query.
pub async fn fetch_count<S>(source: &S, query: SqlQuery) -> Result<u64, DbErr>
where
    S: SqlDataSource + ?Sized,
{
    let rows = source.fetch_rows(query).await?;
    Ok(read_count(&rows))
}

/// First row's `count` column; missing or negative counts read as 0.
fn read_count(rows: &[QueryResult]) -> u64 {
    rows.first()
        .and_then(|row| row.try_get::<i64>("", "count").ok())
        .map(|n| n.max(0) as u64)
        .unwrap_or(0)
}
