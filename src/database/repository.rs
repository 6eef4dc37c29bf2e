use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{postgres::PgArguments, types::Json, FromRow, PgPool, Postgres, Row};
use uuid::Uuid;

use super::document::Document;
use super::manager::DatabaseManager;
use super::query_builder::QueryBuilder;
use super::store::{DocumentStore, StoreResult, UpdateMode};
use crate::filter::{Filter, ListQuery, SqlParam};

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    data: Json<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        let fields = match row.data.0 {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Document::new(row.id, fields, row.created_at, row.updated_at)
    }
}

/// Document store backed by a PostgreSQL JSONB table
#[derive(Clone)]
pub struct Repository {
    pool: PgPool,
}

impl Repository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for Repository {
    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> StoreResult<Document> {
        let row = sqlx::query_as::<_, DocumentRow>(&QueryBuilder::insert())
            .bind(collection)
            .bind(Uuid::new_v4())
            .bind(Json(Value::Object(fields)))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn find(&self, collection: &str, query: &ListQuery) -> StoreResult<Vec<Document>> {
        let sql_result = QueryBuilder::new(collection).select(query);
        tracing::debug!("find: {}", sql_result.query);

        let mut q = sqlx::query_as::<_, DocumentRow>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let sql_result = QueryBuilder::new(collection).count(filter);

        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn get(&self, collection: &str, id: Uuid) -> StoreResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(&QueryBuilder::get())
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
        mode: UpdateMode,
    ) -> StoreResult<Option<Document>> {
        let sql = QueryBuilder::update(mode == UpdateMode::Merge);
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(collection)
            .bind(id)
            .bind(Json(Value::Object(fields)))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn delete(&self, collection: &str, id: Uuid) -> StoreResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(&QueryBuilder::delete())
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let sql_result = QueryBuilder::new(collection).delete_many(filter);

        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        DatabaseManager::health_check(&self.pool).await
    }
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    p: &'q SqlParam,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match p {
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::Uuid(u) => q.bind(*u),
        SqlParam::Json(v) => q.bind(Json(v)),
        SqlParam::Int(i) => q.bind(*i),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    p: &'q SqlParam,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match p {
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::Uuid(u) => q.bind(*u),
        SqlParam::Json(v) => q.bind(Json(v)),
        SqlParam::Int(i) => q.bind(*i),
    }
}
