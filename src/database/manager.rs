use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use super::store::StoreError;
use crate::config::StoreConfig;

/// Creates the shared connection pool and the document table
pub struct DatabaseManager;

impl DatabaseManager {
    const SCHEMA: &'static [&'static str] = &[
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id UUID NOT NULL,
            data JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (collection, id)
        )
        "#,
        "CREATE INDEX IF NOT EXISTS documents_collection_created_at_idx ON documents (collection, created_at DESC)",
    ];

    /// Connect once at startup and make sure the schema exists
    pub async fn connect(url: &str, config: &StoreConfig) -> Result<PgPool, StoreError> {
        info!("Connecting to document store at {}", Self::mask_url(url));

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.timeout_ms))
            .connect(url)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        Self::ensure_schema(&pool).await?;
        info!("Document store connected ({} max connections)", config.max_connections);
        Ok(pool)
    }

    async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
        for statement in Self::SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Connection string with any credentials replaced, safe for logs
    pub fn mask_url(raw: &str) -> String {
        match url::Url::parse(raw) {
            Ok(mut url) => {
                if !url.username().is_empty() {
                    let _ = url.set_username("***");
                }
                if url.password().is_some() {
                    let _ = url.set_password(Some("***"));
                }
                url.to_string()
            }
            Err(_) => "<unparseable connection string>".to_string(),
        }
    }
}
