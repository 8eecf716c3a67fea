//! Postgres store: every entity lives in one JSONB `records` table.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{Document, Store, StoreError};

pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the migrations embedded from ./migrations/
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Debug, FromRow)]
struct RecordRow {
    kind: String,
    id: Uuid,
    version: i64,
    unique_key: Option<String>,
    body: Value,
}

impl From<RecordRow> for Document {
    fn from(r: RecordRow) -> Self {
        Self {
            kind: r.kind,
            id: r.id,
            version: r.version,
            unique_key: r.unique_key,
            body: r.body,
        }
    }
}

const RECORD_COLS: &str = "kind, id, version, unique_key, body";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                StoreError::Conflict
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Decode(e.to_string())
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get(&self, kind: &str, id: Uuid) -> Result<Document, StoreError> {
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {RECORD_COLS} FROM records WHERE kind = $1 AND id = $2"
        ))
        .bind(kind)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Document::from).ok_or(StoreError::NotFound)
    }

    async fn find(&self, kind: &str, filter: &Value) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT {RECORD_COLS} FROM records
             WHERE kind = $1 AND body @> $2
             ORDER BY created_at, id"
        ))
        .bind(kind)
        .bind(filter)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn insert(&self, doc: Document) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO records (kind, id, version, unique_key, body)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&doc.kind)
        .bind(doc.id)
        .bind(doc.version)
        .bind(&doc.unique_key)
        .bind(&doc.body)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(
        &self,
        kind: &str,
        id: Uuid,
        expected_version: i64,
        body: Value,
    ) -> Result<(), StoreError> {
        let res = sqlx::query(
            "UPDATE records
             SET body = $4, version = version + 1, updated_at = NOW()
             WHERE kind = $1 AND id = $2 AND version = $3",
        )
        .bind(kind)
        .bind(id)
        .bind(expected_version)
        .bind(&body)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 1 {
            return Ok(());
        }

        // Nothing matched: either the row is gone or someone else moved the version.
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM records WHERE kind = $1 AND id = $2)",
        )
        .bind(kind)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Err(if exists { StoreError::Conflict } else { StoreError::NotFound })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
