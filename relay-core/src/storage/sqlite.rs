use super::{PublishRecord, RecordStore};
use crate::error::{RelayError, Result};
use crate::migrations::{register_migrations, MigrationRunner};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

pub struct SqliteRecordStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: i64,
    email: String,
    task: String,
    round: i64,
    nonce: Option<String>,
    repo_full: String,
    repo_url: String,
    commit_sha: String,
    pages_url: Option<String>,
    created_at: i64,
}

impl TryFrom<RecordRow> for PublishRecord {
    type Error = RelayError;

    fn try_from(row: RecordRow) -> Result<Self> {
        let created_at = Utc
            .timestamp_opt(row.created_at, 0)
            .single()
            .ok_or_else(|| RelayError::Unknown(format!("corrupt created_at for record {}", row.id)))?;
        let round = u8::try_from(row.round)
            .map_err(|_| RelayError::Unknown(format!("corrupt round for record {}", row.id)))?;

        Ok(PublishRecord {
            id: Some(row.id),
            email: row.email,
            task: row.task,
            round,
            nonce: row.nonce,
            repo_full: row.repo_full,
            repo_url: row.repo_url,
            commit_sha: row.commit_sha,
            pages_url: row.pages_url,
            created_at,
        })
    }
}

impl SqliteRecordStore {
    /// Opens (creating if needed) the database at `db_path` and brings its schema up to date.
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(db_path)
                    .create_if_missing(true),
            )
            .await?;

        Self::with_pool(pool).await
    }

    /// Private in-memory database. A single connection keeps every query on the same database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
            .await?;

        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let mut runner = MigrationRunner::new(pool.clone());
        register_migrations(&mut runner);
        runner.migrate_up(None).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: &PublishRecord) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO publish_records
            (email, task, round, nonce, repo_full, repo_url, commit_sha, pages_url, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&record.email)
        .bind(&record.task)
        .bind(record.round as i64)
        .bind(&record.nonce)
        .bind(&record.repo_full)
        .bind(&record.repo_url)
        .bind(&record.commit_sha)
        .bind(&record.pages_url)
        .bind(record.created_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn find_latest(&self, email: &str, task: &str) -> Result<Option<PublishRecord>> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT id, email, task, round, nonce, repo_full, repo_url, commit_sha, pages_url, created_at
            FROM publish_records
            WHERE email = ?1 AND task = ?2
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(task)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PublishRecord::try_from).transpose()
    }
}
