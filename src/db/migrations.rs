//! Catalog opening and schema versioning.

use crate::error::DatabaseError;
use crate::{Error, Result};
use sqlx::SqliteConnection;
use sqlx::sqlite::SqlitePool;
use std::path::Path;

use super::Database;

impl Database {
    /// Open (or create) the catalog at `path`
    ///
    /// A missing file is created and brought to the current schema. Opening an
    /// up-to-date catalog changes nothing on disk.
    pub async fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "cannot create catalog directory: {}",
                    e
                )))
            })?;
        }

        use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "invalid catalog path: {}",
                    e
                )))
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options).await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "cannot open catalog: {}",
                e
            )))
        })?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Bring the schema up to the latest version
    async fn run_migrations(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "no catalog connection available: {}",
                e
            )))
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "cannot create schema_version: {}",
                e
            )))
        })?;

        let current_version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "cannot read schema version: {}",
                        e
                    )))
                })?
                .flatten();

        if current_version.unwrap_or(0) < 1 {
            Self::migrate_v1(&mut conn).await?;
        }

        Ok(())
    }

    /// Migration v1: videos and channel_profiles
    async fn migrate_v1(conn: &mut SqliteConnection) -> Result<()> {
        tracing::info!(version = 1, "Migrating catalog schema");

        sqlx::query("BEGIN")
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::MigrationFailed(format!(
                    "cannot start schema transaction: {}",
                    e
                )))
            })?;

        let result = async {
            Self::create_videos_table(conn).await?;
            Self::create_channel_profiles_table(conn).await?;
            Self::ensure_column(conn, "videos", "created_at", "INTEGER NOT NULL DEFAULT 0").await?;
            Self::ensure_column(conn, "channel_profiles", "updated_at", "INTEGER NOT NULL DEFAULT 0")
                .await?;
            Self::record_migration(conn, 1).await?;
            Ok::<(), Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                sqlx::query("COMMIT")
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| {
                        Error::Database(DatabaseError::MigrationFailed(format!(
                            "cannot commit schema v1: {}",
                            e
                        )))
                    })?;
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                return Err(e);
            }
        }

        tracing::info!(version = 1, "Catalog schema migrated");
        Ok(())
    }

    /// Create the videos table
    ///
    /// `IF NOT EXISTS` lets a catalog created before versioning was introduced
    /// be adopted as-is.
    async fn create_videos_table(conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS videos (
                video_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                channel_name TEXT NOT NULL,
                channel_handle TEXT,
                filename TEXT NOT NULL,
                created_at INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "Failed to create videos table: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Create the channel_profiles table
    async fn create_channel_profiles_table(conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS channel_profiles (
                channel_handle TEXT PRIMARY KEY,
                image_filename TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "Failed to create channel_profiles table: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Add a column to an adopted table that predates it
    async fn ensure_column(
        conn: &mut SqliteConnection,
        table: &str,
        column: &str,
        declaration: &str,
    ) -> Result<()> {
        let columns: Vec<String> =
            sqlx::query_scalar(&format!("SELECT name FROM pragma_table_info('{}')", table))
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::MigrationFailed(format!(
                        "Failed to inspect {} table: {}",
                        table, e
                    )))
                })?;

        if columns.iter().any(|c| c == column) {
            return Ok(());
        }

        tracing::info!(table, column, "Adding missing column to existing table");
        sqlx::query(&format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            table, column, declaration
        ))
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "Failed to add {}.{}: {}",
                table, column, e
            )))
        })?;

        Ok(())
    }

    async fn record_migration(conn: &mut SqliteConnection, version: i32) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?, ?)")
            .bind(version)
            .bind(now)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::MigrationFailed(format!(
                    "cannot record schema version: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// Close the catalog, waiting for open connections to finish
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// The underlying SQLite pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
