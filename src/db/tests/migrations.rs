use crate::db::*;
use tempfile::{NamedTempFile, TempDir};

#[tokio::test]
async fn test_database_creation() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let mut conn = db.pool.acquire().await.unwrap();
    let tables: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .fetch_all(&mut *conn)
            .await
            .unwrap();

    assert!(tables.contains(&"videos".to_string()));
    assert!(tables.contains(&"channel_profiles".to_string()));
    assert!(tables.contains(&"schema_version".to_string()));

    drop(conn);
    db.close().await;
}

#[tokio::test]
async fn test_reopen_is_idempotent() {
    let temp_file = NamedTempFile::new().unwrap();

    let db = Database::new(temp_file.path()).await.unwrap();
    db.record_video(&super::new_video("abc")).await.unwrap();
    db.close().await;

    // Second open must neither fail nor re-run migrations
    let db = Database::new(temp_file.path()).await.unwrap();
    assert!(db.video_exists("abc").await.unwrap());

    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_version")
        .fetch_all(db.pool())
        .await
        .unwrap();
    assert_eq!(versions, vec![1]);

    db.close().await;
}

#[tokio::test]
async fn test_adopts_unversioned_catalog() {
    let temp_file = NamedTempFile::new().unwrap();

    // A catalog written before schema versioning: same tables, fewer columns
    {
        use sqlx::sqlite::SqliteConnectOptions;
        use std::str::FromStr;

        let options =
            SqliteConnectOptions::from_str(&format!("sqlite:{}", temp_file.path().display()))
                .unwrap()
                .create_if_missing(true);
        let pool = sqlx::SqlitePool::connect_with(options).await.unwrap();
        sqlx::query(
            "CREATE TABLE channel_profiles (channel_handle TEXT PRIMARY KEY, image_filename TEXT)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO channel_profiles (channel_handle, image_filename) VALUES ('@old', '@old.jpg')",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool.close().await;
    }

    let db = Database::new(temp_file.path()).await.unwrap();
    assert_eq!(
        db.get_channel_image("@old").await.unwrap(),
        Some("@old.jpg".to_string())
    );

    // Upserts work against the adopted table once updated_at has been added
    db.set_channel_image("@old", "@old.png").await.unwrap();
    assert_eq!(
        db.get_channel_image("@old").await.unwrap(),
        Some("@old.png".to_string())
    );
    db.close().await;
}

#[tokio::test]
async fn test_creates_missing_parent_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("catalog.db");

    let db = Database::new(&path).await.unwrap();
    assert!(path.exists());
    db.close().await;
}
