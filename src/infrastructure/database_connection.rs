// Database connection and pool management
// SQLite via sqlx; the schema is created idempotently on startup.

use std::path::Path;

use anyhow::Result;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str) -> Result<Self> {
        let db_path = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");

        if let Some(parent) = Path::new(db_path).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if !Path::new(db_path).exists() {
            std::fs::File::create(db_path)?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        let create_games_sql = r#"
            CREATE TABLE IF NOT EXISTS games (
                external_id INTEGER PRIMARY KEY,
                primary_name TEXT NOT NULL,
                localized_name TEXT,
                image_url TEXT,
                player_count_min INTEGER,
                player_count_max INTEGER,
                players_best TEXT,
                players_recommended TEXT,
                play_time_min INTEGER,
                play_time_max INTEGER,
                minimum_age INTEGER,
                complexity_weight REAL,
                community_rating REAL,
                type_tags TEXT,
                category_tags TEXT,
                mechanism_tags TEXT,
                detail_url TEXT,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
        "#;

        let create_annotations_sql = r#"
            CREATE TABLE IF NOT EXISTS user_annotations (
                external_id INTEGER PRIMARY KEY,
                is_favorite BOOLEAN NOT NULL DEFAULT 0,
                personal_rating INTEGER,
                personal_review TEXT,
                review_timestamp DATETIME
            )
        "#;

        let create_reviews_sql = r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id INTEGER NOT NULL,
                rating INTEGER NOT NULL,
                text TEXT,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
        "#;

        let create_indexes_sql = r#"
            CREATE INDEX IF NOT EXISTS idx_games_primary_name ON games (primary_name);
            CREATE INDEX IF NOT EXISTS idx_reviews_external_id ON reviews (external_id);
        "#;

        sqlx::query(create_games_sql).execute(&self.pool).await?;
        sqlx::query(create_annotations_sql)
            .execute(&self.pool)
            .await?;
        sqlx::query(create_reviews_sql).execute(&self.pool).await?;
        sqlx::query(create_indexes_sql).execute(&self.pool).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_database_connection() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("test.db");
        let database_url = format!("sqlite:{}", db_path.display());

        let db = DatabaseConnection::new(&database_url).await?;
        assert!(!db.pool().is_closed());
        Ok(())
    }

    #[tokio::test]
    async fn test_database_migration() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("test_migration.db");
        let database_url = format!("sqlite:{}", db_path.display());

        let db = DatabaseConnection::new(&database_url).await?;
        db.migrate().await?;
        // Second run must be a no-op.
        db.migrate().await?;

        for table in ["games", "user_annotations", "reviews"] {
            let result =
                sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
                    .bind(table)
                    .fetch_optional(db.pool())
                    .await?;
            assert!(result.is_some(), "missing table {table}");
        }
        Ok(())
    }
}
