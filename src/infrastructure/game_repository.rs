//! Repository for game records and user annotations
//!
//! The write side of the reconciliation policy lives here: `upsert` reads the
//! current row, merges field-wise through `GameRecord::merge_missing`, and
//! writes back only when something actually changed. User annotations are a
//! separate table that ingestion never touches.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::Utc;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::debug;

use crate::domain::annotation::{Review, UserAnnotation};
use crate::domain::game::{
    GameFilter, GamePage, GameRecord, GameWithAnnotation, TagKind, Upserted,
};

#[derive(Clone)]
pub struct GameRepository {
    pool: Arc<SqlitePool>,
}

impl GameRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    // ===============================
    // GAME RECORD OPERATIONS
    // ===============================

    /// Insert a new record, or merge it over the stored one.
    ///
    /// The merge only fills gaps; a populated stored field survives every
    /// re-crawl. When the merge changes nothing the row (including its
    /// `updated_at`) is left untouched, which makes the operation idempotent.
    pub async fn upsert(&self, incoming: &GameRecord) -> Result<Upserted> {
        match self.get_by_id(incoming.external_id).await? {
            None => {
                self.insert(incoming).await?;
                debug!(external_id = incoming.external_id, "inserted new game");
                Ok(Upserted::Inserted)
            }
            Some(existing) => {
                let merged = GameRecord::merge_missing(&existing, incoming);
                if merged == existing {
                    return Ok(Upserted::Unchanged);
                }
                self.update(&merged).await?;
                debug!(external_id = incoming.external_id, "merged game record");
                Ok(Upserted::Merged)
            }
        }
    }

    async fn insert(&self, record: &GameRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO games
            (external_id, primary_name, localized_name, image_url,
             player_count_min, player_count_max, players_best, players_recommended,
             play_time_min, play_time_max, minimum_age, complexity_weight,
             community_rating, type_tags, category_tags, mechanism_tags, detail_url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.external_id)
        .bind(&record.primary_name)
        .bind(&record.localized_name)
        .bind(&record.image_url)
        .bind(record.player_count_min)
        .bind(record.player_count_max)
        .bind(&record.players_best)
        .bind(&record.players_recommended)
        .bind(record.play_time_min)
        .bind(record.play_time_max)
        .bind(record.minimum_age)
        .bind(record.complexity_weight)
        .bind(record.community_rating)
        .bind(&record.type_tags)
        .bind(&record.category_tags)
        .bind(&record.mechanism_tags)
        .bind(&record.detail_url)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, record: &GameRecord) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE games SET
                primary_name = ?, localized_name = ?, image_url = ?,
                player_count_min = ?, player_count_max = ?,
                players_best = ?, players_recommended = ?,
                play_time_min = ?, play_time_max = ?, minimum_age = ?,
                complexity_weight = ?, community_rating = ?,
                type_tags = ?, category_tags = ?, mechanism_tags = ?,
                detail_url = ?, updated_at = CURRENT_TIMESTAMP
            WHERE external_id = ?
            "#,
        )
        .bind(&record.primary_name)
        .bind(&record.localized_name)
        .bind(&record.image_url)
        .bind(record.player_count_min)
        .bind(record.player_count_max)
        .bind(&record.players_best)
        .bind(&record.players_recommended)
        .bind(record.play_time_min)
        .bind(record.play_time_max)
        .bind(record.minimum_age)
        .bind(record.complexity_weight)
        .bind(record.community_rating)
        .bind(&record.type_tags)
        .bind(&record.category_tags)
        .bind(&record.mechanism_tags)
        .bind(&record.detail_url)
        .bind(record.external_id)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, external_id: i64) -> Result<Option<GameRecord>> {
        let row = sqlx::query("SELECT * FROM games WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.map(|row| game_from_row(&row)))
    }

    /// Filtered, paginated listing joined with the user annotations the UI
    /// shows next to each row.
    pub async fn list_filtered(
        &self,
        filter: &GameFilter,
        offset: i64,
        page_size: i64,
    ) -> Result<GamePage> {
        let mut conditions = String::new();
        if filter.name_contains.is_some() {
            conditions.push_str(" AND g.primary_name LIKE ?");
        }
        if filter.player_count.is_some() {
            conditions.push_str(" AND g.player_count_min <= ? AND g.player_count_max >= ?");
        }
        if filter.best_with.is_some() {
            conditions.push_str(" AND g.players_best LIKE ?");
        }
        if filter.favorites_only {
            conditions.push_str(" AND COALESCE(a.is_favorite, 0) = 1");
        }

        let base = format!(
            r#"
            FROM games g
            LEFT JOIN user_annotations a ON a.external_id = g.external_id
            WHERE 1=1{conditions}
            "#
        );

        let count_sql = format!("SELECT COUNT(*) AS total {base}");
        let mut count_query = sqlx::query(&count_sql);
        count_query = bind_filter(count_query, filter);
        let total_count: i64 = count_query
            .fetch_one(&*self.pool)
            .await?
            .get("total");

        let rows_sql = format!(
            r#"
            SELECT g.*, COALESCE(a.is_favorite, 0) AS is_favorite, a.personal_rating
            {base}
            ORDER BY g.community_rating IS NULL, g.community_rating DESC, g.external_id
            LIMIT ? OFFSET ?
            "#
        );
        let mut rows_query = sqlx::query(&rows_sql);
        rows_query = bind_filter(rows_query, filter);
        rows_query = rows_query.bind(page_size).bind(offset);

        let rows = rows_query
            .fetch_all(&*self.pool)
            .await?
            .into_iter()
            .map(|row| GameWithAnnotation {
                game: game_from_row(&row),
                is_favorite: row.get("is_favorite"),
                personal_rating: row.get("personal_rating"),
            })
            .collect();

        Ok(GamePage { rows, total_count })
    }

    /// Distinct sorted tags of one kind, split out of the comma-joined
    /// columns.
    pub async fn tag_vocabulary(&self, kind: TagKind) -> Result<Vec<String>> {
        let column = match kind {
            TagKind::Type => "type_tags",
            TagKind::Category => "category_tags",
            TagKind::Mechanism => "mechanism_tags",
        };
        let sql = format!("SELECT {column} AS tags FROM games WHERE {column} IS NOT NULL");
        let rows = sqlx::query(&sql).fetch_all(&*self.pool).await?;

        let mut vocabulary = BTreeSet::new();
        for row in rows {
            let tags: String = row.get("tags");
            for tag in tags.split(',') {
                let tag = tag.trim();
                if !tag.is_empty() {
                    vocabulary.insert(tag.to_string());
                }
            }
        }
        Ok(vocabulary.into_iter().collect())
    }

    /// Manual correction of the player-count fields (a user action from the
    /// detail view, not an ingestion write).
    pub async fn update_player_counts(
        &self,
        external_id: i64,
        player_count_min: Option<i64>,
        player_count_max: Option<i64>,
        players_best: Option<String>,
    ) -> Result<()> {
        if let (Some(min), Some(max)) = (player_count_min, player_count_max) {
            if min > max {
                bail!("player count range is inverted: {min} > {max}");
            }
        }
        let result = sqlx::query(
            r#"
            UPDATE games
            SET player_count_min = ?, player_count_max = ?, players_best = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE external_id = ?
            "#,
        )
        .bind(player_count_min)
        .bind(player_count_max)
        .bind(&players_best)
        .bind(external_id)
        .execute(&*self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("no game stored for external id {external_id}");
        }
        Ok(())
    }

    // ===============================
    // USER ANNOTATION OPERATIONS
    // ===============================

    pub async fn get_annotation(&self, external_id: i64) -> Result<Option<UserAnnotation>> {
        let row = sqlx::query(
            r#"
            SELECT external_id, is_favorite, personal_rating, personal_review, review_timestamp
            FROM user_annotations WHERE external_id = ?
            "#,
        )
        .bind(external_id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.map(|row| UserAnnotation {
            external_id: row.get("external_id"),
            is_favorite: row.get("is_favorite"),
            personal_rating: row.get("personal_rating"),
            personal_review: row.get("personal_review"),
            review_timestamp: row.get("review_timestamp"),
        }))
    }

    pub async fn set_favorite(&self, external_id: i64, is_favorite: bool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_annotations (external_id, is_favorite)
            VALUES (?, ?)
            ON CONFLICT(external_id) DO UPDATE SET is_favorite = excluded.is_favorite
            "#,
        )
        .bind(external_id)
        .bind(is_favorite)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    /// Append to the review log and mirror the latest entry on the
    /// annotation row.
    pub async fn add_review(
        &self,
        external_id: i64,
        rating: i64,
        text: Option<String>,
    ) -> Result<Review> {
        if !(1..=10).contains(&rating) {
            bail!("rating must be within 1..=10, got {rating}");
        }
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO reviews (external_id, rating, text, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(external_id)
        .bind(rating)
        .bind(&text)
        .bind(created_at)
        .execute(&*self.pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_annotations
                (external_id, is_favorite, personal_rating, personal_review, review_timestamp)
            VALUES (?, 0, ?, ?, ?)
            ON CONFLICT(external_id) DO UPDATE SET
                personal_rating = excluded.personal_rating,
                personal_review = excluded.personal_review,
                review_timestamp = excluded.review_timestamp
            "#,
        )
        .bind(external_id)
        .bind(rating)
        .bind(&text)
        .bind(created_at)
        .execute(&*self.pool)
        .await?;

        Ok(Review {
            id: result.last_insert_rowid(),
            external_id,
            rating,
            text,
            created_at,
        })
    }

    /// Review log for one game, newest first.
    pub async fn list_reviews(&self, external_id: i64) -> Result<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT id, external_id, rating, text, created_at
            FROM reviews WHERE external_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(external_id)
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Review {
                id: row.get("id"),
                external_id: row.get("external_id"),
                rating: row.get("rating"),
                text: row.get("text"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

type SqliteQuery<'q> =
    sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

fn bind_filter<'q>(mut query: SqliteQuery<'q>, filter: &'q GameFilter) -> SqliteQuery<'q> {
    if let Some(name) = &filter.name_contains {
        query = query.bind(format!("%{name}%"));
    }
    if let Some(count) = filter.player_count {
        query = query.bind(count).bind(count);
    }
    if let Some(best) = &filter.best_with {
        query = query.bind(format!("%{best}%"));
    }
    query
}

fn game_from_row(row: &SqliteRow) -> GameRecord {
    GameRecord {
        external_id: row.get("external_id"),
        primary_name: row.get("primary_name"),
        localized_name: row.get("localized_name"),
        image_url: row.get("image_url"),
        player_count_min: row.get("player_count_min"),
        player_count_max: row.get("player_count_max"),
        players_best: row.get("players_best"),
        players_recommended: row.get("players_recommended"),
        play_time_min: row.get("play_time_min"),
        play_time_max: row.get("play_time_max"),
        minimum_age: row.get("minimum_age"),
        complexity_weight: row.get("complexity_weight"),
        community_rating: row.get("community_rating"),
        type_tags: row.get("type_tags"),
        category_tags: row.get("category_tags"),
        mechanism_tags: row.get("mechanism_tags"),
        detail_url: row.get("detail_url"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database_connection::DatabaseConnection;
    use tempfile::TempDir;

    async fn setup() -> (GameRepository, TempDir) {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite:{}", dir.path().join("test.db").display());
        let db = DatabaseConnection::new(&url).await.unwrap();
        db.migrate().await.unwrap();
        (GameRepository::new(db.pool().clone()), dir)
    }

    fn record(external_id: i64, name: &str) -> GameRecord {
        GameRecord {
            external_id,
            primary_name: name.to_string(),
            localized_name: None,
            image_url: None,
            player_count_min: Some(2),
            player_count_max: Some(4),
            players_best: Some("3".to_string()),
            players_recommended: None,
            play_time_min: Some(60),
            play_time_max: Some(90),
            minimum_age: None,
            complexity_weight: None,
            community_rating: Some(7.0),
            type_tags: None,
            category_tags: Some("Economic".to_string()),
            mechanism_tags: None,
            detail_url: None,
        }
    }

    #[tokio::test]
    async fn upsert_inserts_then_fills_gaps() {
        let (repo, _dir) = setup().await;

        let mut first = record(42, "Brass");
        first.complexity_weight = None;
        first.community_rating = Some(7.5);
        assert_eq!(repo.upsert(&first).await.unwrap(), Upserted::Inserted);

        let mut second = record(42, "Brass");
        second.complexity_weight = Some(3.2);
        second.community_rating = None;
        assert_eq!(repo.upsert(&second).await.unwrap(), Upserted::Merged);

        let stored = repo.get_by_id(42).await.unwrap().unwrap();
        assert_eq!(stored.community_rating, Some(7.5));
        assert_eq!(stored.complexity_weight, Some(3.2));
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let (repo, _dir) = setup().await;
        let incoming = record(7, "Azul");

        repo.upsert(&incoming).await.unwrap();
        let after_first = repo.get_by_id(7).await.unwrap().unwrap();

        assert_eq!(repo.upsert(&incoming).await.unwrap(), Upserted::Unchanged);
        let after_second = repo.get_by_id(7).await.unwrap().unwrap();
        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn upsert_never_touches_annotations() {
        let (repo, _dir) = setup().await;
        repo.upsert(&record(42, "Brass")).await.unwrap();
        repo.set_favorite(42, true).await.unwrap();
        repo.add_review(42, 9, Some("great".to_string())).await.unwrap();

        let mut refreshed = record(42, "Brass");
        refreshed.minimum_age = Some(14);
        repo.upsert(&refreshed).await.unwrap();

        let annotation = repo.get_annotation(42).await.unwrap().unwrap();
        assert!(annotation.is_favorite);
        assert_eq!(annotation.personal_rating, Some(9));
        assert_eq!(annotation.personal_review.as_deref(), Some("great"));
    }

    #[tokio::test]
    async fn list_filtered_applies_predicates_and_pagination() {
        let (repo, _dir) = setup().await;
        let mut solo = record(1, "Mage Knight");
        solo.player_count_min = Some(1);
        solo.player_count_max = Some(1);
        repo.upsert(&solo).await.unwrap();
        repo.upsert(&record(2, "Brass Birmingham")).await.unwrap();
        repo.upsert(&record(3, "Brass Lancashire")).await.unwrap();
        repo.set_favorite(3, true).await.unwrap();

        let by_name = GameFilter {
            name_contains: Some("Brass".to_string()),
            ..Default::default()
        };
        let page = repo.list_filtered(&by_name, 0, 20).await.unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.rows.len(), 2);

        let paginated = repo.list_filtered(&by_name, 1, 1).await.unwrap();
        assert_eq!(paginated.total_count, 2);
        assert_eq!(paginated.rows.len(), 1);

        let by_players = GameFilter {
            player_count: Some(1),
            ..Default::default()
        };
        let page = repo.list_filtered(&by_players, 0, 20).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.rows[0].game.external_id, 1);

        let favorites = GameFilter {
            favorites_only: true,
            ..Default::default()
        };
        let page = repo.list_filtered(&favorites, 0, 20).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.rows[0].game.external_id, 3);
        assert!(page.rows[0].is_favorite);
    }

    #[tokio::test]
    async fn review_log_is_append_only_and_mirrors_latest() {
        let (repo, _dir) = setup().await;
        repo.upsert(&record(5, "Root")).await.unwrap();

        repo.add_review(5, 6, None).await.unwrap();
        repo.add_review(5, 8, Some("grew on me".to_string())).await.unwrap();

        let reviews = repo.list_reviews(5).await.unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].rating, 8);

        let annotation = repo.get_annotation(5).await.unwrap().unwrap();
        assert_eq!(annotation.personal_rating, Some(8));
        assert!(!annotation.is_favorite);
    }

    #[tokio::test]
    async fn review_rating_is_range_checked() {
        let (repo, _dir) = setup().await;
        assert!(repo.add_review(5, 0, None).await.is_err());
        assert!(repo.add_review(5, 11, None).await.is_err());
    }

    #[tokio::test]
    async fn tag_vocabulary_is_distinct_and_sorted() {
        let (repo, _dir) = setup().await;
        let mut a = record(1, "A");
        a.category_tags = Some("Economic, Science Fiction".to_string());
        let mut b = record(2, "B");
        b.category_tags = Some("Adventure, Economic".to_string());
        repo.upsert(&a).await.unwrap();
        repo.upsert(&b).await.unwrap();

        let vocabulary = repo.tag_vocabulary(TagKind::Category).await.unwrap();
        assert_eq!(vocabulary, vec!["Adventure", "Economic", "Science Fiction"]);
        assert!(repo.tag_vocabulary(TagKind::Mechanism).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn player_counts_can_be_corrected_by_hand() {
        let (repo, _dir) = setup().await;
        repo.upsert(&record(9, "Cascadia")).await.unwrap();

        repo.update_player_counts(9, Some(1), Some(6), Some("2, 4".to_string()))
            .await
            .unwrap();
        let stored = repo.get_by_id(9).await.unwrap().unwrap();
        assert_eq!(stored.player_count_min, Some(1));
        assert_eq!(stored.player_count_max, Some(6));
        assert_eq!(stored.players_best.as_deref(), Some("2, 4"));

        assert!(repo.update_player_counts(9, Some(5), Some(2), None).await.is_err());
        assert!(repo.update_player_counts(999, Some(1), Some(2), None).await.is_err());
    }
}
