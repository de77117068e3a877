use sqlx::SqlitePool;
use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::{decode_list, HistoryEntry, ListStatus, MediaItem, RatedMedia},
};

/// The user's personal list database
#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS media (
                id INTEGER PRIMARY KEY,
                title_romaji TEXT,
                title_english TEXT,
                title_native TEXT,
                genres TEXT,
                tags TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS media_list_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                media_id INTEGER NOT NULL,
                status TEXT NOT NULL,
                score REAL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Completed entries that carry a score, joined with their media's genres and tags
    pub async fn rated_completed(&self) -> AppResult<Vec<RatedMedia>> {
        let rows = sqlx::query_as::<_, (Option<String>, Option<String>, f64)>(
            r#"
            SELECT m.genres, m.tags, CAST(mle.score AS REAL) AS score
            FROM media m
            JOIN media_list_entries mle ON m.id = mle.media_id
            WHERE mle.status = ? AND mle.score IS NOT NULL
            "#,
        )
        .bind(ListStatus::Completed.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(genres, tags, score)| RatedMedia {
                genres: decode_list(genres.as_deref()),
                tags: decode_list(tags.as_deref()),
                score,
            })
            .collect())
    }

    /// Media ids with at least one `PLANNING` entry
    pub async fn planned_ids(&self) -> AppResult<HashSet<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT media_id FROM media_list_entries WHERE status = ?",
        )
        .bind(ListStatus::Planning.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    /// Media ids with at least one entry in any list other than `PLANNING`
    pub async fn watched_ids(&self) -> AppResult<HashSet<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT media_id FROM media_list_entries WHERE status != ?",
        )
        .bind(ListStatus::Planning.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    pub async fn upsert_media(&self, item: &MediaItem) -> AppResult<()> {
        let genres = serde_json::to_string(&item.genres)?;
        let tags = serde_json::to_string(&item.tags)?;

        sqlx::query(
            r#"
            INSERT INTO media (id, title_romaji, title_english, title_native, genres, tags)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title_romaji = excluded.title_romaji,
                title_english = excluded.title_english,
                title_native = excluded.title_native,
                genres = excluded.genres,
                tags = excluded.tags
            "#,
        )
        .bind(item.id)
        .bind(item.titles.romaji.as_deref())
        .bind(item.titles.english.as_deref())
        .bind(item.titles.native.as_deref())
        .bind(genres)
        .bind(tags)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn add_entry(&self, entry: &HistoryEntry) -> AppResult<()> {
        sqlx::query("INSERT INTO media_list_entries (media_id, status, score) VALUES (?, ?, ?)")
            .bind(entry.media_id)
            .bind(entry.status.as_str())
            .bind(entry.score)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
