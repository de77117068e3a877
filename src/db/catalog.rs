use sqlx::SqlitePool;

use crate::{
    error::AppResult,
    models::{decode_list, ApiMedia, MediaItem, MediaTitles},
};

/// Row of the `global_media` table as read back for recommendation
#[derive(Debug, sqlx::FromRow)]
struct CatalogRow {
    id: i64,
    title_romaji: Option<String>,
    title_english: Option<String>,
    title_native: Option<String>,
    format: Option<String>,
    episodes: Option<i64>,
    genres: Option<String>,
    tags: Option<String>,
    average_score: Option<i64>,
    popularity: Option<i64>,
}

impl From<CatalogRow> for MediaItem {
    fn from(row: CatalogRow) -> Self {
        Self {
            id: row.id,
            titles: MediaTitles {
                romaji: row.title_romaji,
                english: row.title_english,
                native: row.title_native,
            },
            format: row.format,
            episodes: row.episodes,
            genres: decode_list(row.genres.as_deref()),
            tags: decode_list(row.tags.as_deref()),
            average_score: row.average_score,
            popularity: row.popularity,
        }
    }
}

/// Global media catalog backed by SQLite
#[derive(Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS global_media (
                id INTEGER PRIMARY KEY,
                title_romaji TEXT,
                title_english TEXT,
                title_native TEXT,
                format TEXT,
                episodes INTEGER,
                description TEXT,
                genres TEXT,
                tags TEXT,
                average_score INTEGER,
                popularity INTEGER,
                rankings TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Returns every catalog item in catalog (id) order
    ///
    /// Unparseable genre or tag columns decode as empty lists.
    pub async fn fetch_all(&self) -> AppResult<Vec<MediaItem>> {
        let rows = sqlx::query_as::<_, CatalogRow>(
            r#"
            SELECT id, title_romaji, title_english, title_native, format, episodes,
                   genres, tags, average_score, popularity
            FROM global_media
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(count = rows.len(), "Loaded catalog");

        Ok(rows.into_iter().map(MediaItem::from).collect())
    }

    /// Stores one page of media, replacing every column of rows that already exist
    pub async fn upsert_page(&self, media: &[ApiMedia]) -> AppResult<usize> {
        let mut tx = self.pool.begin().await?;

        for item in media {
            let title = item.title.clone().unwrap_or_default();
            let genres = serde_json::to_string(&item.genres.clone().unwrap_or_default())?;
            let tags = serde_json::to_string(&item.tags())?;
            let rankings = serde_json::to_string(&item.rankings.clone().unwrap_or_default())?;

            sqlx::query(
                r#"
                INSERT INTO global_media
                    (id, title_romaji, title_english, title_native, format, episodes,
                     description, genres, tags, average_score, popularity, rankings)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    title_romaji = excluded.title_romaji,
                    title_english = excluded.title_english,
                    title_native = excluded.title_native,
                    format = excluded.format,
                    episodes = excluded.episodes,
                    description = excluded.description,
                    genres = excluded.genres,
                    tags = excluded.tags,
                    average_score = excluded.average_score,
                    popularity = excluded.popularity,
                    rankings = excluded.rankings
                "#,
            )
            .bind(item.id)
            .bind(title.romaji)
            .bind(title.english)
            .bind(title.native)
            .bind(item.format.as_deref())
            .bind(item.episodes)
            .bind(item.description.as_deref())
            .bind(genres)
            .bind(tags)
            .bind(item.average_score)
            .bind(item.popularity)
            .bind(rankings)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(media.len())
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM global_media")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
