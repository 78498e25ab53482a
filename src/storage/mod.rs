//! Item store
//!
//! A single SQLite table of news items is the ground truth for pipeline
//! state. Each stage selects its work with a predicate over the stage
//! columns and advances an item with one conditional update.

mod schema;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::Result;
use crate::schemas::{CrawledContent, Enrichment, NewsItem};

pub use schema::SCHEMA;

/// Result of inserting a freshly discovered URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(i64),
    /// The fingerprint is already known
    Duplicate,
}

/// Number of items per derived stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, sqlx::FromRow)]
pub struct StageCounts {
    pub discovered: i64,
    pub crawled: i64,
    pub translated: i64,
    pub notified: i64,
}

impl StageCounts {
    pub fn total(&self) -> i64 {
        self.discovered + self.crawled + self.translated + self.notified
    }
}

/// Storage manager for news items
#[derive(Clone)]
pub struct ItemStore {
    db: SqlitePool,
}

impl ItemStore {
    /// Opens (creating if missing) the database and applies the schema
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        info!("Connecting to database...");

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let db = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { db };
        store.migrate().await?;

        info!("Storage initialized");
        Ok(store)
    }

    /// Private in-memory database, used by tests and dry runs.
    /// One connection that never expires, since each new connection would
    /// open an empty database.
    pub async fn in_memory() -> Result<Self> {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { db };
        store.migrate().await?;
        Ok(store)
    }

    /// Creates the table and indexes if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.db).await?;
        Ok(())
    }

    /// Inserts a discovered URL with default stage columns.
    /// A unique-constraint hit on `url_id` is reported as `Duplicate`.
    pub async fn insert_discovered(&self, url_id: &str, source_url: &str) -> Result<InsertOutcome> {
        let result = sqlx::query(
            "INSERT INTO news_items (url_id, source_url, created_at) VALUES (?, ?, ?)",
        )
        .bind(url_id)
        .bind(source_url)
        .bind(Utc::now())
        .execute(&self.db)
        .await;

        match result {
            Ok(done) => Ok(InsertOutcome::Inserted(done.last_insert_rowid())),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                debug!(url_id = %url_id, "Fingerprint already stored");
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write path of the crawler: stores origin text and flags the item crawled
    pub async fn mark_crawled(&self, id: i64, content: &CrawledContent) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE news_items SET title_en = ?, content_en = ?, photo_url = ?, is_crawled = 1 WHERE id = ?",
        )
        .bind(&content.title_en)
        .bind(&content.content_en)
        .bind(&content.photo_url)
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(done.rows_affected() == 1)
    }

    pub async fn get(&self, id: i64) -> Result<Option<NewsItem>> {
        let item = sqlx::query_as::<_, NewsItem>("SELECT * FROM news_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(item)
    }

    /// Picks the item the enrichment worker should process.
    ///
    /// With an explicit id only `is_crawled` is required, so a translated item
    /// can be reprocessed on request. Without one, the lowest id that is
    /// crawled, untranslated and has no captured provider response is chosen.
    pub async fn select_for_enrichment(&self, id: Option<i64>) -> Result<Option<NewsItem>> {
        let item = match id {
            Some(id) => {
                sqlx::query_as::<_, NewsItem>(
                    "SELECT * FROM news_items WHERE id = ? AND is_crawled = 1",
                )
                .bind(id)
                .fetch_optional(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, NewsItem>(
                    r#"
                    SELECT * FROM news_items
                    WHERE is_translated = 0 AND is_crawled = 1 AND raw_provider_response IS NULL
                    ORDER BY id ASC
                    LIMIT 1
                    "#,
                )
                .fetch_optional(&self.db)
                .await?
            }
        };
        Ok(item)
    }

    /// Durable copy of a raw provider response, written before it is parsed
    pub async fn checkpoint_raw_response(&self, id: i64, raw: &str) -> Result<()> {
        sqlx::query("UPDATE news_items SET raw_provider_response = ? WHERE id = ?")
            .bind(raw)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Intermediate commit of the translate phase; the item stays untranslated
    pub async fn save_translation(&self, id: i64, title_fa: &str, content_fa: &str) -> Result<()> {
        sqlx::query("UPDATE news_items SET title_fa = ?, content_fa = ? WHERE id = ?")
            .bind(title_fa)
            .bind(content_fa)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Commits every derived column, sets `published_at` and flips
    /// `is_translated`. This is the only transition into the translated stage.
    pub async fn finalize_enrichment(&self, id: i64, enrichment: &Enrichment) -> Result<Option<NewsItem>> {
        sqlx::query(
            r#"
            UPDATE news_items SET
                title_fa = ?,
                content_fa = ?,
                seo_title = ?,
                seo_description = ?,
                seo_keywords = ?,
                summary = ?,
                slug_url = ?,
                published_at = ?,
                is_translated = 1
            WHERE id = ?
            "#,
        )
        .bind(&enrichment.title_fa)
        .bind(&enrichment.content_fa)
        .bind(&enrichment.seo_title)
        .bind(&enrichment.seo_description)
        .bind(&enrichment.seo_keywords)
        .bind(&enrichment.summary)
        .bind(&enrichment.slug_url)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db)
        .await?;

        self.get(id).await
    }

    /// Most recent translated items, newest first
    pub async fn list_published(&self, limit: u32) -> Result<Vec<NewsItem>> {
        let items = sqlx::query_as::<_, NewsItem>(
            "SELECT * FROM news_items WHERE is_translated = 1 ORDER BY id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    pub async fn get_published(&self, id: i64) -> Result<Option<NewsItem>> {
        let item = sqlx::query_as::<_, NewsItem>(
            "SELECT * FROM news_items WHERE id = ? AND is_translated = 1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(item)
    }

    /// Every translated item, newest first
    pub async fn all_published(&self) -> Result<Vec<NewsItem>> {
        let items = sqlx::query_as::<_, NewsItem>(
            "SELECT * FROM news_items WHERE is_translated = 1 ORDER BY id DESC",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    /// Lowest-id item without a notification record.
    /// `translated_only = false` ignores the translation stage entirely.
    pub async fn select_for_notification(&self, translated_only: bool) -> Result<Option<NewsItem>> {
        let query = if translated_only {
            "SELECT * FROM news_items WHERE notification_record IS NULL AND is_translated = 1 ORDER BY id ASC LIMIT 1"
        } else {
            "SELECT * FROM news_items WHERE notification_record IS NULL ORDER BY id ASC LIMIT 1"
        };

        let item = sqlx::query_as::<_, NewsItem>(query)
            .fetch_optional(&self.db)
            .await?;
        Ok(item)
    }

    /// Stores the messaging provider response. Write-once: returns false when
    /// the item already carries a record (or does not exist).
    pub async fn record_notification(&self, id: i64, record: &str) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE news_items SET notification_record = ? WHERE id = ? AND notification_record IS NULL",
        )
        .bind(record)
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(done.rows_affected() == 1)
    }

    pub async fn stage_counts(&self) -> Result<StageCounts> {
        let counts = sqlx::query_as::<_, StageCounts>(
            r#"
            SELECT
                COALESCE(SUM(notification_record IS NULL AND is_translated = 0 AND is_crawled = 0), 0) AS discovered,
                COALESCE(SUM(notification_record IS NULL AND is_translated = 0 AND is_crawled = 1), 0) AS crawled,
                COALESCE(SUM(notification_record IS NULL AND is_translated = 1), 0) AS translated,
                COALESCE(SUM(notification_record IS NOT NULL), 0) AS notified
            FROM news_items
            "#,
        )
        .fetch_one(&self.db)
        .await?;
        Ok(counts)
    }
}
