pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS news_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url_id TEXT NOT NULL UNIQUE,
    source_url TEXT NOT NULL,
    is_crawled INTEGER NOT NULL DEFAULT 0,
    title_en TEXT,
    content_en TEXT,
    photo_url TEXT,
    raw_provider_response TEXT,
    is_translated INTEGER NOT NULL DEFAULT 0,
    title_fa TEXT,
    content_fa TEXT,
    seo_title TEXT,
    seo_description TEXT,
    seo_keywords TEXT,
    summary TEXT,
    slug_url TEXT,
    published_at TEXT,
    notification_record TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_news_items_enrichment
    ON news_items(is_translated, is_crawled);
CREATE INDEX IF NOT EXISTS idx_news_items_pending_notification
    ON news_items(id) WHERE notification_record IS NULL;
"#;
