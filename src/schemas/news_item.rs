//! NewsItem Schema
//!
//! The single persistent entity. Pipeline stage is not stored as a status
//! column; it is derived from the `is_crawled`/`is_translated` flags and the
//! presence of a notification record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Discovered,
    Crawled,
    Translated,
    Notified,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Discovered => "discovered",
            Stage::Crawled => "crawled",
            Stage::Translated => "translated",
            Stage::Notified => "notified",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct NewsItem {
    pub id: i64,
    pub url_id: String,
    pub source_url: String,

    // Origin content, filled by the crawler
    pub is_crawled: bool,
    pub title_en: Option<String>,
    pub content_en: Option<String>,
    pub photo_url: Option<String>,

    /// Last raw provider response, kept for diagnostics and replay
    #[serde(skip_serializing)]
    pub raw_provider_response: Option<String>,

    // Enrichment output
    pub is_translated: bool,
    pub title_fa: Option<String>,
    pub content_fa: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<String>,
    pub summary: Option<String>,
    pub slug_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing)]
    pub notification_record: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl NewsItem {
    pub fn stage(&self) -> Stage {
        if self.notification_record.is_some() {
            Stage::Notified
        } else if self.is_translated {
            Stage::Translated
        } else if self.is_crawled {
            Stage::Crawled
        } else {
            Stage::Discovered
        }
    }

    /// True when every derived field is present and `published_at` is set.
    /// Holds for every row with `is_translated = true`.
    pub fn has_complete_enrichment(&self) -> bool {
        [
            &self.title_fa,
            &self.content_fa,
            &self.seo_title,
            &self.seo_description,
            &self.seo_keywords,
            &self.summary,
            &self.slug_url,
        ]
        .iter()
        .all(|field| field.is_some())
            && self.published_at.is_some()
    }
}

/// Origin-language content written by the crawler collaborator
#[derive(Debug, Clone, Default)]
pub struct CrawledContent {
    pub title_en: String,
    pub content_en: String,
    pub photo_url: Option<String>,
}

/// Every derived column committed by the final enrichment update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub title_fa: String,
    pub content_fa: String,
    pub seo_title: String,
    pub seo_description: String,
    pub seo_keywords: String,
    pub summary: String,
    pub slug_url: String,
}
