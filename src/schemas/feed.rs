//! Feed document schema
//!
//! The feed is a JSON document of the shape `{"items": [{"url": ...}, ...]}`.
//! Only the URL is consumed; everything else an entry carries is ignored.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedDocument {
    #[serde(default)]
    pub items: Vec<FeedEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedEntry {
    pub url: Option<String>,
    pub title: Option<String>,
}
