//! JSON feed source
//!
//! Pulls a `{"items": [{"url": ...}]}` document over HTTP.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::{FeedSource, SourceMetadata};
use crate::error::{PipelineError, Result};
use crate::http_client::ensure_success;
use crate::schemas::FeedDocument;

pub struct JsonFeedSource {
    client: Client,
    metadata: SourceMetadata,
}

impl JsonFeedSource {
    pub fn new(client: Client, feed_url: &str) -> Self {
        let metadata = SourceMetadata {
            id: "json_feed".to_string(),
            name: "JSON Feed".to_string(),
            url: feed_url.to_string(),
        };

        Self { client, metadata }
    }
}

#[async_trait]
impl FeedSource for JsonFeedSource {
    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    async fn fetch(&self) -> Result<FeedDocument> {
        debug!(url = %self.metadata.url, "Fetching feed");

        let response = self.client.get(&self.metadata.url).send().await?;
        let text = ensure_success(response).await?.text().await?;

        let document: FeedDocument = serde_json::from_str(&text).map_err(PipelineError::Json)?;

        info!(
            source = %self.metadata.id,
            items = document.items.len(),
            "Feed fetched"
        );
        Ok(document)
    }
}
