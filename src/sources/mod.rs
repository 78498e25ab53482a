//! Feed sources
//!
//! A source pulls one feed document per call. The ingestor only depends on
//! the `FeedSource` trait, so tests can substitute a fixed document.

pub mod json_feed;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schemas::FeedDocument;

/// Metadata about a source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Unique identifier for the source
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Location the document is pulled from
    pub url: String,
}

/// Trait for all feed sources
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Gets metadata about this source
    fn metadata(&self) -> &SourceMetadata;

    /// Fetches the current feed document. Fails on network errors and on
    /// non-2xx responses.
    async fn fetch(&self) -> Result<FeedDocument>;

    /// Gets the source ID
    fn id(&self) -> &str {
        &self.metadata().id
    }
}

pub use json_feed::JsonFeedSource;
