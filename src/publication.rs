//! Publication gateway
//!
//! Read-only views over translated items, plus the public link scheme shared
//! by the notifier and the sitemap.

use url::Url;

use crate::error::{PipelineError, Result};
use crate::schemas::NewsItem;
use crate::storage::ItemStore;

/// Path segment under which items are published on the site
pub const ITEM_PATH: &str = "catalan_news/";

/// Builds public deep links of the form `{base}/catalan_news/?id={id}&title={slug}`
#[derive(Debug, Clone)]
pub struct SiteLinks {
    item_base: Url,
}

impl SiteLinks {
    pub fn new(site_base_url: &str) -> Result<Self> {
        let mut base = Url::parse(site_base_url).map_err(|e| {
            PipelineError::Config(config::ConfigError::Message(format!(
                "site_base_url {:?}: {}",
                site_base_url, e
            )))
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let item_base = base.join(ITEM_PATH).map_err(|e| {
            PipelineError::Config(config::ConfigError::Message(e.to_string()))
        })?;
        Ok(Self { item_base })
    }

    pub fn item_url(&self, id: i64, slug: Option<&str>) -> String {
        let mut url = self.item_base.clone();
        url.query_pairs_mut()
            .append_pair("id", &id.to_string())
            .append_pair("title", slug.unwrap_or_default());
        url.into()
    }
}

/// Read side for external consumers. Empty results are values, not errors.
#[derive(Clone)]
pub struct PublicationGateway {
    store: ItemStore,
    page_size: u32,
}

impl PublicationGateway {
    pub fn new(store: ItemStore, page_size: u32) -> Self {
        Self { store, page_size }
    }

    /// Translated items, newest first, at most one page
    pub async fn list_recent(&self) -> Result<Vec<NewsItem>> {
        self.store.list_published(self.page_size).await
    }

    /// A single translated item; `None` for unknown or unpublished ids
    pub async fn get(&self, id: i64) -> Result<Option<NewsItem>> {
        self.store.get_published(id).await
    }

    /// Every translated item, for the sitemap
    pub async fn all(&self) -> Result<Vec<NewsItem>> {
        self.store.all_published().await
    }
}
