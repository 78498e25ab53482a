//! Feed ingestor
//!
//! Pulls the feed and inserts every unseen URL in the discovered stage.
//! Per-entry failures are logged and counted; only a failed feed fetch
//! aborts the run.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::fingerprint::url_fingerprint;
use crate::metrics::{self, StageTimer, STAGE_INGEST};
use crate::sources::FeedSource;
use crate::storage::{InsertOutcome, ItemStore};

/// Counts of one ingest run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub inserted: usize,
    pub duplicates: usize,
    pub failed: usize,
    /// Entries without a usable URL
    pub skipped: usize,
}

pub struct FeedIngestor {
    store: ItemStore,
    source: Arc<dyn FeedSource>,
}

impl FeedIngestor {
    pub fn new(store: ItemStore, source: Arc<dyn FeedSource>) -> Self {
        Self { store, source }
    }

    #[instrument(skip(self), fields(source = %self.source.id()))]
    pub async fn ingest(&self) -> Result<IngestReport> {
        let _timer = StageTimer::new(STAGE_INGEST);

        let document = match self.source.fetch().await {
            Ok(document) => document,
            Err(e) => {
                metrics::record_error(STAGE_INGEST, e.kind());
                return Err(e);
            }
        };

        let mut report = IngestReport::default();

        for entry in document.items {
            let Some(url) = entry.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
                warn!(title = ?entry.title, "Feed entry without url skipped");
                report.skipped += 1;
                continue;
            };

            let url_id = url_fingerprint(url);
            match self.store.insert_discovered(&url_id, url).await {
                Ok(InsertOutcome::Inserted(id)) => {
                    debug!(item_id = id, url_id = %url_id, url = %url, "Inserted new record");
                    report.inserted += 1;
                }
                Ok(InsertOutcome::Duplicate) => {
                    debug!(url = %url, "Duplicate record skipped");
                    report.duplicates += 1;
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Error inserting record");
                    metrics::record_error(STAGE_INGEST, e.kind());
                    report.failed += 1;
                }
            }
        }

        metrics::record_ingest("inserted", report.inserted as u64);
        metrics::record_ingest("duplicate", report.duplicates as u64);
        metrics::record_ingest("failed", report.failed as u64);
        metrics::record_ingest("skipped", report.skipped as u64);

        info!(
            inserted = report.inserted,
            duplicates = report.duplicates,
            failed = report.failed,
            skipped = report.skipped,
            "Feed processed"
        );
        Ok(report)
    }
}
