//! Content pipeline
//!
//! discovered → crawled → translated → notified
//!
//! Each stage is a unit of work over the item store: the ingestor inserts
//! discovered items, an external crawler marks them crawled, the enrichment
//! worker translates one item per run and the notifier posts one item per
//! run. A cycle runs ingest → enrich → notify; each stage's failure is
//! logged and does not keep the later stages from running.

pub mod enrich;
pub mod ingest;
pub mod notify;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use tracing::{error, info, Instrument};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::http_client::{build_client, HttpClientConfig};
use crate::messaging::{Messenger, TelegramMessenger};
use crate::provider::{OpenAiProvider, TextGenerator};
use crate::publication::SiteLinks;
use crate::sources::{FeedSource, JsonFeedSource};
use crate::storage::ItemStore;

pub use enrich::{EnrichOutcome, EnrichmentSettings, EnrichmentWorker};
pub use ingest::{FeedIngestor, IngestReport};
pub use notify::{NotifyOutcome, Notifier};
pub use scheduler::Scheduler;

/// Outcome of every stage of one cycle
#[derive(Debug)]
pub struct CycleReport {
    pub correlation_id: String,
    pub ingest: Result<IngestReport>,
    pub enrich: Result<EnrichOutcome>,
    pub notify: Result<NotifyOutcome>,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.ingest.is_ok() && self.enrich.is_ok() && self.notify.is_ok()
    }
}

/// Wired pipeline stages sharing one store.
///
/// The enrichment worker and the notifier are optional: without provider or
/// messaging credentials the corresponding stage reports a missing setting.
pub struct Pipeline {
    store: ItemStore,
    ingestor: FeedIngestor,
    enricher: Option<EnrichmentWorker>,
    notifier: Option<Notifier>,
}

impl Pipeline {
    /// Builds every stage from configuration, sharing one HTTP client
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = ItemStore::connect(&config.database_url, config.database_max_connections).await?;
        let client = build_client(&HttpClientConfig::from_config(config))?;

        let source: Arc<dyn FeedSource> = Arc::new(JsonFeedSource::new(client.clone(), &config.feed_url));

        let provider: Option<Arc<dyn TextGenerator>> = if config.has_provider() {
            Some(Arc::new(OpenAiProvider::from_config(client.clone(), config)?))
        } else {
            info!("No provider key configured; enrichment disabled");
            None
        };

        let messenger: Option<Arc<dyn Messenger>> = if config.has_messaging() {
            Some(Arc::new(TelegramMessenger::from_config(client, config)?))
        } else {
            info!("No messaging credentials configured; notifications disabled");
            None
        };

        Self::with_components(store, source, provider, messenger, config)
    }

    pub fn with_components(
        store: ItemStore,
        source: Arc<dyn FeedSource>,
        provider: Option<Arc<dyn TextGenerator>>,
        messenger: Option<Arc<dyn Messenger>>,
        config: &Config,
    ) -> Result<Self> {
        let links = SiteLinks::new(&config.site_base_url)?;

        let ingestor = FeedIngestor::new(store.clone(), source);
        let enricher = provider.map(|provider| {
            EnrichmentWorker::new(store.clone(), provider, EnrichmentSettings::from_config(config))
        });
        let notifier = messenger.map(|messenger| {
            Notifier::new(store.clone(), messenger, links, config.notify_translated_only)
        });

        Ok(Self {
            store,
            ingestor,
            enricher,
            notifier,
        })
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn ingestor(&self) -> &FeedIngestor {
        &self.ingestor
    }

    pub fn enricher(&self) -> Result<&EnrichmentWorker> {
        self.enricher
            .as_ref()
            .ok_or(PipelineError::MissingSetting("openai_api_key"))
    }

    pub fn notifier(&self) -> Result<&Notifier> {
        self.notifier
            .as_ref()
            .ok_or(PipelineError::MissingSetting("telegram_bot_token"))
    }

    /// One ingest → enrich → notify pass. Never fails as a whole.
    pub async fn run_cycle(&self) -> CycleReport {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("cycle", correlation_id = %correlation_id);

        async move {
            info!("Cycle started");

            let ingest = self.ingestor.ingest().await;
            if let Err(e) = &ingest {
                error!(stage = "ingest", error = %e, "Stage failed");
            }

            let enrich = match self.enricher() {
                Ok(enricher) => enricher.enrich_one(None).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &enrich {
                error!(stage = "enrich", error = %e, "Stage failed");
            }

            let notify = match self.notifier() {
                Ok(notifier) => notifier.notify_one().await,
                Err(e) => Err(e),
            };
            if let Err(e) = &notify {
                error!(stage = "notify", error = %e, "Stage failed");
            }

            CycleReport {
                correlation_id,
                ingest,
                enrich,
                notify,
            }
        }
        .instrument(span)
        .await
    }
}
