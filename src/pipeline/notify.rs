//! Notifier
//!
//! Posts one item without a notification record to the messaging channel
//! and stores the provider's answer as that record. A stored record is
//! final: the item is never posted again, whatever the answer says.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::messaging::{LinkButton, Messenger, OutboundPost};
use crate::metrics::{self, StageTimer, STAGE_NOTIFY};
use crate::publication::SiteLinks;
use crate::schemas::NewsItem;
use crate::storage::ItemStore;
use crate::text::{escape_markup, truncate_chars};

/// Label of the inline button linking to the published item
pub const BUTTON_TEXT: &str = "مشاهده بیشتر";

/// Photo captions are capped at 1024 characters by the Bot API
const SUMMARY_CHAR_LIMIT: usize = 700;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent {
        id: i64,
        /// False when another run stored a record first
        record_stored: bool,
    },
    NoWork,
}

pub struct Notifier {
    store: ItemStore,
    messenger: Arc<dyn Messenger>,
    links: SiteLinks,
    translated_only: bool,
}

impl Notifier {
    pub fn new(
        store: ItemStore,
        messenger: Arc<dyn Messenger>,
        links: SiteLinks,
        translated_only: bool,
    ) -> Self {
        Self {
            store,
            messenger,
            links,
            translated_only,
        }
    }

    #[instrument(skip(self), fields(messenger = self.messenger.name(), translated_only = self.translated_only))]
    pub async fn notify_one(&self) -> Result<NotifyOutcome> {
        let _timer = StageTimer::new(STAGE_NOTIFY);

        let Some(item) = self.store.select_for_notification(self.translated_only).await? else {
            info!("No records to send");
            metrics::record_notification("no_work");
            return Ok(NotifyOutcome::NoWork);
        };

        let post = self.build_post(&item);
        let response = match self.messenger.send(&post).await {
            Ok(response) => response,
            Err(e) => {
                warn!(item_id = item.id, error = %e, "Notification failed");
                metrics::record_error(STAGE_NOTIFY, e.kind());
                metrics::record_notification("failed");
                return Err(e);
            }
        };

        if response.get("ok").and_then(|ok| ok.as_bool()) == Some(false) {
            warn!(
                item_id = item.id,
                description = response.get("description").and_then(|d| d.as_str()).unwrap_or_default(),
                "Messaging provider rejected the post; item is still marked notified"
            );
        }

        let record_stored = self.store.record_notification(item.id, &response.to_string()).await?;
        if !record_stored {
            warn!(item_id = item.id, "Notification record already present; kept the first one");
        }

        info!(item_id = item.id, record_stored, "Notification sent");
        metrics::record_notification("sent");
        Ok(NotifyOutcome::Sent {
            id: item.id,
            record_stored,
        })
    }

    fn build_post(&self, item: &NewsItem) -> OutboundPost {
        let link = self.links.item_url(item.id, item.slug_url.as_deref());
        OutboundPost {
            photo_url: item.photo_url.clone().filter(|url| !url.trim().is_empty()),
            caption: caption(item, &link),
            button: Some(LinkButton {
                text: BUTTON_TEXT.to_string(),
                url: link,
            }),
        }
    }
}

/// HTML caption: bold title, summary, publication date and link
fn caption(item: &NewsItem, link: &str) -> String {
    let title = [&item.title_fa, &item.seo_title, &item.title_en]
        .into_iter()
        .flatten()
        .map(|t| t.trim())
        .find(|t| !t.is_empty())
        .unwrap_or(item.source_url.as_str());
    let date = item.published_at.unwrap_or(item.created_at).format("%Y-%m-%d");

    let mut caption = format!("<b>{}</b>\n\n", escape_markup(title));
    if let Some(summary) = item.summary.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        caption.push_str(&escape_markup(&truncate_chars(summary, SUMMARY_CHAR_LIMIT)));
        caption.push_str("\n\n");
    }
    caption.push_str(&format!("📅 {}\n", date));
    caption.push_str(&format!("<a href=\"{}\">{}</a>", escape_markup(link), BUTTON_TEXT));
    caption
}
