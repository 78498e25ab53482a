//! Enrichment worker
//!
//! Moves one crawled item to the translated stage per invocation through two
//! sequential provider calls:
//!
//! 1. translate: origin title/body → translated title and HTML body
//! 2. SEO: translated title/body → SEO title, description, keywords, summary
//!
//! The raw response of each call is written to the item before it is parsed,
//! so a malformed answer can be inspected or replayed without paying for the
//! call again. After the translate phase the translated text is committed on
//! its own; the item only becomes translated in the final update.
//!
//! Concurrent invocations are not excluded: two workers that select the same
//! row before either commits both call the provider, and the last final
//! update wins.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::metrics::{self, StageTimer, PHASE_SEO, PHASE_TRANSLATE, STAGE_ENRICH};
use crate::provider::prompts::{enrichment_prompt, translation_prompt, SYSTEM_PROMPT};
use crate::provider::{decode_payload, ChatRequest, TextGenerator};
use crate::schemas::{Enrichment, NewsItem, SeoPayload, TranslationPayload, Validate};
use crate::slug::slugify;
use crate::storage::ItemStore;
use crate::text::{truncate_chars, truncate_html};

#[derive(Debug, Clone)]
pub enum EnrichOutcome {
    Enriched(NewsItem),
    /// Nothing eligible: no crawled candidate, or the requested id is not crawled
    NoWork,
}

#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    pub target_language: String,
    /// Cap on the translated HTML body
    pub content_char_limit: usize,
    /// Cap on the origin text sent to the provider
    pub source_char_limit: usize,
}

impl EnrichmentSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            target_language: config.target_language.clone(),
            content_char_limit: config.content_char_limit,
            source_char_limit: config.source_char_limit,
        }
    }
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct EnrichmentWorker {
    store: ItemStore,
    provider: Arc<dyn TextGenerator>,
    settings: EnrichmentSettings,
}

impl EnrichmentWorker {
    pub fn new(store: ItemStore, provider: Arc<dyn TextGenerator>, settings: EnrichmentSettings) -> Self {
        Self {
            store,
            provider,
            settings,
        }
    }

    /// Enriches the item with the given id, or the next eligible item.
    ///
    /// An explicit id only has to be crawled, so translated items can be
    /// reprocessed on demand.
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn enrich_one(&self, id: Option<i64>) -> Result<EnrichOutcome> {
        let _timer = StageTimer::new(STAGE_ENRICH);

        let Some(item) = self.store.select_for_enrichment(id).await? else {
            info!("No untranslated records found");
            metrics::record_enrich("no_work");
            return Ok(EnrichOutcome::NoWork);
        };

        match self.process(&item).await {
            Ok(enriched) => {
                info!(
                    item_id = enriched.id,
                    slug = enriched.slug_url.as_deref().unwrap_or_default(),
                    "Translation completed and record updated"
                );
                metrics::record_enrich("enriched");
                Ok(EnrichOutcome::Enriched(enriched))
            }
            Err(e) => {
                warn!(item_id = item.id, error = %e, "Enrichment failed");
                metrics::record_error(STAGE_ENRICH, e.kind());
                metrics::record_enrich("failed");
                Err(e)
            }
        }
    }

    async fn process(&self, item: &NewsItem) -> Result<NewsItem> {
        let title_en = item.title_en.as_deref().unwrap_or_default();
        let content_en = truncate_chars(
            item.content_en.as_deref().unwrap_or_default(),
            self.settings.source_char_limit,
        );

        // Phase 1: translate
        let request = ChatRequest::new(
            SYSTEM_PROMPT,
            translation_prompt(
                &self.settings.target_language,
                self.settings.content_char_limit,
                title_en,
                &content_en,
            ),
        );
        let translation: TranslationPayload = self.call(PHASE_TRANSLATE, item.id, &request).await?;

        let title_fa = translation.title_fa.trim().to_string();
        let content_fa = truncate_html(translation.content_fa.trim(), self.settings.content_char_limit).into_owned();
        // A published row keeps its copy consistent until the SEO phase succeeds
        if !item.is_translated {
            self.store.save_translation(item.id, &title_fa, &content_fa).await?;
        }

        // Phase 2: SEO and social copy
        let request = ChatRequest::new(
            SYSTEM_PROMPT,
            enrichment_prompt(&self.settings.target_language, &title_fa, &content_fa),
        );
        let seo: SeoPayload = self.call(PHASE_SEO, item.id, &request).await?;

        let seo_title = seo.seo_title.trim().to_string();
        let slug_url = derive_slug(&seo_title, &title_fa, &item.url_id);
        let enrichment = Enrichment {
            title_fa,
            content_fa,
            seo_title,
            seo_description: seo.seo_description.trim().to_string(),
            seo_keywords: seo.seo_keywords.joined(),
            summary: seo.summary.trim().to_string(),
            slug_url,
        };

        self.store
            .finalize_enrichment(item.id, &enrichment)
            .await?
            .ok_or(PipelineError::Database(sqlx::Error::RowNotFound))
    }

    /// One provider call: send, checkpoint the raw body, then parse it
    async fn call<T>(&self, phase: &'static str, item_id: i64, request: &ChatRequest) -> Result<T>
    where
        T: DeserializeOwned + Validate,
    {
        let raw = match self.provider.complete(request).await {
            Ok(raw) => raw,
            Err(e) => {
                metrics::record_provider_call(phase, "transport_error");
                return Err(e);
            }
        };

        self.store.checkpoint_raw_response(item_id, &raw).await?;

        let parsed = self
            .provider
            .message_text(&raw)
            .and_then(|message| decode_payload::<T>(&message));

        match parsed {
            Ok(payload) => {
                metrics::record_provider_call(phase, "ok");
                Ok(payload)
            }
            Err(e) => {
                warn!(item_id, phase, error = %e, "Provider response malformed; raw response kept");
                metrics::record_provider_call(phase, "malformed");
                Err(e)
            }
        }
    }
}

/// Slug from the SEO title, falling back to the translated title and
/// finally to the url fingerprint when both normalize to nothing.
///
/// The fingerprint is base64url, so `_` becomes a separator before it is
/// normalized like any title.
fn derive_slug(seo_title: &str, title_fa: &str, url_id: &str) -> String {
    [seo_title, title_fa]
        .into_iter()
        .map(slugify)
        .find(|slug| !slug.is_empty())
        .unwrap_or_else(|| slugify(&url_id.replace('_', "-")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{completion, seed_crawled, seo_completion, translation_completion, ScriptedGenerator};
    use crate::fingerprint::url_fingerprint;
    use crate::slug::is_slug_char;
    use crate::storage::InsertOutcome;

    fn worker(store: &ItemStore, provider: Arc<ScriptedGenerator>) -> EnrichmentWorker {
        EnrichmentWorker::new(store.clone(), provider, EnrichmentSettings::default())
    }

    #[tokio::test]
    async fn test_enrich_one_publishes_item() {
        let store = ItemStore::in_memory().await.unwrap();
        let id = seed_crawled(&store, "https://x/a").await;
        let provider = Arc::new(ScriptedGenerator::new(vec![
            Ok(translation_completion()),
            Ok(seo_completion()),
        ]));

        let outcome = worker(&store, provider.clone()).enrich_one(None).await.unwrap();
        let EnrichOutcome::Enriched(item) = outcome else {
            panic!("expected enrichment");
        };

        assert_eq!(item.id, id);
        assert!(item.is_translated);
        assert!(item.has_complete_enrichment());
        assert_eq!(item.title_fa.as_deref(), Some("بارسلونا قهرمان شد"));
        assert_eq!(item.seo_keywords.as_deref(), Some("بارسلونا, لالیگا"));
        assert_eq!(item.slug_url.as_deref(), Some("قهرمانی-بارسلونا-در-لیگ"));
        assert_eq!(item.raw_provider_response, Some(seo_completion()));
        assert_eq!(provider.calls(), 2);

        // The second call works on the translated text
        let requests = provider.requests();
        assert!(requests[0].user.contains("Barcelona win the league"));
        assert!(requests[1].user.contains("بارسلونا قهرمان شد"));
    }

    #[tokio::test]
    async fn test_uncrawled_item_is_no_work() {
        let store = ItemStore::in_memory().await.unwrap();
        store.insert_discovered("fp", "https://x/a").await.unwrap();
        let provider = Arc::new(ScriptedGenerator::new(vec![]));

        let outcome = worker(&store, provider.clone()).enrich_one(None).await.unwrap();
        assert!(matches!(outcome, EnrichOutcome::NoWork));

        let outcome = worker(&store, provider.clone()).enrich_one(Some(1)).await.unwrap();
        assert!(matches!(outcome, EnrichOutcome::NoWork));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_one_item_per_invocation() {
        let store = ItemStore::in_memory().await.unwrap();
        let first = seed_crawled(&store, "https://x/a").await;
        let second = seed_crawled(&store, "https://x/b").await;
        let provider = Arc::new(ScriptedGenerator::new(vec![
            Ok(translation_completion()),
            Ok(seo_completion()),
        ]));

        worker(&store, provider.clone()).enrich_one(None).await.unwrap();

        assert!(store.get(first).await.unwrap().unwrap().is_translated);
        let untouched = store.get(second).await.unwrap().unwrap();
        assert!(!untouched.is_translated);
        assert!(untouched.raw_provider_response.is_none());
        assert!(untouched.title_fa.is_none());
    }

    #[tokio::test]
    async fn test_malformed_translation_keeps_raw_text() {
        let store = ItemStore::in_memory().await.unwrap();
        let id = seed_crawled(&store, "https://x/a").await;
        let provider = Arc::new(ScriptedGenerator::new(vec![Ok("I cannot help with that".to_string())]));

        let err = worker(&store, provider.clone()).enrich_one(None).await.unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(provider.calls(), 1);

        let item = store.get(id).await.unwrap().unwrap();
        assert_eq!(item.raw_provider_response.as_deref(), Some("I cannot help with that"));
        assert!(!item.is_translated);
        assert!(item.title_fa.is_none());
        assert!(item.seo_title.is_none());
    }

    #[tokio::test]
    async fn test_malformed_payload_inside_envelope() {
        let store = ItemStore::in_memory().await.unwrap();
        let id = seed_crawled(&store, "https://x/a").await;
        let raw = completion(r#"{"title": "missing the expected fields"}"#);
        let provider = Arc::new(ScriptedGenerator::new(vec![Ok(raw.clone())]));

        let err = worker(&store, provider).enrich_one(None).await.unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(store.get(id).await.unwrap().unwrap().raw_provider_response, Some(raw));
    }

    #[tokio::test]
    async fn test_translate_transport_failure_writes_nothing() {
        let store = ItemStore::in_memory().await.unwrap();
        let id = seed_crawled(&store, "https://x/a").await;
        let provider = Arc::new(ScriptedGenerator::new(vec![Err(PipelineError::ApiError {
            code: "500 Internal Server Error".to_string(),
            message: "boom".to_string(),
        })]));

        let err = worker(&store, provider.clone()).enrich_one(None).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(provider.calls(), 1);

        let item = store.get(id).await.unwrap().unwrap();
        assert!(item.raw_provider_response.is_none());
        assert!(item.title_fa.is_none());
        assert!(item.seo_title.is_none() && item.summary.is_none() && item.slug_url.is_none());
        assert!(!item.is_translated);

        // Still eligible for the next invocation
        assert_eq!(store.select_for_enrichment(None).await.unwrap().unwrap().id, id);
    }

    #[tokio::test]
    async fn test_seo_failure_keeps_intermediate_translation() {
        let store = ItemStore::in_memory().await.unwrap();
        let id = seed_crawled(&store, "https://x/a").await;
        let provider = Arc::new(ScriptedGenerator::new(vec![
            Ok(translation_completion()),
            Ok(completion("not json at all")),
        ]));

        let err = worker(&store, provider).enrich_one(None).await.unwrap_err();
        assert!(err.is_malformed());

        let item = store.get(id).await.unwrap().unwrap();
        assert_eq!(item.title_fa.as_deref(), Some("بارسلونا قهرمان شد"));
        assert!(item.seo_title.is_none());
        assert!(!item.is_translated);
        assert!(item.published_at.is_none());
        assert_eq!(item.raw_provider_response, Some(completion("not json at all")));
    }

    #[tokio::test]
    async fn test_failed_reprocess_leaves_published_copy_intact() {
        let store = ItemStore::in_memory().await.unwrap();
        let id = seed_crawled(&store, "https://x/a").await;
        let retranslation = completion(
            &serde_json::json!({"title_fa": "عنوان تازه", "content_fa": "<p>متن تازه</p>"}).to_string(),
        );
        let provider = Arc::new(ScriptedGenerator::new(vec![
            Ok(translation_completion()),
            Ok(seo_completion()),
            Ok(retranslation),
            Ok(completion("not json at all")),
        ]));
        let worker = worker(&store, provider);

        let EnrichOutcome::Enriched(published) = worker.enrich_one(None).await.unwrap() else {
            panic!("expected enrichment");
        };
        assert!(worker.enrich_one(Some(id)).await.unwrap_err().is_malformed());

        let item = store.get(id).await.unwrap().unwrap();
        assert!(item.is_translated);
        assert_eq!(item.title_fa, published.title_fa);
        assert_eq!(item.content_fa, published.content_fa);
        assert_eq!(item.slug_url, published.slug_url);
    }

    #[tokio::test]
    async fn test_explicit_id_reprocesses_translated_item() {
        let store = ItemStore::in_memory().await.unwrap();
        let id = seed_crawled(&store, "https://x/a").await;
        let provider = Arc::new(ScriptedGenerator::new(vec![
            Ok(translation_completion()),
            Ok(seo_completion()),
            Ok(translation_completion()),
            Ok(seo_completion()),
        ]));
        let worker = worker(&store, provider.clone());

        worker.enrich_one(None).await.unwrap();
        assert!(matches!(worker.enrich_one(None).await.unwrap(), EnrichOutcome::NoWork));
        assert!(matches!(worker.enrich_one(Some(id)).await.unwrap(), EnrichOutcome::Enriched(_)));
        assert_eq!(provider.calls(), 4);
    }

    #[tokio::test]
    async fn test_translated_body_is_capped() {
        let store = ItemStore::in_memory().await.unwrap();
        seed_crawled(&store, "https://x/a").await;
        let long_body = format!("<p>{}</p>", "کلمه ".repeat(2000));
        let translation = completion(
            &serde_json::json!({"title_fa": "عنوان", "content_fa": long_body}).to_string(),
        );
        let provider = Arc::new(ScriptedGenerator::new(vec![Ok(translation), Ok(seo_completion())]));

        let EnrichOutcome::Enriched(item) = worker(&store, provider).enrich_one(None).await.unwrap() else {
            panic!("expected enrichment");
        };
        let content_fa = item.content_fa.unwrap();
        assert!(content_fa.chars().count() <= 3000);
        assert!(content_fa.ends_with("…</p>"));
    }

    #[tokio::test]
    async fn test_concurrent_selection_is_not_excluded() {
        // Two invocations that select before either commits see the same row
        let store = ItemStore::in_memory().await.unwrap();
        let id = seed_crawled(&store, "https://x/a").await;

        let a = store.select_for_enrichment(None).await.unwrap().unwrap();
        let b = store.select_for_enrichment(None).await.unwrap().unwrap();
        assert_eq!(a.id, id);
        assert_eq!(b.id, id);
    }

    #[test]
    fn test_derive_slug_fallbacks() {
        assert_eq!(derive_slug("تیتر خبر", "عنوان", "AbC"), "تیتر-خبر");
        assert_eq!(derive_slug("!!!", "عنوان خبر", "AbC"), "عنوان-خبر");
        assert_eq!(derive_slug("!!!", "؟", "AbC_-9"), "abc-9");
    }

    #[test]
    fn test_fingerprint_fallback_stays_in_allow_list() {
        for i in 0..200 {
            let url_id = url_fingerprint(&format!("https://x/{}", i));
            let slug = derive_slug("", "", &url_id);
            assert!(!slug.is_empty());
            assert!(slug.chars().all(is_slug_char), "{:?} -> {:?}", url_id, slug);
        }
    }

    #[tokio::test]
    async fn test_unknown_id_is_no_work() {
        let store = ItemStore::in_memory().await.unwrap();
        assert!(matches!(
            store.insert_discovered("fp", "https://x/a").await.unwrap(),
            InsertOutcome::Inserted(_)
        ));
        let provider = Arc::new(ScriptedGenerator::new(vec![]));
        let outcome = worker(&store, provider).enrich_one(Some(99)).await.unwrap();
        assert!(matches!(outcome, EnrichOutcome::NoWork));
    }
}
