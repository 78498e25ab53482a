//! In-process fakes for the pipeline's outbound collaborators

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{PipelineError, Result};
use crate::messaging::{Messenger, OutboundPost};
use crate::provider::{ChatRequest, TextGenerator};
use crate::schemas::{CrawledContent, FeedDocument, FeedEntry};
use crate::sources::{FeedSource, SourceMetadata};
use crate::storage::{InsertOutcome, ItemStore};

/// Chat-completions envelope around `content`
pub fn completion(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

pub fn translation_completion() -> String {
    completion(r#"{"title_fa": "بارسلونا قهرمان شد", "content_fa": "<p>متن خبر</p>"}"#)
}

pub fn seo_completion() -> String {
    completion(
        r#"{"seo_title": "قهرمانی بارسلونا در لیگ", "seo_description": "گزارش قهرمانی", "seo_keywords": ["بارسلونا", "لالیگا"], "summary": "بارسا قهرمان شد!"}"#,
    )
}

/// Replays scripted responses in order and records every request
#[derive(Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PipelineError::ApiError {
                code: "500".to_string(),
                message: "no scripted response".to_string(),
            }))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Records posts; fails every send when `fail` is set
#[derive(Default)]
pub struct RecordingMessenger {
    pub fail: bool,
    pub response: Option<serde_json::Value>,
    sent: Mutex<Vec<OutboundPost>>,
}

impl RecordingMessenger {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    /// Answers every send with `response` instead of a success envelope
    pub fn responding(response: serde_json::Value) -> Self {
        Self { response: Some(response), ..Default::default() }
    }

    pub fn sent(&self) -> Vec<OutboundPost> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, post: &OutboundPost) -> Result<serde_json::Value> {
        if self.fail {
            return Err(PipelineError::ApiError {
                code: "502 Bad Gateway".to_string(),
                message: "telegram unreachable".to_string(),
            });
        }
        let message_id = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(post.clone());
            sent.len()
        };
        Ok(self.response.clone().unwrap_or_else(|| {
            serde_json::json!({"ok": true, "result": {"message_id": message_id}})
        }))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Serves a fixed list of URLs, or fails when `urls` is `None`
pub struct FixedFeed {
    metadata: SourceMetadata,
    urls: Option<Vec<String>>,
}

impl FixedFeed {
    pub fn new(urls: &[&str]) -> Self {
        Self {
            metadata: SourceMetadata {
                id: "fixed".to_string(),
                name: "Fixed feed".to_string(),
                url: "memory://feed".to_string(),
            },
            urls: Some(urls.iter().map(|u| u.to_string()).collect()),
        }
    }

    pub fn unreachable() -> Self {
        Self { urls: None, ..Self::new(&[]) }
    }
}

#[async_trait]
impl FeedSource for FixedFeed {
    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    async fn fetch(&self) -> Result<FeedDocument> {
        let urls = self.urls.clone().ok_or_else(|| PipelineError::ApiError {
            code: "503 Service Unavailable".to_string(),
            message: "feed down".to_string(),
        })?;
        Ok(FeedDocument {
            items: urls
                .into_iter()
                .map(|url| FeedEntry { url: Some(url), title: None })
                .collect(),
        })
    }
}

/// Inserts `url` and marks it crawled with English origin text
pub async fn seed_crawled(store: &ItemStore, url: &str) -> i64 {
    let InsertOutcome::Inserted(id) = store
        .insert_discovered(&crate::fingerprint::url_fingerprint(url), url)
        .await
        .unwrap()
    else {
        panic!("{} already stored", url);
    };
    store
        .mark_crawled(
            id,
            &CrawledContent {
                title_en: "Barcelona win the league".to_string(),
                content_en: "Barcelona clinched the title on Sunday.".to_string(),
                photo_url: Some(format!("{}/photo.jpg", url)),
            },
        )
        .await
        .unwrap();
    id
}
