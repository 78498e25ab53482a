//! Messaging channel
//!
//! The notifier posts through `Messenger`. Implementations report transport
//! success only: a 2xx answer is returned as-is, whatever its payload says.

pub mod telegram;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

pub use telegram::TelegramMessenger;

/// Inline URL button rendered under a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkButton {
    pub text: String,
    pub url: String,
}

/// A post for the destination channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPost {
    /// Image to attach; text-only post when absent
    pub photo_url: Option<String>,
    /// HTML-formatted caption
    pub caption: String,
    pub button: Option<LinkButton>,
}

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends a post and returns the provider's full response body
    async fn send(&self, post: &OutboundPost) -> Result<serde_json::Value>;

    /// Messenger name for logs and metrics
    fn name(&self) -> &'static str;
}
