//! News relay
//!
//! Pulls a JSON news feed into SQLite, translates and enriches crawled items
//! through a chat-completions provider, posts them to a Telegram channel and
//! serves the published items over HTTP.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod http_client;
pub mod messaging;
pub mod metrics;
pub mod pipeline;
pub mod provider;
pub mod publication;
pub mod schemas;
pub mod server;
pub mod sitemap;
pub mod slug;
pub mod sources;
pub mod storage;
pub mod text;
