//! Telegram Bot API client
//!
//! Uses `sendPhoto` when the post carries an image and `sendMessage`
//! otherwise, both with HTML parse mode and an optional inline URL button.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{LinkButton, Messenger, OutboundPost};
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::http_client::ensure_success;

#[derive(Debug, Serialize)]
struct InlineKeyboard<'a> {
    inline_keyboard: [[&'a LinkButton; 1]; 1],
}

#[derive(Debug, Serialize)]
struct SendPhoto<'a> {
    chat_id: &'a str,
    photo: &'a str,
    caption: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboard<'a>>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboard<'a>>,
}

pub struct TelegramMessenger {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramMessenger {
    pub fn new(client: Client, api_base: &str, bot_token: String, chat_id: String) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token,
            chat_id,
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Result<Self> {
        let bot_token = config
            .telegram_bot_token
            .clone()
            .ok_or(PipelineError::MissingSetting("telegram_bot_token"))?;
        let chat_id = config
            .telegram_chat_id
            .clone()
            .ok_or(PipelineError::MissingSetting("telegram_chat_id"))?;

        Ok(Self::new(client, &config.telegram_api_base, bot_token, chat_id))
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, post: &OutboundPost) -> Result<serde_json::Value> {
        let reply_markup = post.button.as_ref().map(|button| InlineKeyboard {
            inline_keyboard: [[button]],
        });

        let request = match post.photo_url.as_deref() {
            Some(photo) => {
                debug!(chat_id = %self.chat_id, "Sending photo post");
                self.client.post(self.method_url("sendPhoto")).json(&SendPhoto {
                    chat_id: &self.chat_id,
                    photo,
                    caption: &post.caption,
                    parse_mode: "HTML",
                    reply_markup,
                })
            }
            None => {
                debug!(chat_id = %self.chat_id, "Sending text post");
                self.client.post(self.method_url("sendMessage")).json(&SendMessage {
                    chat_id: &self.chat_id,
                    text: &post.caption,
                    parse_mode: "HTML",
                    reply_markup,
                })
            }
        };

        let response = ensure_success(request.send().await?).await?;
        let body: serde_json::Value = response.json().await?;
        Ok(body)
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_token_and_chat() {
        let mut config = Config::default();
        assert!(matches!(
            TelegramMessenger::from_config(Client::new(), &config),
            Err(PipelineError::MissingSetting("telegram_bot_token"))
        ));

        config.telegram_bot_token = Some("123:abc".to_string());
        assert!(matches!(
            TelegramMessenger::from_config(Client::new(), &config),
            Err(PipelineError::MissingSetting("telegram_chat_id"))
        ));

        config.telegram_chat_id = Some("@channel".to_string());
        let messenger = TelegramMessenger::from_config(Client::new(), &config).unwrap();
        assert_eq!(
            messenger.method_url("sendPhoto"),
            "https://api.telegram.org/bot123:abc/sendPhoto"
        );
    }

    #[test]
    fn test_photo_payload_shape() {
        let button = LinkButton {
            text: "مشاهده بیشتر".to_string(),
            url: "https://example.com/a".to_string(),
        };
        let payload = SendPhoto {
            chat_id: "@channel",
            photo: "https://example.com/a.jpg",
            caption: "<b>t</b>",
            parse_mode: "HTML",
            reply_markup: Some(InlineKeyboard { inline_keyboard: [[&button]] }),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["parse_mode"], "HTML");
        assert_eq!(json["reply_markup"]["inline_keyboard"][0][0]["url"], "https://example.com/a");
    }
}
