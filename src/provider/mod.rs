//! Text-generation provider
//!
//! The enrichment worker sees the provider through `TextGenerator`. A call
//! returns the raw response body untouched so the caller can checkpoint it
//! before anything is parsed.

pub mod openai;
pub mod prompts;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::schemas::Validate;

pub use openai::OpenAiProvider;

/// A chat-style request: one system message and one user message
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends the request and returns the raw response body of a 2xx answer.
    /// Transport failures and non-2xx statuses are errors.
    async fn complete(&self, request: &ChatRequest) -> Result<String>;

    /// Extracts the assistant message text from a raw response body.
    /// The default understands the chat-completions envelope.
    fn message_text(&self, raw: &str) -> Result<String> {
        chat_completion_text(raw)
    }

    /// Provider name for logs and metrics
    fn name(&self) -> &'static str;
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// `choices[0].message.content` of a chat-completions response body
pub fn chat_completion_text(raw: &str) -> Result<String> {
    let completion: ChatCompletion = serde_json::from_str(raw)
        .map_err(|e| PipelineError::MalformedResponse(format!("response is not a chat completion: {}", e)))?;

    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| PipelineError::MalformedResponse("response has no message content".to_string()))
}

/// Decodes the structured payload carried in a message, tolerating a
/// surrounding Markdown code fence.
pub fn decode_payload<T>(message: &str) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let payload: T = serde_json::from_str(strip_code_fence(message))
        .map_err(|e| PipelineError::MalformedResponse(format!("payload is not the expected JSON: {}", e)))?;
    payload.validate()?;
    Ok(payload)
}

fn strip_code_fence(message: &str) -> &str {
    let trimmed = message.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::TranslationPayload;

    fn envelope(content: &str) -> String {
        serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    #[test]
    fn test_chat_completion_text() {
        let raw = envelope(r#"{"title_fa":"a","content_fa":"b"}"#);
        assert_eq!(chat_completion_text(&raw).unwrap(), r#"{"title_fa":"a","content_fa":"b"}"#);
    }

    #[test]
    fn test_non_json_body_is_malformed() {
        let err = chat_completion_text("upstream said no").unwrap_err();
        assert!(err.is_malformed());

        let err = chat_completion_text(r#"{"choices": []}"#).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_decode_payload_with_fence() {
        let message = "```json\n{\"title_fa\": \"عنوان\", \"content_fa\": \"<p>متن</p>\"}\n```";
        let payload: TranslationPayload = decode_payload(message).unwrap();
        assert_eq!(payload.title_fa, "عنوان");
    }

    #[test]
    fn test_decode_payload_rejects_wrong_shape() {
        let err = decode_payload::<TranslationPayload>(r#"{"title": "x"}"#).unwrap_err();
        assert!(err.is_malformed());

        let err = decode_payload::<TranslationPayload>("Sure! Here is your translation").unwrap_err();
        assert!(err.is_malformed());
    }
}
