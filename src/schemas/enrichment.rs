//! Structured payloads returned by the text-generation provider
//!
//! Both phases must come back as JSON objects. Missing or empty fields make
//! the whole payload malformed.

use serde::Deserialize;

use crate::error::{PipelineError, Result};

/// Output of the translate call
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TranslationPayload {
    pub title_fa: String,
    pub content_fa: String,
}

/// Output of the SEO / social enrichment call
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SeoPayload {
    pub seo_title: String,
    pub seo_description: String,
    pub seo_keywords: Keywords,
    pub summary: String,
}

/// Keywords arrive either as a JSON array or as one comma-separated string
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Keywords {
    List(Vec<String>),
    Text(String),
}

impl Keywords {
    /// Normalized comma-separated form stored in `seo_keywords`
    pub fn joined(&self) -> String {
        let parts: Vec<&str> = match self {
            Keywords::List(list) => list.iter().map(|k| k.trim()).collect(),
            Keywords::Text(text) => text.split([',', '،']).map(|k| k.trim()).collect(),
        };
        parts
            .into_iter()
            .filter(|k| !k.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Payloads that can reject blank fields after decoding
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PipelineError::MalformedResponse(format!("empty field `{}`", field)));
    }
    Ok(())
}

impl Validate for TranslationPayload {
    fn validate(&self) -> Result<()> {
        require("title_fa", &self.title_fa)?;
        require("content_fa", &self.content_fa)
    }
}

impl Validate for SeoPayload {
    fn validate(&self) -> Result<()> {
        require("seo_title", &self.seo_title)?;
        require("seo_description", &self.seo_description)?;
        require("seo_keywords", &self.seo_keywords.joined())?;
        require("summary", &self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_forms() {
        let list: Keywords = serde_json::from_str(r#"["بارسا", " لالیگا ", ""]"#).unwrap();
        assert_eq!(list.joined(), "بارسا, لالیگا");

        let text: Keywords = serde_json::from_str(r#""بارسا، لالیگا, فوتبال""#).unwrap();
        assert_eq!(text.joined(), "بارسا, لالیگا, فوتبال");
    }

    #[test]
    fn test_blank_field_is_malformed() {
        let payload = TranslationPayload {
            title_fa: "عنوان".to_string(),
            content_fa: "  ".to_string(),
        };
        assert!(matches!(payload.validate(), Err(PipelineError::MalformedResponse(_))));
    }

    #[test]
    fn test_seo_payload_decodes() {
        let payload: SeoPayload = serde_json::from_value(serde_json::json!({
            "seo_title": "تیتر",
            "seo_description": "توضیح",
            "seo_keywords": ["a", "b"],
            "summary": "خلاصه"
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.seo_keywords.joined(), "a, b");
    }
}
