//! Prompt templates for the two provider calls

pub const SYSTEM_PROMPT: &str =
    "You are a translator. Always respond with valid JSON and nothing else.";

/// Translate phase: origin title and body in, translated title and HTML body out
pub fn translation_prompt(language: &str, char_limit: usize, title: &str, content: &str) -> String {
    format!(
        r#"Translate the following news article into {language}. Return the result as a JSON object with exactly these fields:
- title_fa: the translated title
- content_fa: the translated body, formatted in HTML with <p>, <h2>, <strong> and other tags for readability, at most {char_limit} characters

Ensure the response is valid JSON with no extra text or formatting. If the content exceeds {char_limit} characters, shorten it while keeping readability and context. Here is the article:
{title}
{content}"#
    )
}

/// Enrichment phase: translated title and body in, SEO fields and a short post out
pub fn enrichment_prompt(language: &str, title: &str, content: &str) -> String {
    format!(
        r#"Using the following {language} news article, write search and social metadata in {language}. Return the result as a JSON object with exactly these fields:
- seo_title: a concise search-engine title
- seo_description: a meta description of at most 160 characters
- seo_keywords: an array of 3 to 8 keywords
- summary: a very short, friendly summary written in an engaging tone for a Telegram post

Ensure the response is valid JSON with no extra text or formatting. Here is the article:
{title}
{content}"#
    )
}
