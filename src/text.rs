//! Text helpers shared by enrichment, notification and the sitemap

use std::borrow::Cow;

const ELLIPSIS: char = '…';

/// Caps `text` at `limit` characters (not bytes).
///
/// Cuts back to the last whitespace when one is close to the limit, drops a
/// dangling unterminated `<tag` and marks the cut with an ellipsis. The
/// result never exceeds `limit` characters. Elements left open by the cut
/// stay open; markup goes through [`truncate_html`].
pub fn truncate_chars(text: &str, limit: usize) -> Cow<'_, str> {
    if text.chars().count() <= limit {
        return Cow::Borrowed(text);
    }
    if limit == 0 {
        return Cow::Borrowed("");
    }

    let keep = limit - 1;
    let end = text
        .char_indices()
        .nth(keep)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let mut cut = &text[..end];

    // Prefer a word boundary within the last fifth of the kept text
    if let Some(space) = cut.rfind(char::is_whitespace) {
        if cut[..space].chars().count() >= keep - keep / 5 {
            cut = &cut[..space];
        }
    }

    // Never leave half a tag behind
    if let Some(open) = cut.rfind('<') {
        if cut[open..].find('>').is_none() {
            cut = &cut[..open];
        }
    }

    let mut truncated = cut.trim_end().to_string();
    truncated.push(ELLIPSIS);
    Cow::Owned(truncated)
}

/// Elements that never take a closing tag
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

/// Caps an HTML fragment at `limit` characters like [`truncate_chars`], then
/// closes every element the cut left open. The closing tags count towards
/// the limit, so the text is cut shorter until both fit.
pub fn truncate_html(html: &str, limit: usize) -> Cow<'_, str> {
    if html.chars().count() <= limit {
        return Cow::Borrowed(html);
    }

    let mut budget = limit;
    loop {
        let cut = truncate_chars(html, budget);
        let closers = closing_tags(&cut);
        let total = cut.chars().count() + closers.chars().count();
        if total <= limit || budget == 0 {
            return Cow::Owned(format!("{}{}", cut, closers));
        }
        budget = budget.saturating_sub(total - limit);
    }
}

/// Closing tags, innermost first, for the elements still open at the end of `html`
fn closing_tags(html: &str) -> String {
    let mut open: Vec<String> = Vec::new();
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        let tag = &rest[start + 1..start + len];
        rest = &rest[start + len + 1..];

        let (closing, body) = match tag.strip_prefix('/') {
            Some(body) => (true, body),
            None => (false, tag),
        };
        let name: String = body
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        if name.is_empty() {
            // Comments, doctypes and stray brackets
            continue;
        }

        if closing {
            if let Some(pos) = open.iter().rposition(|n| *n == name) {
                open.truncate(pos);
            }
        } else if !tag.ends_with('/') && !VOID_ELEMENTS.contains(&name.as_str()) {
            open.push(name);
        }
    }

    open.iter().rev().map(|name| format!("</{}>", name)).collect()
}

/// Escapes the characters that are significant in HTML and XML text
pub fn escape_markup(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
