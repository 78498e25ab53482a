//! Slug derivation for published items
//!
//! Slugs are derived from the SEO title and never edited by hand. No
//! uniqueness is enforced here: two titles that normalize to the same token
//! share a slug, and links stay unambiguous because they also carry the id.

/// Arabic-script letters (hamza through yeh) as used by Persian
const ARABIC_LETTERS: std::ops::RangeInclusive<char> = '\u{0621}'..='\u{064A}';

/// Extended Arabic-Indic digits (۰-۹)
const PERSIAN_DIGITS: std::ops::RangeInclusive<char> = '\u{06F0}'..='\u{06F9}';

/// Persian letters outside the basic Arabic block: پ چ ژ ک گ ی
const PERSIAN_EXTRA_LETTERS: [char; 6] = ['\u{067E}', '\u{0686}', '\u{0698}', '\u{06A9}', '\u{06AF}', '\u{06CC}'];

/// Tatweel, the Arabic-script elongation mark; treated like a dash
const TATWEEL: char = '\u{0640}';

/// Returns true for characters that may appear in a slug
pub fn is_slug_char(c: char) -> bool {
    c.is_ascii_lowercase()
        || c.is_ascii_digit()
        || c == '-'
        || (ARABIC_LETTERS.contains(&c) && c != TATWEEL)
        || PERSIAN_DIGITS.contains(&c)
        || PERSIAN_EXTRA_LETTERS.contains(&c)
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '-' || c == TATWEEL
}

/// Normalizes a title into a URL-safe token.
///
/// Lowercases and trims the input, turns every run of whitespace, dashes and
/// tatweels into a single dash, and drops every character outside the
/// allow-list (Persian letters and digits, ASCII lowercase letters and digits,
/// dash). Leading and trailing dashes are removed.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.trim().to_lowercase().chars() {
        if is_separator(c) {
            pending_dash = true;
        } else if is_slug_char(c) {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        }
    }

    slug
}
