//! URL fingerprinting
//!
//! Every feed entry is keyed by a short digest of its source URL. The store
//! enforces uniqueness on this key, which is what makes re-running a feed
//! idempotent.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Length of the fingerprint kept in the `url_id` column
pub const FINGERPRINT_LEN: usize = 16;

/// Computes the `url_id` of a source URL:
/// base64url(SHA-256(url)) without padding, truncated to 16 characters.
///
/// The URL is hashed verbatim. Two spellings of the same page produce two
/// different fingerprints.
pub fn url_fingerprint(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut encoded = URL_SAFE_NO_PAD.encode(digest);
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = url_fingerprint("https://x/a");
        let b = url_fingerprint("https://x/a");
        let c = url_fingerprint("https://x/b");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), FINGERPRINT_LEN);
    }

    #[test]
    fn test_fingerprint_alphabet() {
        for url in ["https://example.com/news/1", "", "https://example.com/?q=ü&x=1"] {
            let id = url_fingerprint(url);
            assert!(id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }

    #[test]
    fn test_known_digest() {
        // SHA-256("") = e3b0c442...; its base64url form starts with "47DEQpj8HBSa-_TI"
        assert_eq!(url_fingerprint(""), "47DEQpj8HBSa-_TI");
    }
}
