//! Text helpers shared by acquisition and analysis.
//!
//! [`normalize_comment_text`] defines the matching key stored on every
//! comment, so its output must stay stable across releases.

use unicode_normalization::UnicodeNormalization;

/// Pictographic ranges kept through normalization. Repeated emoji reactions
/// are a large share of comment memes.
fn is_emoji(c: char) -> bool {
    matches!(c, '\u{1F300}'..='\u{1FAFF}' | '\u{2600}'..='\u{27BF}')
}

/// Normalize comment text into its matching key.
///
/// NFKC-normalizes, lowercases, drops punctuation and symbols (emoji are
/// kept), and collapses runs of whitespace to a single space.
#[must_use]
pub fn normalize_comment_text(text: &str) -> String {
    let folded: String = text
        .nfkc()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace() || is_emoji(*c))
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical form of a stored hashtag: trimmed, lowercased, leading `#`
/// removed. `None` when nothing is left.
///
/// Term statistics and example lookups both key on this form.
#[must_use]
pub fn normalize_hashtag(tag: &str) -> Option<String> {
    let tag = tag.trim().trim_start_matches('#').to_lowercase();
    (!tag.is_empty()).then_some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_strips_punctuation() {
        assert_eq!(normalize_comment_text("Hello, WORLD!!"), "hello world");
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_comment_text("  very \t demure\n  "), "very demure");
    }

    #[test]
    fn normalize_keeps_emoji() {
        assert_eq!(normalize_comment_text("First 🔥!!"), "first 🔥");
        assert_eq!(normalize_comment_text("first   🔥"), "first 🔥");
    }

    #[test]
    fn normalize_folds_compatibility_forms() {
        assert_eq!(normalize_comment_text("ＡＢＣ"), "abc");
    }

    #[test]
    fn normalize_empty_is_empty() {
        assert_eq!(normalize_comment_text("?!..."), "");
    }

    #[test]
    fn normalize_hashtag_strips_marker_and_case() {
        assert_eq!(normalize_hashtag("#Cats").as_deref(), Some("cats"));
        assert_eq!(normalize_hashtag(" ##FYP ").as_deref(), Some("fyp"));
        assert_eq!(normalize_hashtag("cats").as_deref(), Some("cats"));
        assert_eq!(normalize_hashtag("#"), None);
    }
}
