//! Cleanup of raw endpoint output
//!
//! The hosted chat endpoint sometimes leaks its role tag (`assistant`) into the
//! generated text. Callers go through [`clean_generated_text`] so a stricter
//! response contract can replace the substring match in one place.

/// Role tag leaked by the endpoint
pub const ROLE_MARKER: &str = "assistant";

/// Strip every occurrence of the role marker, then trim surrounding whitespace
///
/// Removal repeats until no occurrence remains, so the result never contains
/// the marker and cleaning is idempotent.
pub fn clean_generated_text(raw: &str) -> String {
    let mut text = raw.replace(ROLE_MARKER, "");
    while text.contains(ROLE_MARKER) {
        text = text.replace(ROLE_MARKER, "");
    }
    text.trim().to_string()
}

/// Whitespace-delimited token count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_leading_marker() {
        assert_eq!(clean_generated_text("assistant\n\nChapter body"), "Chapter body");
    }

    #[test]
    fn test_strips_every_occurrence() {
        assert_eq!(
            clean_generated_text("  the assistant said assistant things "),
            "the  said  things"
        );
    }

    #[test]
    fn test_nested_marker_is_fully_removed() {
        let cleaned = clean_generated_text("assisassistanttant hello");
        assert_eq!(cleaned, "hello");
        assert!(!cleaned.contains(ROLE_MARKER));
    }

    #[test]
    fn test_marker_only_cleans_to_empty() {
        assert_eq!(clean_generated_text(" assistant \n"), "");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("one"), 1);
        assert_eq!(word_count("  one\ttwo\n\nthree  "), 3);
    }

    proptest! {
        #[test]
        fn prop_cleanup_is_idempotent(raw in "(assistant|assis|tant|[ a-zA-Z\n\t]){0,40}") {
            let once = clean_generated_text(&raw);
            let twice = clean_generated_text(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_cleaned_text_has_no_marker_or_outer_whitespace(raw in "\\PC{0,80}") {
            let cleaned = clean_generated_text(&raw);
            prop_assert!(!cleaned.contains(ROLE_MARKER));
            prop_assert_eq!(cleaned.trim(), cleaned.as_str());
        }
    }
}
