//! Small pure text helpers shared by the engine and transport.

/// Whether a buffer contains nothing worth formatting or importing.
#[must_use]
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Shorten server-provided text for a single-line notice.
///
/// - Collapses every whitespace run (including newlines) into one space.
/// - Counts `char`s, never bytes, so multi-byte text is not split.
/// - Appends `...` when shortened; `max` below 4 still leaves one char of content.
#[must_use]
pub fn excerpt(raw: &str, max: usize) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let max = max.max(4);
    if collapsed.chars().count() <= max {
        return collapsed;
    }
    let head: String = collapsed.chars().take(max - 3).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::{excerpt, is_blank};

    #[test]
    fn blank_detects_whitespace_only() {
        assert!(is_blank(""));
        assert!(is_blank("  \n\t "));
        assert!(!is_blank(" a "));
    }

    #[test]
    fn excerpt_short_string_unchanged() {
        assert_eq!(excerpt("forbidden", 20), "forbidden");
    }

    #[test]
    fn excerpt_collapses_whitespace() {
        assert_eq!(excerpt("<h1>\n  Bad   request\n</h1>", 40), "<h1> Bad request </h1>");
    }

    #[test]
    fn excerpt_adds_ellipsis() {
        assert_eq!(excerpt("internal server error", 11), "internal...");
    }

    #[test]
    fn excerpt_counts_chars_not_bytes() {
        let result = excerpt("ééééééééééé", 6);
        assert_eq!(result, "ééé...");
    }
}
