//! Input normalization applied before summarization.

/// Strip leading and trailing whitespace from caller text.
///
/// Never fails; a blank result is the caller's validation concern.
pub fn preprocess_text(raw: &str) -> String {
    raw.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::preprocess_text;

    #[test]
    fn trims_surrounding_whitespace_only() {
        assert_eq!(
            preprocess_text("   This is a test text.   "),
            "This is a test text."
        );
        assert_eq!(preprocess_text("\n\tline one\nline two \r\n"), "line one\nline two");
    }

    #[test]
    fn whitespace_only_input_becomes_empty() {
        assert_eq!(preprocess_text(""), "");
        assert_eq!(preprocess_text(" \n\t "), "");
    }
}
