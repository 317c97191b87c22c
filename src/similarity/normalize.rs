// Text preparation applied before comparison.

/// Full normalization, in order: lowercase, collapse whitespace runs to a
/// single space, trim, then drop every character that is neither
/// alphanumeric nor whitespace.
///
/// Punctuation goes last, so the spaces around it survive: "a - b" becomes
/// "a  b", and trailing punctuation can leave a trailing space.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Light preparation: lowercase and trim, punctuation and inner spacing kept.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_punctuation_case_space() {
        assert_eq!(normalize("  Hello,   World! "), "hello world");
    }

    #[test]
    fn test_normalize_punctuation_dropped_after_collapse() {
        assert_eq!(normalize("a - b"), "a  b");
        assert_eq!(normalize("  wait , what  "), "wait  what");
        assert_eq!(normalize("end !"), "end ");
    }

    #[test]
    fn test_normalize_keeps_unicode_letters_and_digits() {
        assert_eq!(normalize("Café N°5"), "café n5");
    }

    #[test]
    fn test_normalize_tabs_and_newlines() {
        assert_eq!(normalize("a\t\tb\nc"), "a b c");
    }

    #[test]
    fn test_normalize_only_punctuation() {
        assert_eq!(normalize("?!...,"), "");
    }

    #[test]
    fn test_fold_case_keeps_punctuation() {
        assert_eq!(fold_case("  Hello, World! "), "hello, world!");
    }
}
