use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Dictionary-style ordering. Letters compare without accents or case first
/// ("eclair" < "Ödem" < "zebra"); ties go to the unaccented spelling, then to
/// the lowercase one ("eclair" < "éclair", "apple" < "Apple").
pub fn cmp_locale(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| decomposed(a).cmp(&decomposed(b)))
        .then_with(|| b.nfc().cmp(a.nfc()))
}

fn base_letters(s: &str) -> Vec<char> {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn decomposed(s: &str) -> Vec<char> {
    s.nfd().flat_map(char::to_lowercase).collect()
}

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmp_locale_ignores_case_first() {
        let mut terms = vec!["banana", "Apple", "cherry", "apple", "Banana"];
        terms.sort_by(|a, b| cmp_locale(a, b));
        assert_eq!(terms, vec!["apple", "Apple", "banana", "Banana", "cherry"]);
    }

    #[test]
    fn test_cmp_locale_prefix_sorts_first() {
        assert_eq!(cmp_locale("Cell", "cellulose"), Ordering::Less);
        assert_eq!(cmp_locale("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_cmp_locale_ignores_accents_first() {
        let mut terms = vec!["zebra", "éclair", "eclair", "Ödem", "ocean"];
        terms.sort_by(|a, b| cmp_locale(a, b));
        assert_eq!(terms, vec!["eclair", "éclair", "ocean", "Ödem", "zebra"]);
    }

    #[test]
    fn test_cmp_locale_precomposed_matches_decomposed() {
        // "é" as one code point and as "e" + combining acute
        assert_eq!(cmp_locale("caf\u{e9}", "cafe\u{301}"), Ordering::Equal);
        assert_eq!(cmp_locale("\u{c9}t\u{e9}", "\u{e9}t\u{e9}"), Ordering::Greater);
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("dhéerééé", 5), "dh...");
    }
}
