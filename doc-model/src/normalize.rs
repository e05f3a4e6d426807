//! Text normalizer (component A): diacritic folding, lowercasing, tokenization.

use unicode_normalization::UnicodeNormalization;

/// Fold diacritics to their closest ASCII equivalent, lowercase, collapse
/// whitespace runs to a single space, and trim.
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .nfc()
        .collect();

    let mut out = String::with_capacity(folded.len());
    let mut prev_ws = false;
    for ch in folded.chars().flat_map(|c| c.to_lowercase()) {
        if ch.is_whitespace() {
            if !prev_ws {
                out.push(' ');
            }
            prev_ws = true;
        } else {
            out.push(ch);
            prev_ws = false;
        }
    }
    out.trim().to_string()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32,
        0x0300..=0x036F // Combining Diacritical Marks
        | 0x1AB0..=0x1AFF // Combining Diacritical Marks Extended
        | 0x1DC0..=0x1DFF // Combining Diacritical Marks Supplement
        | 0x20D0..=0x20FF // Combining Diacritical Marks for Symbols
    )
}

/// Split on whitespace and punctuation boundaries, dropping empty tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric()))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_common_diacritics() {
        assert_eq!(normalize("Café"), "cafe");
        assert_eq!(normalize("Jak se formuje datová budoucnost"), "jak se formuje datova budoucnost");
        assert_eq!(normalize("Říše"), "rise");
        assert_eq!(normalize("Über"), "uber");
    }

    #[test]
    fn collapses_whitespace_and_trims() {
        assert_eq!(normalize("  hello   world  "), "hello world");
        assert_eq!(normalize("a\tb\n\nc"), "a b c");
    }

    #[test]
    fn is_idempotent() {
        for s in ["Café DATOVÁ", "  multi   space ", "plain"] {
            let once = normalize(s);
            let twice = normalize(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn tokenize_splits_on_punctuation() {
        assert_eq!(tokenize("google cloud invoice.pdf"), vec!["google", "cloud", "invoice", "pdf"]);
        assert_eq!(tokenize(""), Vec::<String>::new());
    }
}
