use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref NON_IDENT: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

fn transliterate_umlauts(value: &str) -> String {
    value
        .replace('ä', "ae")
        .replace('ö', "oe")
        .replace('ü', "ue")
        .replace('Ä', "Ae")
        .replace('Ö', "Oe")
        .replace('Ü', "Ue")
        .replace('ß', "ss")
}

/// Normalizes free-form text to a safe identifier: trim, transliterate German
/// umlauts, strip non-ASCII via canonical decomposition, collapse runs of
/// non-alphanumerics to `_`, strip leading/trailing `_`, lowercase.
pub fn sanitize(raw: &str) -> String {
    let trimmed = raw.trim();
    let transliterated = transliterate_umlauts(trimmed);
    let ascii_only: String = transliterated.nfkd().filter(char::is_ascii).collect();
    let lowered = ascii_only.to_lowercase();
    let collapsed = NON_IDENT.replace_all(&lowered, "_");
    collapsed.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transliterates_umlauts() {
        assert_eq!(sanitize("Straße Müller"), "strasse_mueller");
    }

    #[test]
    fn strips_non_ascii_via_decomposition() {
        assert_eq!(sanitize("Café Köln"), "cafe_koeln");
    }

    #[test]
    fn collapses_non_identifier_runs() {
        assert_eq!(sanitize("  Orders -- 2024!! "), "orders_2024");
    }

    #[test]
    fn is_idempotent() {
        let once = sanitize("Kundenauftrag #42");
        let twice = sanitize(&once);
        assert_eq!(once, twice);
    }
}
