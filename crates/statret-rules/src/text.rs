//! Text shaping for names and titles.

use unicode_normalization::UnicodeNormalization;

/// Reduce `input` to characters representable in Latin-1.
///
/// Characters already in Latin-1 survive (after canonical composition).
/// Typographic punctuation becomes its ASCII counterpart. Anything else is
/// replaced by the Latin-1 part of its compatibility decomposition, which
/// may be nothing.
pub fn normalize_to_latin1(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.nfc() {
        if u32::from(c) <= 0xFF {
            out.push(c);
            continue;
        }
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2012}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            _ => out.extend(
                std::iter::once(c)
                    .nfkd()
                    .filter(|d| u32::from(*d) <= 0xFF),
            ),
        }
    }
    out
}

/// Upper-cased forenames: first name, then middle names when present.
pub fn upper_names(first: &str, middle: Option<&str>) -> String {
    let mut names = first.trim().to_uppercase();
    if let Some(middle) = middle.map(str::trim).filter(|m| !m.is_empty()) {
        names.push(' ');
        names.push_str(&middle.to_uppercase());
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_kept() {
        assert_eq!(normalize_to_latin1("Café archaeology"), "Café archaeology");
        // Decomposed input is recomposed first.
        assert_eq!(normalize_to_latin1("Cafe\u{301}"), "Café");
    }

    #[test]
    fn test_typographic_punctuation() {
        assert_eq!(
            normalize_to_latin1("Roman Britain – an introduction"),
            "Roman Britain - an introduction"
        );
        assert_eq!(normalize_to_latin1("\u{201C}Gods\u{201D} \u{2026}"), "\"Gods\" ...");
        assert_eq!(normalize_to_latin1("Hadrian\u{2019}s Wall"), "Hadrian's Wall");
    }

    #[test]
    fn test_outside_latin1_decomposed_or_dropped() {
        // Latin small letter c with caron decomposes to c + combining caron.
        assert_eq!(normalize_to_latin1("\u{10D}esky"), "cesky");
        assert_eq!(normalize_to_latin1("\u{FB01}ne"), "fine");
        assert_eq!(normalize_to_latin1("Greek \u{3B1}\u{3B2}"), "Greek ");
    }

    #[test]
    fn test_upper_names() {
        assert_eq!(upper_names("Ada", Some("King")), "ADA KING");
        assert_eq!(upper_names("Bob", None), "BOB");
        assert_eq!(upper_names("Bob ", Some("  ")), "BOB");
    }
}
