//! # UK Postcode Normalization
//!
//! Free-text postcodes are stripped of whitespace, upper-cased and checked
//! against the UK grammar. A match is returned with the single space the
//! regulator requires before the inward code (the final three characters).
//! Anything else, including well-formed foreign codes, yields `None`.
//!
//! The function is a fixed point on its own output.

use std::sync::LazyLock;

use regex::Regex;

/// Outward code followed by inward code, whitespace already removed.
static POSTCODE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(GIR0AA|(([A-Z][0-9]{1,2})|([A-Z][A-HJ-Y][0-9]{1,2})|([A-Z][0-9][A-Z])|([A-Z][A-HJ-Y][0-9][A-Z]?))[0-9][A-Z]{2})$",
    )
    .ok()
});

/// Normalize a free-text UK postcode, or `None` if it is not one.
pub fn normalize_postcode(input: &str) -> Option<String> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    let grammar = POSTCODE.as_ref()?;
    if !grammar.is_match(&compact) {
        return None;
    }
    // The match is pure ASCII, so byte offsets are char offsets.
    let (outward, inward) = compact.split_at(compact.len() - 3);
    Some(format!("{outward} {inward}"))
}
