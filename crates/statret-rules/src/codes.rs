//! Small code mappings shared by both generations.

use std::fmt::Display;

/// ELQ: the target is equivalent or lower than a held qualification.
pub const ELQ: &str = "01";
/// ELQ: the target is higher than anything held.
pub const NOT_ELQ: &str = "03";

/// Domiciles for which the legacy entry profile carries a postcode.
pub const POSTCODE_DOMICILES: &[&str] = &["XF", "XG", "XH", "XI", "XK", "XL", "GG", "JE", "IM"];

/// Funding body code of the Office for Students.
pub const OFFICE_FOR_STUDENTS: &str = "5016";

/// Compare the target programme's qualification rank with the person's
/// highest entry qualification. `None` when no entry qualification is known.
pub fn elq(target_rank: i32, entry_rank: Option<i32>) -> Option<&'static str> {
    let entry = entry_rank?;
    if target_rank > entry {
        Some(NOT_ELQ)
    } else {
        Some(ELQ)
    }
}

/// Data-futures SEXID from a recorded gender.
pub fn sex_id(gender: Option<&str>) -> &'static str {
    match gender {
        Some("M") => "11",
        Some("F") => "10",
        Some("I") => "12",
        _ => "99",
    }
}

/// Whether a qualification code needs a research-council marker.
pub fn research_council_applies(qualification_code: &str) -> bool {
    qualification_code.starts_with(['E', 'M'])
}

/// Whether a legacy QUALENT3 is a Masters or doctorate that makes a
/// postgraduate instance non-fundable. Integrated and taught exceptions are
/// carved out.
pub fn masters_or_doctorate_entry(qualent3: &str) -> bool {
    qualent3.starts_with(['M', 'D']) && !matches!(qualent3, "M44" | "M41" | "M71")
}

/// Left-pad with zeros to `width`.
pub fn pad(value: impl Display, width: usize) -> String {
    format!("{value:0>width$}")
}

/// Country code in the data-futures vocabulary ("not known" moved to `97`).
pub fn data_futures_country(code: &str) -> String {
    code.replace("ZZ", "97")
}
