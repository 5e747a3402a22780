//! The bundled data-futures definition enforces the element order of the
//! staging tables.

use std::path::{Path, PathBuf};

use statret_schema::{validate_with, SchemaSource};

fn definition() -> SchemaSource {
    let path: PathBuf =
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../schemas/data-futures.xsd");
    SchemaSource::File(path)
}

fn batch(course_fields: &[(&str, &str)]) -> Vec<u8> {
    let mut xml =
        String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Batch>\n  <Course>\n");
    for (tag, value) in course_fields {
        if *tag == "CourseRole" {
            xml.push_str(
                "    <CourseRole>\n      <HESAID>10007774</HESAID>\n      <ROLETYPE>202</ROLETYPE>\n      <CRPROPORTION>100</CRPROPORTION>\n    </CourseRole>\n",
            );
        } else {
            xml.push_str(&format!("    <{tag}>{value}</{tag}>\n"));
        }
    }
    xml.push_str("  </Course>\n</Batch>\n");
    xml.into_bytes()
}

const COURSE: [(&str, &str); 7] = [
    ("COURSEID", "C2022-O22P123"),
    ("CLSDCRS", "02"),
    ("COURSETITLE", "Oxford Summer School"),
    ("PREREQUISITE", "01"),
    ("QUALID", "Q2022-O22P123"),
    ("TTCID", "07"),
    ("CourseRole", ""),
];

#[tokio::test]
async fn test_course_in_declared_order_is_clean() {
    let report = validate_with(&definition(), &batch(&COURSE)).await;
    assert!(report.is_clean(), "{report:?}");
}

#[tokio::test]
async fn test_course_fields_in_reverse_order_are_reported() {
    let mut reversed = COURSE;
    reversed.reverse();
    let report = validate_with(&definition(), &batch(&reversed)).await;
    assert!(!report.is_clean());
    assert!(
        report.counts().keys().any(|m| m.contains("not expected")),
        "{report:?}"
    );
}

#[tokio::test]
async fn test_fixed_code_is_checked() {
    let mut course = COURSE;
    course[5] = ("TTCID", "08");
    let report = validate_with(&definition(), &batch(&course)).await;
    assert!(!report.is_clean());
    assert!(report.counts().keys().all(|m| m.contains("TTCID")), "{report:?}");
}

#[tokio::test]
async fn test_missing_mandatory_child_is_reported() {
    let report = validate_with(&definition(), &batch(&COURSE[..6])).await;
    assert!(!report.is_clean());
    assert!(report.counts().keys().any(|m| m.contains("CourseRole")), "{report:?}");
}
