//! # Post-Processing
//!
//! Corrective rules applied to a fully populated tree, expressed as "for
//! every record matching X, set field Y". They depend on sibling and
//! ancestor records (a course's qualification category, an instance's fee
//! eligibility) that population does not thread through.
//!
//! Rules run in table order. Each is idempotent, and since a tree holds
//! exactly one batch, no rule can reach another batch's records.
//!
//! ## Legacy
//!
//! ```text
//! 1. Instance.ELQ         cleared when FEEELIG ∈ {2, 3}
//! 2. Instance.FUNDCODE    1 → 2 when ELQ ∈ {01, 09}
//! 3. Instance.FUNDCODE    1 → 2 when FUNDLEV = 20 and QUALENT3 is a
//!                         Masters or doctorate (bar M41, M44, M71)
//! 4. EntryProfile.CARELEAVER  cleared when FUNDCODE ∈ {2, 3, 5}
//!                             or COURSEAIM ∈ {M90, E90}
//! 5. EntryProfile.PARED   cleared unless FUNDCODE = 1 and COURSEAIM C*
//! ```
//!
//! ## Data Futures
//!
//! ```text
//! 1. FundingAndMonitoring.ELQ  cleared when FEEELIG ∈ {02, 03}
//! 2. EntryProfile.CARELEAVER   cleared unless QUALCAT C*
//! 3. EntryProfile.PARED        cleared unless QUALCAT C*
//! ```

use std::collections::BTreeMap;

use statret_core::{FieldValue, Generation};
use statret_rules::codes;
use statret_staging::data_futures as df;
use statret_staging::legacy;
use statret_staging::{RecordId, StagingError, StagingTree};

/// One corrective rule. Returns how many records it changed.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&mut StagingTree) -> Result<usize, StagingError>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Rule").field(&self.name).finish()
    }
}

pub const LEGACY_RULES: &[Rule] = &[
    Rule {
        name: "clear ELQ where fees do not apply",
        apply: legacy_clear_elq,
    },
    Rule {
        name: "not fundable when ELQ",
        apply: legacy_elq_not_fundable,
    },
    Rule {
        name: "not fundable with postgraduate entry",
        apply: legacy_postgraduate_entry_not_fundable,
    },
    Rule {
        name: "clear CARELEAVER where not collected",
        apply: legacy_clear_care_leaver,
    },
    Rule {
        name: "clear PARED outside fundable undergraduate courses",
        apply: legacy_clear_parental_education,
    },
];

pub const DATA_FUTURES_RULES: &[Rule] = &[
    Rule {
        name: "clear ELQ where fees do not apply",
        apply: df_clear_elq,
    },
    Rule {
        name: "clear CARELEAVER outside undergraduate",
        apply: df_clear_care_leaver,
    },
    Rule {
        name: "clear PARED outside undergraduate",
        apply: df_clear_parental_education,
    },
];

/// The rules for a generation.
pub fn rules_for(generation: Generation) -> &'static [Rule] {
    match generation {
        Generation::Legacy => LEGACY_RULES,
        Generation::DataFutures => DATA_FUTURES_RULES,
    }
}

/// Apply every rule of the tree's generation. Returns changes per rule.
pub fn post_process(tree: &mut StagingTree) -> Result<BTreeMap<&'static str, usize>, StagingError> {
    let mut changed = BTreeMap::new();
    for rule in rules_for(tree.schema().generation) {
        let n = (rule.apply)(tree)?;
        if n > 0 {
            tracing::debug!(rule = rule.name, records = n, "post-processing rule applied");
        }
        changed.insert(rule.name, n);
    }
    tracing::info!(
        generation = tree.schema().generation.as_str(),
        changed = changed.values().sum::<usize>(),
        "post-processing complete"
    );
    Ok(changed)
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn value(tree: &StagingTree, id: RecordId, tag: &str) -> Option<String> {
    tree.get(id)
        .and_then(|r| r.get(tag))
        .filter(|v| !v.is_empty())
        .map(FieldValue::render)
}

fn is_any(tree: &StagingTree, id: RecordId, tag: &str, codes: &[&str]) -> bool {
    tree.get(id)
        .is_some_and(|r| codes.iter().any(|code| r.is(tag, code)))
}

/// Clear `tag` on every record of `kind` where `when` holds. Returns the
/// number of records whose field was present.
fn clear_where<F>(tree: &mut StagingTree, kind: &str, tag: &str, when: F) -> Result<usize, StagingError>
where
    F: Fn(&StagingTree, RecordId) -> bool,
{
    let view: &StagingTree = tree;
    let targets: Vec<RecordId> = view
        .of_kind(kind)
        .filter(|id| view.get(*id).is_some_and(|r| r.get(tag).is_some()))
        .filter(|id| when(view, *id))
        .collect();
    for id in &targets {
        tree.clear(*id, tag)?;
    }
    Ok(targets.len())
}

/// Set `tag` from `from` to `to` on every record of `kind` where `when` holds.
fn recode_where<F>(
    tree: &mut StagingTree,
    kind: &str,
    tag: &str,
    from: &str,
    to: FieldValue,
    when: F,
) -> Result<usize, StagingError>
where
    F: Fn(&StagingTree, RecordId) -> bool,
{
    let view: &StagingTree = tree;
    let targets: Vec<RecordId> = view
        .of_kind(kind)
        .filter(|id| is_any(view, *id, tag, &[from]))
        .filter(|id| when(view, *id))
        .collect();
    for id in &targets {
        tree.set(*id, tag, to.clone())?;
    }
    Ok(targets.len())
}

/// The legacy course an instance is on.
fn legacy_course(tree: &StagingTree, instance: RecordId) -> Option<RecordId> {
    let course = value(tree, instance, "COURSEID")?;
    tree.find(legacy::COURSE, &course)
}

fn legacy_course_aim(tree: &StagingTree, instance: RecordId) -> Option<String> {
    legacy_course(tree, instance).and_then(|c| value(tree, c, "COURSEAIM"))
}

/// QUALCAT of the qualification a data-futures engagement's course leads to.
fn df_qualification_category(tree: &StagingTree, engagement: RecordId) -> Option<String> {
    let session = tree.child_of_kind(engagement, df::STUDENT_COURSE_SESSION)?;
    let course = tree.find(df::COURSE, &value(tree, session, "COURSEID")?)?;
    let qualification = tree.find(df::QUALIFICATION, &value(tree, course, "QUALID")?)?;
    value(tree, qualification, "QUALCAT")
}

// ─── Legacy Rules ────────────────────────────────────────────────────

fn legacy_clear_elq(tree: &mut StagingTree) -> Result<usize, StagingError> {
    clear_where(tree, legacy::INSTANCE, "ELQ", |t, id| {
        is_any(t, id, "FEEELIG", &["2", "3"])
    })
}

fn legacy_elq_not_fundable(tree: &mut StagingTree) -> Result<usize, StagingError> {
    recode_where(tree, legacy::INSTANCE, "FUNDCODE", "1", FieldValue::Int(2), |t, id| {
        is_any(t, id, "ELQ", &["01", "09"])
    })
}

fn legacy_postgraduate_entry_not_fundable(tree: &mut StagingTree) -> Result<usize, StagingError> {
    recode_where(tree, legacy::INSTANCE, "FUNDCODE", "1", FieldValue::Int(2), |t, id| {
        is_any(t, id, "FUNDLEV", &["20"])
            && t.child_of_kind(id, legacy::ENTRY_PROFILE)
                .and_then(|ep| value(t, ep, "QUALENT3"))
                .is_some_and(|q| codes::masters_or_doctorate_entry(&q))
    })
}

fn legacy_clear_care_leaver(tree: &mut StagingTree) -> Result<usize, StagingError> {
    clear_where(tree, legacy::ENTRY_PROFILE, "CARELEAVER", |t, id| {
        let Some(instance) = t.ancestor_of_kind(id, legacy::INSTANCE) else {
            return false;
        };
        is_any(t, instance, "FUNDCODE", &["2", "3", "5"])
            || legacy_course_aim(t, instance).is_some_and(|aim| aim == "M90" || aim == "E90")
    })
}

fn legacy_clear_parental_education(tree: &mut StagingTree) -> Result<usize, StagingError> {
    clear_where(tree, legacy::ENTRY_PROFILE, "PARED", |t, id| {
        let Some(instance) = t.ancestor_of_kind(id, legacy::INSTANCE) else {
            return true;
        };
        let fundable = is_any(t, instance, "FUNDCODE", &["1"]);
        let undergraduate = legacy_course_aim(t, instance).is_some_and(|aim| aim.starts_with('C'));
        !(fundable && undergraduate)
    })
}

// ─── Data-Futures Rules ──────────────────────────────────────────────

fn df_clear_elq(tree: &mut StagingTree) -> Result<usize, StagingError> {
    clear_where(tree, df::FUNDING_AND_MONITORING, "ELQ", |t, id| {
        t.ancestor_of_kind(id, df::ENGAGEMENT)
            .is_some_and(|e| is_any(t, e, "FEEELIG", &["02", "03"]))
    })
}

fn df_not_undergraduate(tree: &StagingTree, entry_profile: RecordId) -> bool {
    tree.ancestor_of_kind(entry_profile, df::ENGAGEMENT)
        .and_then(|e| df_qualification_category(tree, e))
        .map_or(true, |cat| !cat.starts_with('C'))
}

fn df_clear_care_leaver(tree: &mut StagingTree) -> Result<usize, StagingError> {
    clear_where(tree, df::ENTRY_PROFILE, "CARELEAVER", df_not_undergraduate)
}

fn df_clear_parental_education(tree: &mut StagingTree) -> Result<usize, StagingError> {
    clear_where(tree, df::ENTRY_PROFILE, "PARED", df_not_undergraduate)
}
