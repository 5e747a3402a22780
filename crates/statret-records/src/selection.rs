//! # Selection Predicate
//!
//! Decides which enrolments count towards a return, then groups the
//! survivors into the shapes the population phases walk: people with their
//! qualification aims and enrolments, programmes, and modules.
//!
//! An enrolment is reportable when:
//!
//! - its module starts inside the reporting window,
//! - the module carries credit and is not cancelled,
//! - the programme's qualification is flagged for the return,
//! - the enrolment status is flagged for the return,
//! - the person's registration is complete (a domicile or a gender), and
//! - the study location is not overseas distance learning.
//!
//! Every reference the phases will follow is resolved here. A dangling
//! reference is a population failure, reported before anything is built.

use std::collections::BTreeMap;

use statret_core::ReportingWindow;

use crate::error::RecordError;
use crate::models::{
    Enrolment, EnrolmentResult, EnrolmentStatus, EntryQualification, LedgerLine, Module,
    Programme, Qualification, QualificationAim, Student, StudyLocation,
};
use crate::source::RecordSource;

/// Everything the predicate looks at for one enrolment.
#[derive(Debug, Clone, Copy)]
pub struct EnrolmentContext<'a> {
    pub enrolment: &'a Enrolment,
    pub status: &'a EnrolmentStatus,
    pub module: &'a Module,
    pub aim: &'a QualificationAim,
    pub student: &'a Student,
    pub qualification: &'a Qualification,
}

/// The selection predicate.
pub fn is_reportable(ctx: &EnrolmentContext<'_>, window: &ReportingWindow) -> bool {
    let in_window = ctx.module.start_date.is_some_and(|d| window.contains(d));
    in_window
        && ctx.module.credit_points.unwrap_or(0) > 0
        && !ctx.module.is_cancelled
        && ctx.qualification.on_hesa_return
        && ctx.status.on_hesa_return
        && !ctx.student.registration_incomplete()
        && ctx.aim.study_location != StudyLocation::OVERSEAS
}

/// A selected enrolment with the rows its rules need.
#[derive(Debug, Clone)]
pub struct SelectedEnrolment<'a> {
    pub enrolment: &'a Enrolment,
    pub module: &'a Module,
    pub result: &'a EnrolmentResult,
    pub fees: Vec<&'a LedgerLine>,
}

/// A selected qualification aim: one engagement in the return.
#[derive(Debug, Clone)]
pub struct SelectedAim<'a> {
    pub aim: &'a QualificationAim,
    pub programme: &'a Programme,
    pub qualification: &'a Qualification,
    pub entry_qualification: Option<&'a EntryQualification>,
    pub study_location: &'a StudyLocation,
    /// Never empty; ordered by enrolment id.
    pub enrolments: Vec<SelectedEnrolment<'a>>,
}

/// A selected person and their engagements, ordered by aim id.
#[derive(Debug, Clone)]
pub struct SelectedStudent<'a> {
    pub student: &'a Student,
    pub aims: Vec<SelectedAim<'a>>,
}

/// The population of one return, resolved once.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    window: ReportingWindow,
    students: Vec<SelectedStudent<'a>>,
    programmes: Vec<(&'a Programme, &'a Qualification)>,
    modules: Vec<&'a Module>,
}

impl<'a> Selection<'a> {
    /// Apply the predicate to every enrolment in `source`.
    pub fn build<S>(source: &'a S, window: ReportingWindow) -> Result<Self, RecordError>
    where
        S: RecordSource + ?Sized,
    {
        // student id -> aim id -> aim
        let mut grouped: BTreeMap<i64, (&'a Student, BTreeMap<i64, SelectedAim<'a>>)> =
            BTreeMap::new();
        let mut programmes: BTreeMap<i64, (&'a Programme, &'a Qualification)> = BTreeMap::new();
        let mut modules: BTreeMap<i64, &'a Module> = BTreeMap::new();
        let mut considered = 0usize;

        for enrolment in source.enrolments() {
            considered += 1;
            let ctx = resolve(source, enrolment)?;
            if !is_reportable(&ctx, &window) {
                continue;
            }

            let programme = lookup(
                source.programme(ctx.aim.programme),
                "programme",
                ctx.aim.programme,
                || format!("qualification aim {}", ctx.aim.id),
            )?;
            let result = lookup(
                source.enrolment_result(&enrolment.result),
                "enrolment result",
                &enrolment.result,
                || format!("enrolment {}", enrolment.id),
            )?;
            let study_location = lookup(
                source.study_location(ctx.aim.study_location),
                "study location",
                ctx.aim.study_location,
                || format!("qualification aim {}", ctx.aim.id),
            )?;
            let entry_qualification = match &ctx.aim.entry_qualification {
                Some(code) => Some(lookup(
                    source.entry_qualification(code),
                    "entry qualification",
                    code,
                    || format!("qualification aim {}", ctx.aim.id),
                )?),
                None => None,
            };

            programmes.insert(programme.id, (programme, ctx.qualification));
            modules.insert(ctx.module.id, ctx.module);

            let (_, aims) = grouped
                .entry(ctx.student.id)
                .or_insert_with(|| (ctx.student, BTreeMap::new()));
            aims.entry(ctx.aim.id)
                .or_insert_with(|| SelectedAim {
                    aim: ctx.aim,
                    programme,
                    qualification: ctx.qualification,
                    entry_qualification,
                    study_location,
                    enrolments: Vec::new(),
                })
                .enrolments
                .push(SelectedEnrolment {
                    enrolment,
                    module: ctx.module,
                    result,
                    fees: source.fee_lines(enrolment.id),
                });
        }

        let students: Vec<SelectedStudent<'a>> = grouped
            .into_values()
            .map(|(student, aims)| SelectedStudent {
                student,
                aims: aims
                    .into_values()
                    .map(|mut aim| {
                        aim.enrolments.sort_by_key(|e| e.enrolment.id);
                        aim
                    })
                    .collect(),
            })
            .collect();

        let mut modules: Vec<&'a Module> = modules.into_values().collect();
        modules.sort_by(|a, b| a.code.cmp(&b.code).then(a.id.cmp(&b.id)));

        let selection = Self {
            window,
            students,
            programmes: programmes.into_values().collect(),
            modules,
        };
        tracing::info!(
            year = %window.year,
            considered,
            selected = selection.enrolment_count(),
            students = selection.students.len(),
            "selected reportable enrolments"
        );
        Ok(selection)
    }

    /// The window the selection was built for.
    pub fn window(&self) -> &ReportingWindow {
        &self.window
    }

    /// Selected people, by id.
    pub fn students(&self) -> &[SelectedStudent<'a>] {
        &self.students
    }

    /// Programmes with at least one selected enrolment, by id.
    pub fn programmes(&self) -> &[(&'a Programme, &'a Qualification)] {
        &self.programmes
    }

    /// Modules with at least one selected enrolment, by code.
    pub fn modules(&self) -> &[&'a Module] {
        &self.modules
    }

    /// Every selected aim, in person order.
    pub fn aims(&self) -> impl Iterator<Item = (&SelectedStudent<'a>, &SelectedAim<'a>)> {
        self.students
            .iter()
            .flat_map(|s| s.aims.iter().map(move |a| (s, a)))
    }

    /// Every selected enrolment.
    pub fn enrolments(&self) -> impl Iterator<Item = &SelectedEnrolment<'a>> {
        self.aims().flat_map(|(_, a)| a.enrolments.iter())
    }

    /// Number of selected enrolments.
    pub fn enrolment_count(&self) -> usize {
        self.enrolments().count()
    }
}

fn resolve<'a, S>(source: &'a S, enrolment: &'a Enrolment) -> Result<EnrolmentContext<'a>, RecordError>
where
    S: RecordSource + ?Sized,
{
    let by_enrolment = || format!("enrolment {}", enrolment.id);
    let aim = lookup(
        source.qualification_aim(enrolment.qualification_aim),
        "qualification aim",
        enrolment.qualification_aim,
        by_enrolment,
    )?;
    let module = lookup(source.module(enrolment.module), "module", enrolment.module, by_enrolment)?;
    let status = lookup(
        source.enrolment_status(enrolment.status),
        "enrolment status",
        enrolment.status,
        by_enrolment,
    )?;
    let student = lookup(source.student(aim.student), "student", aim.student, || {
        format!("qualification aim {}", aim.id)
    })?;
    let programme = lookup(source.programme(aim.programme), "programme", aim.programme, || {
        format!("qualification aim {}", aim.id)
    })?;
    let qualification = lookup(
        source.qualification(programme.qualification),
        "qualification",
        programme.qualification,
        || format!("programme {}", programme.id),
    )?;
    Ok(EnrolmentContext {
        enrolment,
        status,
        module,
        aim,
        student,
        qualification,
    })
}

fn lookup<T, I: std::fmt::Display>(
    found: Option<T>,
    entity: &'static str,
    id: I,
    referenced_by: impl FnOnce() -> String,
) -> Result<T, RecordError> {
    found.ok_or_else(|| RecordError::Dangling {
        entity,
        id: id.to_string(),
        referenced_by: referenced_by(),
    })
}
