//! Data-futures batch population.
//!
//! Phases, in order: courses (with their qualifications), modules, session
//! year, venue, students, engagements. Reference collections sit directly
//! under the `Batch` root; engagement detail nests under `Student`.

use statret_core::keys;
use statret_records::{SelectedAim, SelectedStudent, StudyLocation};
use statret_rules::codes::{self, pad};
use statret_rules::outcomes::{self, OutcomeSet};
use statret_rules::{
    fees, module_span, normalize_postcode, normalize_to_latin1, reference_period_loads,
    upper_names,
};
use statret_staging::data_futures::{self as df, SCHEMA, SESSION_YEAR_ID};
use statret_staging::{RecordId, StagingTree};

use crate::error::EngineError;
use crate::populate::{self, all_fees, earliest_start, Phase, Population};
use crate::progress::ProgressSink;

pub(crate) fn populate(
    population: Population<'_>,
    progress: &dyn ProgressSink,
) -> Result<StagingTree, EngineError> {
    let mut builder = DataFuturesBuilder {
        tree: StagingTree::new(&SCHEMA, population.options.ukprn.clone()),
        population,
    };
    let phases: [Phase<DataFuturesBuilder<'_>>; 6] = [
        ("building courses", DataFuturesBuilder::courses),
        ("building modules", DataFuturesBuilder::modules),
        ("building session year", DataFuturesBuilder::session_year),
        ("building venue", DataFuturesBuilder::venue),
        ("building students", DataFuturesBuilder::students),
        ("building engagements", DataFuturesBuilder::engagements),
    ];
    populate::run_phases(&mut builder, &phases, progress)?;
    Ok(builder.tree)
}

struct DataFuturesBuilder<'p> {
    tree: StagingTree,
    population: Population<'p>,
}

impl populate::Builder for DataFuturesBuilder<'_> {
    fn tree(&self) -> &StagingTree {
        &self.tree
    }
}

impl<'p> DataFuturesBuilder<'p> {
    fn courses(&mut self) -> Result<(), EngineError> {
        for (programme, qualification) in self.population.selection.programmes() {
            let qualid = keys::qualification_key(programme.id);
            let qual = self.tree.insert(df::QUALIFICATION, qualid.clone(), None)?;
            self.tree.set(qual, "QUALID", qualid.as_str())?;
            self.tree
                .set(qual, "QUALCAT", qualification.data_futures_code.as_str())?;
            self.tree
                .insert(df::AWARDING_BODY_ROLE, qualid.clone(), Some(qual))?;
            for (n, share) in programme.subjects.iter().enumerate() {
                let subject = self.tree.insert(
                    df::QUALIFICATION_SUBJECT,
                    format!("{qualid}-{n}"),
                    Some(qual),
                )?;
                self.tree.set(subject, "QUALSUBJECT", share.subject.as_str())?;
                self.tree
                    .set(subject, "QUALPROPORTION", i64::from(share.percentage))?;
            }

            let course = self
                .tree
                .insert(df::COURSE, programme.id.to_string(), None)?;
            self.tree.set(course, "COURSEID", programme.id)?;
            self.tree.set(course, "COURSETITLE", programme.title.as_str())?;
            let prerequisite = if qualification.is_postgraduate { "02" } else { "01" };
            self.tree.set(course, "PREREQUISITE", prerequisite)?;
            self.tree.set(course, "QUALID", qualid.as_str())?;
            self.tree
                .insert(df::COURSE_ROLE, programme.id.to_string(), Some(course))?;
        }
        Ok(())
    }

    fn modules(&mut self) -> Result<(), EngineError> {
        for module in self.population.selection.modules() {
            let id = self.tree.insert(df::MODULE, module.code.clone(), None)?;
            self.tree.set(id, "MODID", module.code.as_str())?;
            self.tree
                .set_opt(id, "CRDTPTS", module.credit_points.map(|c| pad(c, 3)))?;
            self.tree.set(id, "FTE", module.full_time_equivalent)?;
            self.tree.set_opt(
                id,
                "LEVLPTS",
                module
                    .points_level
                    .as_ref()
                    .map(|l| l.data_futures_code.as_str()),
            )?;
            self.tree.set(id, "MTITLE", normalize_to_latin1(&module.title))?;

            for (n, share) in module.subjects.iter().enumerate() {
                let subject = self.tree.insert(
                    df::MODULE_SUBJECT,
                    format!("{}-{n}", module.code),
                    Some(id),
                )?;
                self.tree.set(subject, "MODSBJ", share.subject.as_str())?;
                self.tree
                    .set(subject, "MODPROPORTION", i64::from(share.percentage))?;
            }

            // Percentages summed per cost centre, first-seen order.
            let mut centres: Vec<(i32, i64)> = Vec::new();
            for share in &module.subjects {
                let Some(centre) = share.cost_centre else { continue };
                match centres.iter_mut().find(|(c, _)| *c == centre) {
                    Some((_, total)) => *total += i64::from(share.percentage),
                    None => centres.push((centre, i64::from(share.percentage))),
                }
            }
            for (centre, proportion) in centres {
                let cc = self.tree.insert(
                    df::MODULE_COST_CENTRE,
                    format!("{}-{centre}", module.code),
                    Some(id),
                )?;
                self.tree.set(cc, "COSTCN", i64::from(centre))?;
                self.tree.set(cc, "COSTCNPROPORTION", proportion)?;
            }
        }
        Ok(())
    }

    fn session_year(&mut self) -> Result<(), EngineError> {
        let window = *self.population.selection.window();
        let id = self.tree.insert(df::SESSION_YEAR, SESSION_YEAR_ID, None)?;
        self.tree.set(id, "SESSIONYEARID", SESSION_YEAR_ID)?;
        self.tree.set(id, "SYENDDATE", window.year_end)?;
        self.tree.set(id, "SYSTARTDATE", window.start)?;
        Ok(())
    }

    fn venue(&mut self) -> Result<(), EngineError> {
        let venue = &self.population.options.venue;
        let id = self.tree.insert(df::VENUE, venue.id.clone(), None)?;
        self.tree.set(id, "VENUEID", venue.id.as_str())?;
        self.tree.set(id, "POSTCODE", venue.postcode.as_str())?;
        self.tree.set(id, "VENUENAME", venue.name.as_str())?;
        Ok(())
    }

    fn students(&mut self) -> Result<(), EngineError> {
        let population = self.population;
        for selected in population.selection.students() {
            let student = selected.student;
            let id = self
                .tree
                .insert(df::STUDENT, student.id.to_string(), None)?;
            self.tree.set(id, "SID", pad(population.identifier(student)?, 13))?;
            self.tree.set_opt(id, "BIRTHDTE", student.birthdate)?;
            self.tree.set_opt(
                id,
                "ETHNIC",
                student.ethnicity.as_ref().map(|c| c.data_futures_code.as_str()),
            )?;
            self.tree.set(
                id,
                "FNAMES",
                upper_names(&student.firstname, student.middlename.as_deref()),
            )?;
            self.tree
                .set_opt(id, "GENDERID", student.gender_identity.map(|g| pad(g, 2)))?;
            self.tree.set_opt(
                id,
                "NATION",
                student.nationality.as_deref().map(codes::data_futures_country),
            )?;
            self.tree.set(id, "OWNSTU", student.own_id())?;
            self.tree.set_opt(
                id,
                "RELIGION",
                student
                    .religion_or_belief
                    .as_ref()
                    .map(|c| c.data_futures_code.as_str()),
            )?;
            self.tree
                .set(id, "SEXID", codes::sex_id(student.gender.as_deref()))?;
            self.tree.set_opt(
                id,
                "SEXORT",
                student
                    .sexual_orientation
                    .as_ref()
                    .map(|c| c.data_futures_code.as_str()),
            )?;
            self.tree.set_opt(id, "SSN", student.ssn.as_deref())?;
            self.tree.set(id, "SURNAME", student.surname.to_uppercase())?;
            self.tree.set_opt(
                id,
                "TTACCOM",
                student.termtime_accommodation.map(|a| pad(a, 2)),
            )?;
            let postcode = student
                .termtime_postcode
                .as_ref()
                .or(student.postcode.as_ref())
                .and_then(|raw| normalize_postcode(raw));
            self.tree.set_opt(id, "TTPCODE", postcode)?;

            for code in &student.disabilities {
                let disability = self.tree.insert(
                    df::DISABILITY,
                    format!("{}-{code}", student.id),
                    Some(id),
                )?;
                self.tree.set(disability, "DISABILITY", code.as_str())?;
            }
        }
        tracing::debug!(
            students = population.selection.students().len(),
            "data-futures students built"
        );
        Ok(())
    }

    fn engagements(&mut self) -> Result<(), EngineError> {
        let population = self.population;
        for (selected, aim) in population.selection.aims() {
            self.engagement(selected, aim)?;
        }
        Ok(())
    }

    fn engagement(
        &mut self,
        selected: &SelectedStudent<'_>,
        aim: &SelectedAim<'_>,
    ) -> Result<(), EngineError> {
        let window = *self.population.selection.window();
        let student = selected.student;
        let parent = self.tree.find(df::STUDENT, &student.id.to_string());
        let numhus = keys::engagement_key(aim.aim.id, window.year);
        let id = self.tree.insert(df::ENGAGEMENT, numhus.clone(), parent)?;

        self.tree.set(id, "NUMHUS", numhus.as_str())?;
        self.tree.set(id, "ENGEXPECTEDENDDATE", window.year_end)?;
        self.tree
            .set_opt(id, "ENGSTARTDATE", earliest_start(&aim.enrolments))?;
        let eligible = if student.home_fee_eligible { "01" } else { "02" };
        self.tree.set(id, "FEEELIG", eligible)?;
        if codes::research_council_applies(&aim.qualification.data_futures_code) {
            self.tree.set(id, "RCSTDNT", "9997")?;
        }

        self.entry_profile(id, &numhus, selected, aim)?;

        let outcomes = OutcomeSet::data_futures(&aim.enrolments);
        let ending = outcomes::data_futures_reason_for_ending(&outcomes);
        if !ending.matched {
            tracing::warn!(
                engagement = %numhus,
                code = ending.code,
                "no outcome matched a reason for ending, using fallback"
            );
        }
        let leaver = self.tree.insert(df::LEAVER, numhus.clone(), Some(id))?;
        self.tree.set(leaver, "ENGENDDATE", window.year_end)?;
        self.tree.set(leaver, "RSNENGEND", ending.code)?;

        if ending.code == outcomes::AWARDED_CREDIT {
            let award_id = keys::award_key(&numhus);
            let award = self
                .tree
                .insert(df::QUALIFICATION_AWARDED, award_id.clone(), Some(id))?;
            self.tree.set(award, "QUALAWARDID", award_id)?;
            self.tree
                .set(award, "QUALID", keys::qualification_key(aim.programme.id))?;
        }

        self.course_session(id, &numhus, selected, aim, &outcomes)
    }

    fn entry_profile(
        &mut self,
        engagement: RecordId,
        numhus: &str,
        selected: &SelectedStudent<'_>,
        aim: &SelectedAim<'_>,
    ) -> Result<(), EngineError> {
        let student = selected.student;
        let id = self
            .tree
            .insert(df::ENTRY_PROFILE, numhus, Some(engagement))?;
        if aim.qualification.data_futures_code.starts_with('C') {
            self.tree.set(id, "CARELEAVER", "99")?;
            self.tree.set_opt(
                id,
                "PARED",
                student
                    .parental_education
                    .as_ref()
                    .map(|p| pad(&p.data_futures_code, 2)),
            )?;
        }
        self.tree.set_opt(
            id,
            "HIGHESTQOE",
            aim.entry_qualification
                .map(|e| e.data_futures_code.as_str()),
        )?;
        if let Some(domicile) = &student.domicile {
            self.tree.set(
                id,
                "PERMADDCOUNTRY",
                codes::data_futures_country(&domicile.hesa_code),
            )?;
            if domicile.in_uk {
                let postcode = student.postcode.as_deref().and_then(normalize_postcode);
                self.tree.set_opt(id, "PERMADDPOSTCODE", postcode)?;
            }
        }
        Ok(())
    }

    fn course_session(
        &mut self,
        engagement: RecordId,
        numhus: &str,
        selected: &SelectedStudent<'_>,
        aim: &SelectedAim<'_>,
        outcomes: &OutcomeSet,
    ) -> Result<(), EngineError> {
        let window = *self.population.selection.window();
        let venue_id = self.population.options.venue.id.clone();
        let student = selected.student;
        let enrolments = &aim.enrolments;

        let scs_id = keys::course_session_key(numhus);
        let scs = self
            .tree
            .insert(df::STUDENT_COURSE_SESSION, scs_id.clone(), Some(engagement))?;
        self.tree.set(scs, "SCSESSIONID", scs_id.as_str())?;
        self.tree.set(scs, "COURSEID", aim.programme.id)?;
        self.tree
            .set(scs, "INVOICEFEEAMOUNT", fees::net_fee(all_fees(enrolments)))?;
        self.tree.set(scs, "RSNSCSEND", "04")?;
        self.tree.set(scs, "SCSENDDATE", window.year_end)?;
        self.tree.set(scs, "SCSSTARTDATE", window.start)?;
        self.tree.set(scs, "SESSIONYEARID", SESSION_YEAR_ID)?;

        let elq = codes::elq(
            aim.qualification.elq_rank,
            aim.entry_qualification.map(|e| e.elq_rank),
        );
        let funding = self
            .tree
            .insert(df::FUNDING_AND_MONITORING, scs_id.clone(), Some(scs))?;
        self.tree.set_opt(funding, "ELQ", elq)?;
        self.tree.set(
            funding,
            "FUNDCOMP",
            outcomes::data_futures_completion(outcomes).code,
        )?;

        if elq == Some(codes::NOT_ELQ) && student.home_fee_eligible {
            let body = self
                .tree
                .insert(df::FUNDING_BODY, scs_id.clone(), Some(scs))?;
            self.tree
                .set(body, "FUNDINGBODY", codes::OFFICE_FOR_STUDENTS)?;
        }

        let spans = enrolments.iter().filter_map(|e| {
            e.module
                .start_date
                .map(|start| (e.module.full_time_equivalent, module_span(start, e.module.end_date)))
        });
        for (period, load) in reference_period_loads(&window, spans) {
            let rp = self.tree.insert(
                df::REFERENCE_PERIOD_STUDENT_LOAD,
                format!("{scs_id}-{period}"),
                Some(scs),
            )?;
            self.tree.set(rp, "REFPERIOD", period)?;
            self.tree.set(rp, "YEAR", i64::from(window.year.value()))?;
            self.tree.set(rp, "RPSTULOAD", load)?;
        }

        let location_id = keys::study_location_key(numhus);
        let location = self
            .tree
            .insert(df::STUDY_LOCATION, location_id.clone(), Some(scs))?;
        self.tree.set(location, "STUDYLOCID", location_id)?;
        self.tree.set(location, "STUDYPROPORTION", 100i64)?;
        if aim.study_location.id == StudyLocation::OVERSEAS {
            self.tree.set(location, "DISTANCE", "01")?;
        } else {
            self.tree.set(location, "VENUEID", venue_id)?;
        }

        for e in enrolments {
            let instance = self.tree.insert(
                df::MODULE_INSTANCE,
                e.enrolment.id.to_string(),
                Some(scs),
            )?;
            self.tree.set(instance, "MODINSTID", e.enrolment.id)?;
            self.tree
                .set(instance, "MIFEEAMOUNT", fees::gross_fee(e.fees.iter().copied()))?;
            self.tree.set(instance, "MODID", e.module.code.as_str())?;
            if let Some(start) = e.module.start_date {
                let span = module_span(start, e.module.end_date);
                self.tree.set(instance, "MODINSTSTARTDATE", span.start)?;
                self.tree.set(instance, "MODINSTENDDATE", span.end)?;
            }
            self.tree
                .set(instance, "MODULEOUTCOME", e.result.data_futures_outcome.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReturnConfig;
    use crate::populate::PopulationOptions;
    use crate::progress::RecordingProgress;
    use statret_core::{AcademicYear, FieldValue, ReportingWindow};
    use statret_records::{InMemoryRecords, Selection};
    use std::collections::HashMap;
    use std::path::Path;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn records() -> InMemoryRecords {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/snapshot-2022.json");
        InMemoryRecords::from_path(&path).unwrap()
    }

    fn build(records: &InMemoryRecords) -> StagingTree {
        let window = ReportingWindow::for_year(AcademicYear::new(2022).unwrap());
        let selection = Selection::build(records, window).unwrap();
        let options = PopulationOptions::from(&ReturnConfig::default());
        let ids: HashMap<i64, String> = [(1, "1911560000010"), (2, "2211560000016"), (4, "2211560000024")]
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect();
        let population = Population {
            selection: &selection,
            options: &options,
            identifiers: &ids,
        };
        populate(population, &RecordingProgress::new()).unwrap()
    }

    fn field(tree: &StagingTree, kind: &str, key: &str, tag: &str) -> Option<String> {
        let id = tree.find(kind, key)?;
        tree.get(id)?.get(tag).map(FieldValue::render)
    }

    fn load_total(tree: &StagingTree, scs: RecordId) -> Decimal {
        tree.of_kind(df::REFERENCE_PERIOD_STUDENT_LOAD)
            .filter_map(|id| tree.get(id))
            .filter(|r| r.parent() == Some(scs))
            .filter_map(|r| match r.get("RPSTULOAD") {
                Some(FieldValue::Decimal(d)) => Some(*d),
                _ => None,
            })
            .sum()
    }

    // ── Reference collections ────────────────────────────────────────

    #[test]
    fn test_courses_and_qualifications() {
        let records = records();
        let tree = build(&records);
        assert_eq!(field(&tree, df::COURSE, "10", "QUALID").as_deref(), Some("qual-10"));
        assert_eq!(field(&tree, df::COURSE, "10", "PREREQUISITE").as_deref(), Some("01"));
        assert_eq!(field(&tree, df::COURSE, "20", "PREREQUISITE").as_deref(), Some("02"));
        assert_eq!(field(&tree, df::QUALIFICATION, "qual-20", "QUALCAT").as_deref(), Some("M90"));
        assert_eq!(
            field(&tree, df::AWARDING_BODY_ROLE, "qual-20", "AWARDINGBODYID").as_deref(),
            Some("10007774")
        );
        assert_eq!(field(&tree, df::COURSE_ROLE, "10", "ROLETYPE").as_deref(), Some("202"));
    }

    #[test]
    fn test_module_cost_centres_are_summed() {
        let records = records();
        let tree = build(&records);
        assert_eq!(
            field(&tree, df::MODULE_COST_CENTRE, "O22P102ARH-132", "COSTCNPROPORTION").as_deref(),
            Some("100")
        );
        assert_eq!(tree.counts().get(df::MODULE_COST_CENTRE), Some(&3));
        assert_eq!(field(&tree, df::MODULE, "O22P201SLM", "LEVLPTS").as_deref(), Some("7"));
    }

    #[test]
    fn test_session_year_and_venue() {
        let records = records();
        let tree = build(&records);
        assert_eq!(
            field(&tree, df::SESSION_YEAR, SESSION_YEAR_ID, "SYSTARTDATE").as_deref(),
            Some("2022-08-01")
        );
        assert_eq!(
            field(&tree, df::SESSION_YEAR, SESSION_YEAR_ID, "SYENDDATE").as_deref(),
            Some("2023-07-31")
        );
        assert_eq!(field(&tree, df::VENUE, "rewley-house", "POSTCODE").as_deref(), Some("OX1 2JA"));
        assert_eq!(field(&tree, df::VENUE, "rewley-house", "VENUEUKPRN").as_deref(), Some("10007774"));
    }

    // ── Students ─────────────────────────────────────────────────────

    #[test]
    fn test_student_fields() {
        let records = records();
        let tree = build(&records);
        assert_eq!(field(&tree, df::STUDENT, "1", "SID").as_deref(), Some("1911560000010"));
        assert_eq!(field(&tree, df::STUDENT, "1", "SEXID").as_deref(), Some("10"));
        assert_eq!(field(&tree, df::STUDENT, "1", "GENDERID").as_deref(), Some("01"));
        assert_eq!(field(&tree, df::STUDENT, "1", "ETHNIC").as_deref(), Some("160"));
        assert_eq!(field(&tree, df::STUDENT, "1", "TTPCODE").as_deref(), Some("OX1 2JA"));
        // Invalid postcode omitted rather than emptied.
        assert_eq!(field(&tree, df::STUDENT, "2", "TTPCODE"), None);
        assert_eq!(field(&tree, df::STUDENT, "2", "SEXID").as_deref(), Some("11"));
        assert_eq!(field(&tree, df::DISABILITY, "2-54", "DISABILITY").as_deref(), Some("54"));
        assert_eq!(field(&tree, df::STUDENT, "4", "TTACCOM").as_deref(), Some("04"));
    }

    #[test]
    fn test_entry_profile_by_qualification_category() {
        let records = records();
        let tree = build(&records);
        assert_eq!(field(&tree, df::ENTRY_PROFILE, "1000-2022", "CARELEAVER").as_deref(), Some("99"));
        assert_eq!(field(&tree, df::ENTRY_PROFILE, "1000-2022", "PARED").as_deref(), Some("01"));
        assert_eq!(
            field(&tree, df::ENTRY_PROFILE, "1000-2022", "PERMADDPOSTCODE").as_deref(),
            Some("OX1 2JA")
        );
        assert_eq!(field(&tree, df::ENTRY_PROFILE, "4000-2022", "CARELEAVER"), None);
        assert_eq!(field(&tree, df::ENTRY_PROFILE, "4000-2022", "PERMADDCOUNTRY").as_deref(), Some("97"));
        assert_eq!(field(&tree, df::ENTRY_PROFILE, "4000-2022", "PERMADDPOSTCODE"), None);
    }

    // ── Engagements ──────────────────────────────────────────────────

    #[test]
    fn test_engagement_ending_and_award() {
        let records = records();
        let tree = build(&records);
        assert_eq!(field(&tree, df::ENGAGEMENT, "1000-2022", "ENGSTARTDATE").as_deref(), Some("2022-10-01"));
        assert_eq!(field(&tree, df::LEAVER, "1000-2022", "RSNENGEND").as_deref(), Some("01"));
        assert_eq!(
            field(&tree, df::QUALIFICATION_AWARDED, "qual-award-1000-2022", "QUALID").as_deref(),
            Some("qual-10")
        );
        assert_eq!(field(&tree, df::LEAVER, "2000-2022", "RSNENGEND").as_deref(), Some("11"));
        assert!(tree.find(df::QUALIFICATION_AWARDED, "qual-award-2000-2022").is_none());
        assert_eq!(field(&tree, df::ENGAGEMENT, "4000-2022", "RCSTDNT").as_deref(), Some("9997"));
        assert_eq!(field(&tree, df::ENGAGEMENT, "2000-2022", "FEEELIG").as_deref(), Some("02"));
    }

    #[test]
    fn test_course_session_children() {
        let records = records();
        let tree = build(&records);
        let scs = "scs-1000-2022";
        assert_eq!(field(&tree, df::STUDENT_COURSE_SESSION, scs, "INVOICEFEEAMOUNT").as_deref(), Some("321"));
        assert_eq!(field(&tree, df::FUNDING_AND_MONITORING, scs, "ELQ").as_deref(), Some("03"));
        assert_eq!(field(&tree, df::FUNDING_AND_MONITORING, scs, "FUNDCOMP").as_deref(), Some("03"));
        assert_eq!(field(&tree, df::FUNDING_BODY, scs, "FUNDINGBODY").as_deref(), Some("5016"));
        assert!(tree.find(df::FUNDING_BODY, "scs-2000-2022").is_none());
        assert_eq!(
            field(&tree, df::STUDY_LOCATION, "study-location-1000-2022", "VENUEID").as_deref(),
            Some("rewley-house")
        );
        assert_eq!(field(&tree, df::STUDY_LOCATION, "study-location-1000-2022", "DISTANCE"), None);
    }

    #[test]
    fn test_module_instance_dates_and_fee() {
        let records = records();
        let tree = build(&records);
        assert_eq!(field(&tree, df::MODULE_INSTANCE, "1", "MODINSTSTARTDATE").as_deref(), Some("2022-10-01"));
        assert_eq!(field(&tree, df::MODULE_INSTANCE, "1", "MODINSTENDDATE").as_deref(), Some("2022-12-09"));
        assert_eq!(field(&tree, df::MODULE_INSTANCE, "1", "MIFEEAMOUNT").as_deref(), Some("251"));
        assert_eq!(field(&tree, df::MODULE_INSTANCE, "2", "MODULEOUTCOME").as_deref(), Some("05"));
    }

    #[test]
    fn test_reference_period_loads() {
        let records = records();
        let tree = build(&records);
        let scs = tree.find(df::STUDENT_COURSE_SESSION, "scs-1000-2022").unwrap();
        assert_eq!(
            field(&tree, df::REFERENCE_PERIOD_STUDENT_LOAD, "scs-1000-2022-01", "RPSTULOAD").as_deref(),
            Some("6.6")
        );
        assert_eq!(
            field(&tree, df::REFERENCE_PERIOD_STUDENT_LOAD, "scs-1000-2022-03", "YEAR").as_deref(),
            Some("2022")
        );
        // Rounded per period, so the total stays within rounding of the full load.
        let total = load_total(&tree, scs);
        let full = Decimal::from(15);
        assert!((total - full).abs() <= Decimal::from_str("0.15").unwrap(), "{total}");
    }
}
