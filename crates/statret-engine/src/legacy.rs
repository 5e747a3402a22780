//! Legacy student record population.
//!
//! Phases, in order: institution, courses, modules, students, instances,
//! student modules. Everything hangs off the single `Institution`.

use statret_core::{keys, FieldValue};
use statret_records::{SelectedAim, SelectedStudent};
use statret_rules::codes::{self, pad};
use statret_rules::outcomes::{self, OutcomeSet};
use statret_rules::{fees, normalize_postcode, normalize_to_latin1, upper_names};
use statret_staging::legacy::{self, SCHEMA};
use statret_staging::{RecordId, StagingTree};

use crate::error::EngineError;
use crate::populate::{self, all_fees, earliest_start, int, total_fte, Phase, Population};
use crate::progress::ProgressSink;

pub(crate) fn populate(
    population: Population<'_>,
    progress: &dyn ProgressSink,
) -> Result<StagingTree, EngineError> {
    let mut builder = LegacyBuilder {
        tree: StagingTree::new(&SCHEMA, population.options.ukprn.clone()),
        population,
        institution: None,
    };
    let phases: [Phase<LegacyBuilder<'_>>; 6] = [
        ("building institution", LegacyBuilder::institution),
        ("building courses", LegacyBuilder::courses),
        ("building modules", LegacyBuilder::modules),
        ("building students", LegacyBuilder::students),
        ("building instances", LegacyBuilder::instances),
        ("building student modules", LegacyBuilder::student_modules),
    ];
    populate::run_phases(&mut builder, &phases, progress)?;
    Ok(builder.tree)
}

struct LegacyBuilder<'p> {
    tree: StagingTree,
    population: Population<'p>,
    institution: Option<RecordId>,
}

impl populate::Builder for LegacyBuilder<'_> {
    fn tree(&self) -> &StagingTree {
        &self.tree
    }
}

impl<'p> LegacyBuilder<'p> {
    fn year(&self) -> statret_core::AcademicYear {
        self.population.selection.window().year
    }

    fn institution(&mut self) -> Result<(), EngineError> {
        let recid = keys::legacy_record_id(self.year());
        let id = self.tree.insert(legacy::INSTITUTION, recid.clone(), None)?;
        self.tree.set(id, "RECID", recid)?;
        self.institution = Some(id);
        Ok(())
    }

    fn courses(&mut self) -> Result<(), EngineError> {
        for (programme, qualification) in self.population.selection.programmes() {
            let id = self
                .tree
                .insert(legacy::COURSE, programme.id.to_string(), self.institution)?;
            self.tree.set(id, "COURSEID", programme.id)?;
            self.tree.set(id, "OWNCOURSEID", programme.id)?;
            self.tree.set(id, "COURSEAIM", qualification.hesa_code.as_str())?;
            self.tree.set(id, "CTITLE", programme.title.as_str())?;
            let msfund = programme.funding_source.map(|s| s.to_string()).unwrap_or_default();
            self.tree.set(id, "MSFUND", pad(msfund, 2))?;

            for (n, share) in programme.subjects.iter().enumerate() {
                let subject = self.tree.insert(
                    legacy::COURSE_SUBJECT,
                    format!("{}-{n}", programme.id),
                    Some(id),
                )?;
                self.tree.set(subject, "SBJCA", share.subject.as_str())?;
                self.tree.set(subject, "SBJPCNT", i64::from(share.percentage))?;
            }
        }
        Ok(())
    }

    fn modules(&mut self) -> Result<(), EngineError> {
        for module in self.population.selection.modules() {
            let id = self
                .tree
                .insert(legacy::MODULE, module.code.clone(), self.institution)?;
            self.tree.set(id, "MODID", module.code.as_str())?;
            self.tree.set_opt(id, "CRDTPTS", module.credit_points.map(|c| pad(c, 3)))?;
            self.tree.set(id, "FTE", module.full_time_equivalent)?;
            self.tree
                .set_opt(id, "LEVLPTS", module.points_level.as_ref().map(|l| i64::from(l.id)))?;
            self.tree.set(id, "MTITLE", normalize_to_latin1(&module.title))?;

            for (n, share) in module.subjects.iter().enumerate() {
                let subject = self.tree.insert(
                    legacy::MODULE_SUBJECT,
                    format!("{}-{n}", module.code),
                    Some(id),
                )?;
                self.tree.set_opt(subject, "COSTCN", int(share.cost_centre))?;
                self.tree.set(subject, "MODSBJ", share.subject.as_str())?;
                self.tree.set(subject, "MODSBJP", i64::from(share.percentage))?;
            }
        }
        Ok(())
    }

    fn students(&mut self) -> Result<(), EngineError> {
        let population = self.population;
        for selected in population.selection.students() {
            let student = selected.student;
            let id = self
                .tree
                .insert(legacy::STUDENT, student.id.to_string(), self.institution)?;
            self.tree.set(id, "HUSID", pad(population.identifier(student)?, 13))?;
            self.tree.set(id, "OWNSTU", student.own_id())?;
            self.tree.set_opt(id, "BIRTHDTE", student.birthdate)?;
            self.tree.set(id, "DISABLE", pad(student.disability.unwrap_or(0), 2))?;
            self.tree
                .set_opt(id, "ETHNIC", student.ethnicity.as_ref().map(|c| pad(c.id, 2)))?;
            self.tree.set(
                id,
                "FNAMES",
                upper_names(&student.firstname, student.middlename.as_deref()),
            )?;
            self.tree.set_opt(id, "GENDERID", int(student.gender_identity))?;
            self.tree.set_opt(id, "NATION", student.nationality.as_deref())?;
            self.tree.set_opt(
                id,
                "RELBLF",
                student.religion_or_belief.as_ref().map(|c| pad(c.id, 2)),
            )?;
            self.tree.set_opt(id, "SEXID", student.sex.as_deref())?;
            self.tree.set_opt(
                id,
                "SEXORT",
                student.sexual_orientation.as_ref().map(|c| i64::from(c.id)),
            )?;
            self.tree.set_opt(id, "SSN", student.ssn.as_deref())?;
            self.tree.set(id, "SURNAME", student.surname.to_uppercase())?;
            self.tree.set_opt(id, "TTACCOM", int(student.termtime_accommodation))?;

            if let Some(raw) = student.termtime_postcode.as_ref().or(student.postcode.as_ref()) {
                let postcode = normalize_postcode(raw).map_or(FieldValue::Empty, FieldValue::Text);
                self.tree.set(id, "TTPCODE", postcode)?;
            }
        }
        tracing::debug!(students = population.selection.students().len(), "legacy students built");
        Ok(())
    }

    fn instances(&mut self) -> Result<(), EngineError> {
        let population = self.population;
        for (selected, aim) in population.selection.aims() {
            self.instance(selected, aim)?;
        }
        Ok(())
    }

    fn instance(&mut self, selected: &SelectedStudent<'_>, aim: &SelectedAim<'_>) -> Result<(), EngineError> {
        let window = *self.population.selection.window();
        let student = selected.student;
        let parent = self.tree.find(legacy::STUDENT, &student.id.to_string());
        let numhus = keys::engagement_key(aim.aim.id, window.year);
        let id = self.tree.insert(legacy::INSTANCE, numhus.clone(), parent)?;
        let enrolments = &aim.enrolments;
        let outcomes = OutcomeSet::legacy(enrolments);
        let eligible = if student.home_fee_eligible { 1i64 } else { 2 };

        self.tree.set(id, "NUMHUS", numhus.as_str())?;
        self.tree.set(id, "COURSEID", aim.programme.id)?;
        self.tree.set_opt(id, "COMDATE", earliest_start(enrolments))?;
        if student.disability.unwrap_or(0) != 0 {
            self.tree.set(id, "DISALL", 5i64)?;
        }
        let entry_rank = aim.entry_qualification.map(|e| e.elq_rank);
        self.tree
            .set_opt(id, "ELQ", codes::elq(aim.qualification.elq_rank, entry_rank))?;
        self.tree.set(id, "ENDDATE", window.year_end)?;
        self.tree.set(id, "FEEELIG", eligible)?;
        self.tree.set(id, "FUNDCODE", eligible)?;

        let completion = outcomes::legacy_completion(&outcomes);
        self.tree.set(id, "FUNDCOMP", completion.code)?;
        self.tree.set_opt(id, "FUNDLEV", int(aim.programme.funding_level))?;
        self.tree.set(id, "GROSSFEE", fees::gross_fee(all_fees(enrolments)))?;
        self.tree.set(id, "LOCSDY", aim.study_location.hesa_code.as_str())?;
        self.tree.set_opt(id, "MODE", int(aim.programme.study_mode))?;
        self.tree.set(id, "MSTUFEE", "01")?;
        self.tree.set(id, "NETFEE", fees::net_fee(all_fees(enrolments)))?;
        if codes::research_council_applies(&aim.qualification.hesa_code) {
            self.tree.set(id, "RCSTDNT", 99i64)?;
        }

        let fallback = self.population.options.ending_fallback;
        let ending = outcomes::legacy_reason_for_ending(&outcomes, fallback);
        if !ending.matched {
            tracing::warn!(
                instance = %numhus,
                fallback = %fallback,
                code = ending.code,
                "no outcome matched a reason for ending, using fallback"
            );
        }
        self.tree.set(id, "RSNEND", ending.code)?;
        self.tree.set(id, "STULOAD", total_fte(enrolments))?;
        self.tree
            .set_opt(id, "TYPEYR", int(aim.programme.reporting_year_type))?;

        self.entry_profile(id, &numhus, selected, aim)?;

        if ending.code == outcomes::COMPLETED {
            let award = self
                .tree
                .insert(legacy::QUALIFICATIONS_AWARDED, numhus.clone(), Some(id))?;
            self.tree.set(award, "QUAL", aim.qualification.hesa_code.as_str())?;
        }
        Ok(())
    }

    fn entry_profile(
        &mut self,
        instance: RecordId,
        numhus: &str,
        selected: &SelectedStudent<'_>,
        aim: &SelectedAim<'_>,
    ) -> Result<(), EngineError> {
        let student = selected.student;
        let id = self
            .tree
            .insert(legacy::ENTRY_PROFILE, numhus, Some(instance))?;
        self.tree.set_opt(
            id,
            "DOMICILE",
            student.domicile.as_ref().map(|d| d.hesa_code.as_str()),
        )?;
        self.tree.set_opt(
            id,
            "QUALENT3",
            aim.entry_qualification.map(|e| e.id.as_str()),
        )?;
        if let Some(parents) = &student.parental_education {
            self.tree.set(id, "PARED", i64::from(parents.id))?;
        }

        let postcode_domicile = student
            .domicile
            .as_ref()
            .is_some_and(|d| codes::POSTCODE_DOMICILES.contains(&d.hesa_code.as_str()));
        if postcode_domicile {
            if let Some(raw) = student.termtime_postcode.as_ref().or(student.postcode.as_ref()) {
                let postcode = normalize_postcode(raw).map_or(FieldValue::Empty, FieldValue::Text);
                self.tree.set(id, "POSTCODE", postcode)?;
            }
        }
        Ok(())
    }

    fn student_modules(&mut self) -> Result<(), EngineError> {
        let population = self.population;
        let year = self.year();
        for (_, aim) in population.selection.aims() {
            let parent = self
                .tree
                .find(legacy::INSTANCE, &keys::engagement_key(aim.aim.id, year));
            for e in &aim.enrolments {
                let id = self.tree.insert(
                    legacy::STUDENT_ON_MODULE,
                    e.enrolment.id.to_string(),
                    parent,
                )?;
                self.tree.set(id, "MODID", e.module.code.as_str())?;
                self.tree.set(id, "MODOUT", e.result.hesa_code.as_str())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populate::PopulationOptions;
    use crate::progress::RecordingProgress;
    use statret_core::{AcademicYear, ReportingWindow};
    use statret_records::{InMemoryRecords, Selection, Snapshot};
    use std::collections::HashMap;
    use std::path::Path;

    fn records() -> InMemoryRecords {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/snapshot-2022.json");
        InMemoryRecords::from_path(&path).unwrap()
    }

    fn options() -> PopulationOptions {
        PopulationOptions::from(&crate::config::ReturnConfig::default())
    }

    fn identifiers() -> HashMap<i64, String> {
        [(1, "1911560000010"), (2, "2211560000016"), (4, "2211560000024")]
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect()
    }

    fn build(records: &InMemoryRecords) -> StagingTree {
        let window = ReportingWindow::for_year(AcademicYear::new(2022).unwrap());
        let selection = Selection::build(records, window).unwrap();
        let options = options();
        let ids = identifiers();
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

    // ── Reference entities ───────────────────────────────────────────

    #[test]
    fn test_institution_and_courses() {
        let records = records();
        let tree = build(&records);
        assert_eq!(field(&tree, legacy::INSTITUTION, "22051", "RECID").as_deref(), Some("22051"));
        assert_eq!(field(&tree, legacy::INSTITUTION, "22051", "UKPRN").as_deref(), Some("10007774"));
        assert_eq!(field(&tree, legacy::COURSE, "20", "COURSEAIM").as_deref(), Some("M90"));
        assert_eq!(field(&tree, legacy::COURSE, "20", "MSFUND").as_deref(), Some("01"));
        assert_eq!(tree.counts().get(legacy::COURSE_SUBJECT), Some(&3));
    }

    #[test]
    fn test_module_fields() {
        let records = records();
        let tree = build(&records);
        assert_eq!(field(&tree, legacy::MODULE, "O22P101ARH", "CRDTPTS").as_deref(), Some("020"));
        assert_eq!(
            field(&tree, legacy::MODULE, "O22P101ARH", "MTITLE").as_deref(),
            Some("Roman Britain - an introduction")
        );
        assert_eq!(field(&tree, legacy::MODULE, "O22P101ARH", "LEVLPTS").as_deref(), Some("4"));
        assert!(tree.find(legacy::MODULE, "O23P001ARH").is_none());
    }

    // ── Person detail ────────────────────────────────────────────────

    #[test]
    fn test_student_fields() {
        let records = records();
        let tree = build(&records);
        assert_eq!(field(&tree, legacy::STUDENT, "1", "HUSID").as_deref(), Some("1911560000010"));
        assert_eq!(field(&tree, legacy::STUDENT, "1", "OWNSTU").as_deref(), Some("500001"));
        assert_eq!(field(&tree, legacy::STUDENT, "1", "FNAMES").as_deref(), Some("ADA KING"));
        assert_eq!(field(&tree, legacy::STUDENT, "1", "SURNAME").as_deref(), Some("LOVELACE"));
        assert_eq!(field(&tree, legacy::STUDENT, "1", "ETHNIC").as_deref(), Some("10"));
        assert_eq!(field(&tree, legacy::STUDENT, "1", "TTPCODE").as_deref(), Some("OX1 2JA"));
        // Non-UK postcode: present but empty.
        assert_eq!(field(&tree, legacy::STUDENT, "2", "TTPCODE").as_deref(), Some(""));
        assert_eq!(field(&tree, legacy::STUDENT, "4", "TTPCODE").as_deref(), Some("OX33 2JA"));
    }

    #[test]
    fn test_instance_derivations() {
        let records = records();
        let tree = build(&records);
        let key = "1000-2022";
        assert_eq!(field(&tree, legacy::INSTANCE, key, "COMDATE").as_deref(), Some("2022-10-01"));
        assert_eq!(field(&tree, legacy::INSTANCE, key, "ENDDATE").as_deref(), Some("2023-07-31"));
        assert_eq!(field(&tree, legacy::INSTANCE, key, "STULOAD").as_deref(), Some("15"));
        assert_eq!(field(&tree, legacy::INSTANCE, key, "GROSSFEE").as_deref(), Some("371"));
        assert_eq!(field(&tree, legacy::INSTANCE, key, "NETFEE").as_deref(), Some("321"));
        assert_eq!(field(&tree, legacy::INSTANCE, key, "RSNEND").as_deref(), Some("01"));
        assert_eq!(field(&tree, legacy::INSTANCE, key, "FUNDCOMP").as_deref(), Some("3"));
        assert_eq!(field(&tree, legacy::INSTANCE, key, "ELQ").as_deref(), Some("03"));
        assert_eq!(field(&tree, legacy::INSTANCE, key, "FEEELIG").as_deref(), Some("1"));
        assert_eq!(field(&tree, legacy::QUALIFICATIONS_AWARDED, key, "QUAL").as_deref(), Some("C20"));

        // Masters aim: research-council marker, no award when failed.
        assert_eq!(field(&tree, legacy::INSTANCE, "1001-2022", "RCSTDNT").as_deref(), Some("99"));
        assert_eq!(field(&tree, legacy::INSTANCE, "2000-2022", "RSNEND").as_deref(), Some("02"));
        assert!(tree.find(legacy::QUALIFICATIONS_AWARDED, "2000-2022").is_none());
        assert_eq!(field(&tree, legacy::INSTANCE, "2000-2022", "DISALL").as_deref(), Some("5"));
        assert_eq!(field(&tree, legacy::INSTANCE, "2000-2022", "FUNDCODE").as_deref(), Some("2"));
    }

    #[test]
    fn test_entry_profile_postcode_only_for_uk_domiciles() {
        let records = records();
        let tree = build(&records);
        assert_eq!(field(&tree, legacy::ENTRY_PROFILE, "1000-2022", "POSTCODE").as_deref(), Some("OX1 2JA"));
        assert_eq!(field(&tree, legacy::ENTRY_PROFILE, "1000-2022", "QUALENT3").as_deref(), Some("P50"));
        assert_eq!(field(&tree, legacy::ENTRY_PROFILE, "2000-2022", "POSTCODE"), None);
        assert_eq!(field(&tree, legacy::ENTRY_PROFILE, "2000-2022", "DOMICILE").as_deref(), Some("US"));
    }

    #[test]
    fn test_entry_profile_postcode_prefers_term_time_address() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/snapshot-2022.json");
        let mut snapshot = Snapshot::from_path(&path).unwrap();
        let student = snapshot.students.iter_mut().find(|s| s.id == 1).unwrap();
        student.termtime_postcode = Some("ox2 6nn".to_string());
        let records = InMemoryRecords::from_snapshot(snapshot).unwrap();

        let tree = build(&records);
        assert_eq!(field(&tree, legacy::ENTRY_PROFILE, "1000-2022", "POSTCODE").as_deref(), Some("OX2 6NN"));
        assert_eq!(field(&tree, legacy::STUDENT, "1", "TTPCODE").as_deref(), Some("OX2 6NN"));
    }

    #[test]
    fn test_student_modules_hang_off_instances() {
        let records = records();
        let tree = build(&records);
        let sm = tree.find(legacy::STUDENT_ON_MODULE, "2").unwrap();
        let instance = tree.ancestor_of_kind(sm, legacy::INSTANCE).unwrap();
        assert_eq!(tree.get(instance).unwrap().key(), "1000-2022");
        assert_eq!(field(&tree, legacy::STUDENT_ON_MODULE, "2", "MODOUT").as_deref(), Some("6"));
        assert_eq!(tree.counts().get(legacy::STUDENT_ON_MODULE), Some(&5));
    }

    // ── Progress ─────────────────────────────────────────────────────

    #[test]
    fn test_reports_six_phases() {
        let records = records();
        let window = ReportingWindow::for_year(AcademicYear::new(2022).unwrap());
        let selection = Selection::build(&records, window).unwrap();
        let options = options();
        let ids = identifiers();
        let progress = RecordingProgress::new();
        let population = Population {
            selection: &selection,
            options: &options,
            identifiers: &ids,
        };
        populate(population, &progress).unwrap();
        let events = progress.events();
        assert_eq!(events.len(), 6);
        assert_eq!(events[3].label, "building students");
        assert_eq!((events[3].index, events[3].total), (4, 6));
    }

    #[test]
    fn test_missing_identifier_fails() {
        let records = records();
        let window = ReportingWindow::for_year(AcademicYear::new(2022).unwrap());
        let selection = Selection::build(&records, window).unwrap();
        let options = options();
        let ids = HashMap::new();
        let population = Population {
            selection: &selection,
            options: &options,
            identifiers: &ids,
        };
        let err = populate(population, &RecordingProgress::new()).unwrap_err();
        assert!(matches!(err, EngineError::MissingIdentifier { student: 1 }));
    }
}
