//! The data-futures collection: a flat `Batch` root holding typed
//! collections, with the person-level detail nested under `Student`.

use statret_core::Generation;

use crate::schema::{EntityDef, FieldDef, SchemaDef};

pub const COURSE: &str = "Course";
pub const COURSE_ROLE: &str = "CourseRole";
pub const MODULE: &str = "Module";
pub const MODULE_COST_CENTRE: &str = "ModuleCostCentre";
pub const MODULE_SUBJECT: &str = "ModuleSubject";
pub const QUALIFICATION: &str = "Qualification";
pub const AWARDING_BODY_ROLE: &str = "AwardingBodyRole";
pub const QUALIFICATION_SUBJECT: &str = "QualificationSubject";
pub const SESSION_YEAR: &str = "SessionYear";
pub const STUDENT: &str = "Student";
pub const DISABILITY: &str = "Disability";
pub const ENGAGEMENT: &str = "Engagement";
pub const ENTRY_PROFILE: &str = "EntryProfile";
pub const LEAVER: &str = "Leaver";
pub const QUALIFICATION_AWARDED: &str = "QualificationAwarded";
pub const STUDENT_COURSE_SESSION: &str = "StudentCourseSession";
pub const FUNDING_AND_MONITORING: &str = "FundingAndMonitoring";
pub const FUNDING_BODY: &str = "FundingBody";
pub const MODULE_INSTANCE: &str = "ModuleInstance";
pub const REFERENCE_PERIOD_STUDENT_LOAD: &str = "ReferencePeriodStudentLoad";
pub const STUDY_LOCATION: &str = "StudyLocation";
pub const VENUE: &str = "Venue";

/// Session year shared by every short-course session.
pub const SESSION_YEAR_ID: &str = "short-course-year";

pub static SCHEMA: SchemaDef = SchemaDef {
    generation: Generation::DataFutures,
    root_element: "Batch",
    root_children: &[COURSE, MODULE, QUALIFICATION, SESSION_YEAR, STUDENT, VENUE],
    entities: &[
        EntityDef {
            name: COURSE,
            fields: &[
                FieldDef::optional("COURSEID"),
                FieldDef::fixed("CLSDCRS", "02"),
                FieldDef::optional("COURSETITLE"),
                FieldDef::optional("PREREQUISITE"),
                FieldDef::optional("QUALID"),
                FieldDef::fixed("TTCID", "07"),
            ],
            children: &[COURSE_ROLE],
        },
        EntityDef {
            name: COURSE_ROLE,
            fields: &[
                FieldDef::ukprn("HESAID"),
                FieldDef::fixed("ROLETYPE", "202"),
                FieldDef::fixed("CRPROPORTION", "100"),
            ],
            children: &[],
        },
        EntityDef {
            name: MODULE,
            fields: &[
                FieldDef::optional("MODID"),
                FieldDef::optional("CRDTPTS"),
                FieldDef::fixed("CRDTSCM", "01"),
                FieldDef::optional("FTE"),
                FieldDef::optional("LEVLPTS"),
                FieldDef::optional("MTITLE"),
            ],
            children: &[MODULE_COST_CENTRE, MODULE_SUBJECT],
        },
        EntityDef {
            name: MODULE_COST_CENTRE,
            fields: &[FieldDef::optional("COSTCN"), FieldDef::optional("COSTCNPROPORTION")],
            children: &[],
        },
        EntityDef {
            name: MODULE_SUBJECT,
            fields: &[FieldDef::optional("MODSBJ"), FieldDef::optional("MODPROPORTION")],
            children: &[],
        },
        EntityDef {
            name: QUALIFICATION,
            fields: &[FieldDef::optional("QUALID"), FieldDef::optional("QUALCAT")],
            children: &[AWARDING_BODY_ROLE, QUALIFICATION_SUBJECT],
        },
        EntityDef {
            name: AWARDING_BODY_ROLE,
            fields: &[FieldDef::ukprn("AWARDINGBODYID")],
            children: &[],
        },
        EntityDef {
            name: QUALIFICATION_SUBJECT,
            fields: &[FieldDef::optional("QUALSUBJECT"), FieldDef::optional("QUALPROPORTION")],
            children: &[],
        },
        EntityDef {
            name: SESSION_YEAR,
            fields: &[
                FieldDef::optional("SESSIONYEARID"),
                FieldDef::optional("SYENDDATE"),
                FieldDef::optional("SYSTARTDATE"),
            ],
            children: &[],
        },
        EntityDef {
            name: STUDENT,
            fields: &[
                FieldDef::optional("SID"),
                FieldDef::optional("BIRTHDTE"),
                FieldDef::optional("ETHNIC"),
                FieldDef::optional("FNAMES"),
                FieldDef::optional("GENDERID"),
                FieldDef::optional("NATION"),
                FieldDef::optional("OWNSTU"),
                FieldDef::optional("RELIGION"),
                FieldDef::optional("SEXID"),
                FieldDef::optional("SEXORT"),
                FieldDef::optional("SSN"),
                FieldDef::optional("SURNAME"),
                FieldDef::optional("TTACCOM"),
                FieldDef::optional("TTPCODE"),
            ],
            children: &[DISABILITY, ENGAGEMENT],
        },
        EntityDef {
            name: DISABILITY,
            fields: &[FieldDef::optional("DISABILITY")],
            children: &[],
        },
        EntityDef {
            name: ENGAGEMENT,
            fields: &[
                FieldDef::optional("NUMHUS"),
                FieldDef::optional("ENGEXPECTEDENDDATE"),
                FieldDef::optional("ENGSTARTDATE"),
                FieldDef::optional("FEEELIG"),
                FieldDef::optional("RCSTDNT"),
            ],
            children: &[ENTRY_PROFILE, LEAVER, QUALIFICATION_AWARDED, STUDENT_COURSE_SESSION],
        },
        EntityDef {
            name: ENTRY_PROFILE,
            fields: &[
                FieldDef::optional("CARELEAVER"),
                FieldDef::optional("HIGHESTQOE"),
                FieldDef::optional("PARED"),
                FieldDef::optional("PERMADDCOUNTRY"),
                FieldDef::optional("PERMADDPOSTCODE"),
            ],
            children: &[],
        },
        EntityDef {
            name: LEAVER,
            fields: &[FieldDef::optional("ENGENDDATE"), FieldDef::optional("RSNENGEND")],
            children: &[],
        },
        EntityDef {
            name: QUALIFICATION_AWARDED,
            fields: &[
                FieldDef::optional("QUALAWARDID"),
                FieldDef::optional("QUALID"),
                FieldDef::fixed("QUALRESULT", "0013"),
            ],
            children: &[],
        },
        EntityDef {
            name: STUDENT_COURSE_SESSION,
            fields: &[
                FieldDef::optional("SCSESSIONID"),
                FieldDef::optional("COURSEID"),
                FieldDef::optional("INVOICEFEEAMOUNT"),
                FieldDef::fixed("INVOICEHESAID", "5050"),
                FieldDef::optional("RSNSCSEND"),
                FieldDef::optional("SCSENDDATE"),
                FieldDef::fixed("SCSMODE", "31"),
                FieldDef::optional("SCSSTARTDATE"),
                FieldDef::optional("SESSIONYEARID"),
                FieldDef::fixed("YEARPRG", "99"),
            ],
            children: &[
                FUNDING_AND_MONITORING,
                FUNDING_BODY,
                MODULE_INSTANCE,
                REFERENCE_PERIOD_STUDENT_LOAD,
                STUDY_LOCATION,
            ],
        },
        EntityDef {
            name: FUNDING_AND_MONITORING,
            fields: &[
                FieldDef::optional("ELQ"),
                FieldDef::optional("FUNDCOMP"),
                FieldDef::fixed("FUNDLENGTH", "02"),
                FieldDef::fixed("NONREGFEE", "01"),
            ],
            children: &[],
        },
        EntityDef {
            name: FUNDING_BODY,
            fields: &[FieldDef::optional("FUNDINGBODY")],
            children: &[],
        },
        EntityDef {
            name: MODULE_INSTANCE,
            fields: &[
                FieldDef::optional("MODINSTID"),
                FieldDef::optional("CONTINUING"),
                FieldDef::optional("MIFEEAMOUNT"),
                FieldDef::optional("MODID"),
                FieldDef::optional("MODINSTENDDATE"),
                FieldDef::optional("MODINSTSTARTDATE"),
                FieldDef::optional("MODULEOUTCOME"),
            ],
            children: &[],
        },
        EntityDef {
            name: REFERENCE_PERIOD_STUDENT_LOAD,
            fields: &[
                FieldDef::optional("REFPERIOD"),
                FieldDef::optional("YEAR"),
                FieldDef::optional("RPSTULOAD"),
            ],
            children: &[],
        },
        EntityDef {
            name: STUDY_LOCATION,
            fields: &[
                FieldDef::optional("STUDYLOCID"),
                FieldDef::optional("DISTANCE"),
                FieldDef::optional("STUDYPROPORTION"),
                FieldDef::optional("VENUEID"),
            ],
            children: &[],
        },
        EntityDef {
            name: VENUE,
            fields: &[
                FieldDef::optional("VENUEID"),
                FieldDef::optional("POSTCODE"),
                FieldDef::optional("VENUENAME"),
                FieldDef::ukprn("VENUEUKPRN"),
            ],
            children: &[],
        },
    ],
};
