//! The legacy student record: one `Institution` under `StudentRecord`,
//! with courses, modules and students nested beneath it.

use statret_core::Generation;

use crate::schema::{EntityDef, FieldDef, SchemaDef};

pub const INSTITUTION: &str = "Institution";
pub const COURSE: &str = "Course";
pub const COURSE_SUBJECT: &str = "CourseSubject";
pub const MODULE: &str = "Module";
pub const MODULE_SUBJECT: &str = "ModuleSubject";
pub const STUDENT: &str = "Student";
pub const INSTANCE: &str = "Instance";
pub const ENTRY_PROFILE: &str = "EntryProfile";
pub const QUALIFICATIONS_AWARDED: &str = "QualificationsAwarded";
pub const STUDENT_ON_MODULE: &str = "StudentOnModule";

pub static SCHEMA: SchemaDef = SchemaDef {
    generation: Generation::Legacy,
    root_element: "StudentRecord",
    root_children: &[INSTITUTION],
    entities: &[
        EntityDef {
            name: INSTITUTION,
            fields: &[
                FieldDef::fixed("INSTAPP", "0"),
                FieldDef::optional("RECID"),
                FieldDef::ukprn("UKPRN"),
            ],
            children: &[COURSE, MODULE, STUDENT],
        },
        EntityDef {
            name: COURSE,
            fields: &[
                FieldDef::optional("COURSEID"),
                FieldDef::optional("OWNCOURSEID"),
                FieldDef::ukprn("AWARDBOD"),
                FieldDef::fixed("CLSDCRS", "0"),
                FieldDef::fixed("COLLORG", "0000"),
                FieldDef::optional("COURSEAIM"),
                FieldDef::optional("CTITLE"),
                FieldDef::optional("MSFUND"),
                FieldDef::fixed("REDUCEDC", "00"),
                FieldDef::fixed("TTCID", "0"),
            ],
            children: &[COURSE_SUBJECT],
        },
        EntityDef {
            name: COURSE_SUBJECT,
            fields: &[FieldDef::optional("SBJCA"), FieldDef::optional("SBJPCNT")],
            children: &[],
        },
        EntityDef {
            name: MODULE,
            fields: &[
                FieldDef::optional("MODID"),
                FieldDef::optional("CRDTPTS"),
                FieldDef::fixed("CRDTSCM", "1"),
                FieldDef::optional("FTE"),
                FieldDef::optional("LEVLPTS"),
                FieldDef::optional("MTITLE"),
                FieldDef::fixed("PCOLAB", "0"),
                FieldDef::optional("TINST"),
            ],
            children: &[MODULE_SUBJECT],
        },
        EntityDef {
            name: MODULE_SUBJECT,
            fields: &[
                FieldDef::optional("COSTCN"),
                FieldDef::optional("MODSBJ"),
                FieldDef::optional("MODSBJP"),
            ],
            children: &[],
        },
        EntityDef {
            name: STUDENT,
            fields: &[
                FieldDef::optional("HUSID"),
                FieldDef::optional("OWNSTU"),
                FieldDef::required("BIRTHDTE"),
                FieldDef::optional("DISABLE"),
                FieldDef::optional("ETHNIC"),
                FieldDef::optional("FNAMES"),
                FieldDef::optional("GENDERID"),
                FieldDef::optional("NATION"),
                FieldDef::optional("RELBLF"),
                FieldDef::required("SCN"),
                FieldDef::optional("SEXID"),
                FieldDef::optional("SEXORT"),
                FieldDef::optional("SSN"),
                FieldDef::optional("SURNAME"),
                FieldDef::optional("TTACCOM"),
                FieldDef::required("TTPCODE"),
            ],
            children: &[INSTANCE],
        },
        EntityDef {
            name: INSTANCE,
            fields: &[
                FieldDef::optional("NUMHUS"),
                FieldDef::optional("COURSEID"),
                FieldDef::fixed("BRIDGE", "0"),
                FieldDef::fixed("CAMPID", "A"),
                FieldDef::optional("COMDATE"),
                FieldDef::optional("DISALL"),
                FieldDef::optional("ELQ"),
                FieldDef::required("ENDDATE"),
                FieldDef::fixed("EXCHANGE", "N"),
                FieldDef::optional("FEEELIG"),
                FieldDef::fixed("FESTUMK", "2"),
                FieldDef::optional("FUNDCODE"),
                FieldDef::optional("FUNDCOMP"),
                FieldDef::optional("FUNDLEV"),
                FieldDef::optional("GROSSFEE"),
                FieldDef::optional("LOCSDY"),
                FieldDef::required("MCDATE"),
                FieldDef::optional("MODE"),
                FieldDef::optional("MSTUFEE"),
                FieldDef::optional("NETFEE"),
                FieldDef::optional("RCSTDNT"),
                FieldDef::fixed("REDUCEDI", "00"),
                FieldDef::optional("RSNEND"),
                FieldDef::fixed("SPECFEE", "9"),
                FieldDef::required("SPLENGTH"),
                FieldDef::optional("STULOAD"),
                FieldDef::optional("TYPEYR"),
                FieldDef::fixed("UNITLGTH", "9"),
                FieldDef::fixed("YEARPRG", "99"),
                FieldDef::fixed("YEARSTU", "1"),
            ],
            children: &[ENTRY_PROFILE, QUALIFICATIONS_AWARDED, STUDENT_ON_MODULE],
        },
        EntityDef {
            name: ENTRY_PROFILE,
            fields: &[
                FieldDef::fixed("CARELEAVER", "99"),
                FieldDef::optional("DOMICILE"),
                FieldDef::fixed("PARED", "7"),
                FieldDef::optional("POSTCODE"),
                FieldDef::optional("QUALENT3"),
            ],
            children: &[],
        },
        EntityDef {
            name: QUALIFICATIONS_AWARDED,
            fields: &[FieldDef::optional("QUAL")],
            children: &[],
        },
        EntityDef {
            name: STUDENT_ON_MODULE,
            fields: &[
                FieldDef::optional("MODID"),
                FieldDef::optional("MODOUT"),
                FieldDef::fixed("MODSTAT", "2"),
            ],
            children: &[],
        },
    ],
};
