//! # Schema Declarations
//!
//! Static descriptions of the document's node types. A field is either
//! *required* (a null still produces an empty element) or *optional* (a
//! null is omitted). Defaults are applied when a record is created and may
//! be overwritten by population or cleared by post-processing.

use statret_core::Generation;

use crate::error::StagingError;

/// Initial value of a field on a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// A fixed code.
    Fixed(&'static str),
    /// The institution's UKPRN.
    Ukprn,
}

/// One exportable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Element tag, exactly as the regulator spells it.
    pub tag: &'static str,
    /// Emit an empty element when null.
    pub required: bool,
    pub default: Option<FieldDefault>,
}

impl FieldDef {
    /// An optional field without a default.
    pub const fn optional(tag: &'static str) -> Self {
        Self {
            tag,
            required: false,
            default: None,
        }
    }

    /// A required field without a default.
    pub const fn required(tag: &'static str) -> Self {
        Self {
            tag,
            required: true,
            default: None,
        }
    }

    /// An optional field starting at a fixed code.
    pub const fn fixed(tag: &'static str, value: &'static str) -> Self {
        Self {
            tag,
            required: false,
            default: Some(FieldDefault::Fixed(value)),
        }
    }

    /// An optional field starting at the institution's UKPRN.
    pub const fn ukprn(tag: &'static str) -> Self {
        Self {
            tag,
            required: false,
            default: Some(FieldDefault::Ukprn),
        }
    }
}

/// One node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDef {
    /// Kind name, also the element name.
    pub name: &'static str,
    /// Fields in emission order.
    pub fields: &'static [FieldDef],
    /// Child kinds in emission order.
    pub children: &'static [&'static str],
}

impl EntityDef {
    /// Look up a declared field.
    pub fn field(&self, tag: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    /// Whether `kind` may appear under this entity.
    pub fn has_child(&self, kind: &str) -> bool {
        self.children.contains(&kind)
    }
}

/// A complete document shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaDef {
    pub generation: Generation,
    /// Document root element.
    pub root_element: &'static str,
    /// Kinds placed directly under the root, in emission order.
    pub root_children: &'static [&'static str],
    pub entities: &'static [EntityDef],
}

impl SchemaDef {
    /// The schema of a generation.
    pub fn for_generation(generation: Generation) -> &'static SchemaDef {
        match generation {
            Generation::Legacy => &crate::legacy::SCHEMA,
            Generation::DataFutures => &crate::data_futures::SCHEMA,
        }
    }

    /// Look up an entity kind.
    pub fn entity(&self, kind: &str) -> Result<&'static EntityDef, StagingError> {
        let entities: &'static [EntityDef] = self.entities;
        entities
            .iter()
            .find(|e| e.name == kind)
            .ok_or_else(|| StagingError::UnknownEntity {
                kind: kind.to_string(),
            })
    }
}
