//! # Staging Tree
//!
//! The populated records of one batch, held in an arena.
//!
//! ## Invariants
//!
//! - Every record's kind is declared by the tree's schema.
//! - A record is placed either at the root (if its kind is a root child)
//!   or under an existing record whose kind declares it as a child. Orphans
//!   cannot be constructed.
//! - `(kind, key)` is unique.
//! - Fields only ever hold tags declared for the record's kind.
//!
//! Children of a record are grouped by kind in *schema* order, and within
//! a kind in insertion order.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use statret_core::FieldValue;

use crate::error::StagingError;
use crate::schema::{EntityDef, FieldDef, FieldDefault, SchemaDef};

/// Handle to a record in a [`StagingTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(usize);

impl RecordId {
    /// Position in the arena, which is also the insertion sequence.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One staging entity.
#[derive(Debug, Clone, PartialEq)]
pub struct StagingRecord {
    def: &'static EntityDef,
    key: String,
    parent: Option<RecordId>,
    fields: BTreeMap<&'static str, FieldValue>,
}

impl StagingRecord {
    /// Entity kind (and element name).
    pub fn kind(&self) -> &'static str {
        self.def.name
    }

    /// The kind's declaration.
    pub fn def(&self) -> &'static EntityDef {
        self.def
    }

    /// Natural key, unique within the kind.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn parent(&self) -> Option<RecordId> {
        self.parent
    }

    /// Current value of a field, `None` if null.
    pub fn get(&self, tag: &str) -> Option<&FieldValue> {
        self.fields.get(tag)
    }

    /// Whether the field currently renders as `code`.
    pub fn is(&self, tag: &str, code: &str) -> bool {
        self.get(tag).is_some_and(|v| v.is(code))
    }

    /// Declared fields in emission order, with their values.
    pub fn fields(&self) -> impl Iterator<Item = (&'static FieldDef, Option<&FieldValue>)> + '_ {
        self.def.fields.iter().map(|f| (f, self.fields.get(f.tag)))
    }
}

/// A record in storage form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingRow {
    pub id: usize,
    pub kind: String,
    pub key: String,
    pub parent: Option<usize>,
    pub fields: BTreeMap<String, FieldValue>,
}

/// A batch's staging records.
#[derive(Debug, Clone)]
pub struct StagingTree {
    schema: &'static SchemaDef,
    ukprn: String,
    records: Vec<StagingRecord>,
    by_key: HashMap<(&'static str, String), RecordId>,
    by_parent: HashMap<(Option<RecordId>, &'static str), Vec<RecordId>>,
}

impl StagingTree {
    /// An empty tree. `ukprn` fills fields that default to the institution code.
    pub fn new(schema: &'static SchemaDef, ukprn: impl Into<String>) -> Self {
        Self {
            schema,
            ukprn: ukprn.into(),
            records: Vec::new(),
            by_key: HashMap::new(),
            by_parent: HashMap::new(),
        }
    }

    pub fn schema(&self) -> &'static SchemaDef {
        self.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Create a record with its declared defaults.
    pub fn insert(
        &mut self,
        kind: &str,
        key: impl Into<String>,
        parent: Option<RecordId>,
    ) -> Result<RecordId, StagingError> {
        let id = self.insert_bare(kind, key.into(), parent)?;
        let def = self.records[id.0].def;
        for field in def.fields {
            let value = match field.default {
                Some(FieldDefault::Fixed(code)) => FieldValue::text(code),
                Some(FieldDefault::Ukprn) => FieldValue::text(self.ukprn.clone()),
                None => continue,
            };
            self.records[id.0].fields.insert(field.tag, value);
        }
        Ok(id)
    }

    fn insert_bare(
        &mut self,
        kind: &str,
        key: String,
        parent: Option<RecordId>,
    ) -> Result<RecordId, StagingError> {
        let def = self.schema.entity(kind)?;
        match parent {
            None if !self.schema.root_children.contains(&def.name) => {
                return Err(StagingError::NotAChild {
                    kind: def.name.to_string(),
                    parent: "root".to_string(),
                });
            }
            None => {}
            Some(p) => {
                let parent_def = self
                    .records
                    .get(p.0)
                    .map(|r| r.def)
                    .ok_or_else(|| StagingError::MissingParent {
                        kind: def.name.to_string(),
                        key: key.clone(),
                        parent: p.0,
                    })?;
                if !parent_def.has_child(def.name) {
                    return Err(StagingError::NotAChild {
                        kind: def.name.to_string(),
                        parent: parent_def.name.to_string(),
                    });
                }
            }
        }
        let index_key = (def.name, key);
        if self.by_key.contains_key(&index_key) {
            return Err(StagingError::DuplicateKey {
                kind: def.name.to_string(),
                key: index_key.1,
            });
        }

        let id = RecordId(self.records.len());
        self.records.push(StagingRecord {
            def,
            key: index_key.1.clone(),
            parent,
            fields: BTreeMap::new(),
        });
        self.by_key.insert(index_key, id);
        self.by_parent.entry((parent, def.name)).or_default().push(id);
        Ok(id)
    }

    /// Set a field.
    pub fn set(
        &mut self,
        id: RecordId,
        tag: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), StagingError> {
        let record = self
            .records
            .get_mut(id.0)
            .ok_or(StagingError::UnknownRecord(id.0))?;
        let field = record.def.field(tag).ok_or_else(|| StagingError::UnknownField {
            kind: record.def.name.to_string(),
            tag: tag.to_string(),
        })?;
        record.fields.insert(field.tag, value.into());
        Ok(())
    }

    /// Set a field, or clear it when `value` is `None`.
    pub fn set_opt<V: Into<FieldValue>>(
        &mut self,
        id: RecordId,
        tag: &str,
        value: Option<V>,
    ) -> Result<(), StagingError> {
        match value {
            Some(v) => self.set(id, tag, v),
            None => self.clear(id, tag),
        }
    }

    /// Null a field, overriding any default.
    pub fn clear(&mut self, id: RecordId, tag: &str) -> Result<(), StagingError> {
        let record = self
            .records
            .get_mut(id.0)
            .ok_or(StagingError::UnknownRecord(id.0))?;
        if record.def.field(tag).is_none() {
            return Err(StagingError::UnknownField {
                kind: record.def.name.to_string(),
                tag: tag.to_string(),
            });
        }
        record.fields.remove(tag);
        Ok(())
    }

    /// The record behind a handle.
    pub fn get(&self, id: RecordId) -> Option<&StagingRecord> {
        self.records.get(id.0)
    }

    /// Find a record by natural key.
    pub fn find(&self, kind: &str, key: &str) -> Option<RecordId> {
        let def = self.schema.entity(kind).ok()?;
        self.by_key.get(&(def.name, key.to_string())).copied()
    }

    /// All records of a kind, in insertion order.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = RecordId> + 'a {
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.def.name == kind)
            .map(|(i, _)| RecordId(i))
    }

    /// Children of `parent`, grouped by kind in schema order.
    pub fn children(&self, parent: RecordId) -> Children<'_> {
        let kinds = self
            .records
            .get(parent.0)
            .map(|r| r.def.children)
            .unwrap_or(&[]);
        Children {
            tree: self,
            parent: Some(parent),
            kinds: kinds.iter(),
        }
    }

    /// Records directly under the document root, grouped by kind.
    pub fn roots(&self) -> Children<'_> {
        Children {
            tree: self,
            parent: None,
            kinds: self.schema.root_children.iter(),
        }
    }

    /// First child of a kind.
    pub fn child_of_kind(&self, parent: RecordId, kind: &str) -> Option<RecordId> {
        let def = self.schema.entity(kind).ok()?;
        self.by_parent
            .get(&(Some(parent), def.name))
            .and_then(|ids| ids.first().copied())
    }

    /// Nearest ancestor of a kind.
    pub fn ancestor_of_kind(&self, id: RecordId, kind: &str) -> Option<RecordId> {
        let mut current = self.get(id)?.parent;
        while let Some(p) = current {
            let record = self.get(p)?;
            if record.def.name == kind {
                return Some(p);
            }
            current = record.parent;
        }
        None
    }

    /// Number of records per kind.
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.def.name).or_insert(0) += 1;
        }
        counts
    }

    /// Storage form of every record, in insertion order.
    pub fn to_rows(&self) -> Vec<StagingRow> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| StagingRow {
                id: i,
                kind: r.def.name.to_string(),
                key: r.key.clone(),
                parent: r.parent.map(|p| p.0),
                fields: r
                    .fields
                    .iter()
                    .map(|(tag, value)| (tag.to_string(), value.clone()))
                    .collect(),
            })
            .collect()
    }

    /// Rebuild a tree from storage rows. Defaults are not re-applied; the
    /// rows carry every value the record held.
    pub fn from_rows(
        schema: &'static SchemaDef,
        ukprn: impl Into<String>,
        rows: impl IntoIterator<Item = StagingRow>,
    ) -> Result<Self, StagingError> {
        let mut tree = Self::new(schema, ukprn);
        for row in rows {
            if row.id != tree.records.len() {
                return Err(StagingError::RowOrder {
                    expected: tree.records.len(),
                    found: row.id,
                });
            }
            let id = tree.insert_bare(&row.kind, row.key, row.parent.map(RecordId))?;
            for (tag, value) in row.fields {
                tree.set(id, &tag, value)?;
            }
        }
        tracing::debug!(records = tree.len(), "restored staging tree");
        Ok(tree)
    }
}

/// Child groups of one record, in schema order. Kinds with no records
/// yield an empty slice.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    tree: &'a StagingTree,
    parent: Option<RecordId>,
    kinds: std::slice::Iter<'static, &'static str>,
}

impl<'a> Iterator for Children<'a> {
    type Item = (&'static str, &'a [RecordId]);

    fn next(&mut self) -> Option<Self::Item> {
        let kind = *self.kinds.next()?;
        let ids = self
            .tree
            .by_parent
            .get(&(self.parent, kind))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Some((kind, ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy;
    use statret_core::Generation;

    fn tree() -> StagingTree {
        StagingTree::new(SchemaDef::for_generation(Generation::Legacy), "10007774")
    }

    // ── Insertion ────────────────────────────────────────────────────

    #[test]
    fn test_defaults_applied() {
        let mut t = tree();
        let inst = t.insert(legacy::INSTITUTION, "22051", None).unwrap();
        let record = t.get(inst).unwrap();
        assert!(record.is("INSTAPP", "0"));
        assert!(record.is("UKPRN", "10007774"));
        assert_eq!(record.get("RECID"), None);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut t = tree();
        let inst = t.insert(legacy::INSTITUTION, "22051", None).unwrap();
        t.insert(legacy::COURSE, "10", Some(inst)).unwrap();
        let err = t.insert(legacy::COURSE, "10", Some(inst)).unwrap_err();
        assert!(matches!(err, StagingError::DuplicateKey { .. }));
        // Same key, different kind, is fine.
        t.insert(legacy::MODULE, "10", Some(inst)).unwrap();
    }

    #[test]
    fn test_placement_checked() {
        let mut t = tree();
        let err = t.insert(legacy::COURSE, "10", None).unwrap_err();
        assert!(matches!(err, StagingError::NotAChild { .. }));

        let inst = t.insert(legacy::INSTITUTION, "22051", None).unwrap();
        let err = t.insert(legacy::INSTANCE, "1-2022", Some(inst)).unwrap_err();
        assert_eq!(err.to_string(), "Instance cannot be a child of Institution");

        let err = t.insert(legacy::COURSE, "10", Some(RecordId(42))).unwrap_err();
        assert!(matches!(err, StagingError::MissingParent { parent: 42, .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut t = tree();
        let inst = t.insert(legacy::INSTITUTION, "22051", None).unwrap();
        assert!(t.set(inst, "NOPE", "x").is_err());
        assert!(t.set(inst, "RECID", "22051").is_ok());
        assert!(t.clear(inst, "NOPE").is_err());
    }

    #[test]
    fn test_set_opt_none_clears_default() {
        let mut t = tree();
        let inst = t.insert(legacy::INSTITUTION, "22051", None).unwrap();
        t.set_opt(inst, "INSTAPP", None::<&str>).unwrap();
        assert_eq!(t.get(inst).unwrap().get("INSTAPP"), None);
    }

    // ── Children ─────────────────────────────────────────────────────

    #[test]
    fn test_children_in_schema_order() {
        let mut t = tree();
        let inst = t.insert(legacy::INSTITUTION, "22051", None).unwrap();
        let s = t.insert(legacy::STUDENT, "1", Some(inst)).unwrap();
        let m = t.insert(legacy::MODULE, "M1", Some(inst)).unwrap();
        let c2 = t.insert(legacy::COURSE, "20", Some(inst)).unwrap();
        let c1 = t.insert(legacy::COURSE, "10", Some(inst)).unwrap();

        let groups: Vec<(&str, Vec<RecordId>)> =
            t.children(inst).map(|(k, ids)| (k, ids.to_vec())).collect();
        assert_eq!(
            groups,
            vec![
                (legacy::COURSE, vec![c2, c1]),
                (legacy::MODULE, vec![m]),
                (legacy::STUDENT, vec![s]),
            ]
        );
    }

    #[test]
    fn test_children_restartable_and_total() {
        let mut t = tree();
        let inst = t.insert(legacy::INSTITUTION, "22051", None).unwrap();
        let course = t.insert(legacy::COURSE, "10", Some(inst)).unwrap();
        let subject = t.insert(legacy::COURSE_SUBJECT, "10/100384", Some(course)).unwrap();

        let children = t.children(inst);
        assert_eq!(children.clone().count(), children.count());
        assert_eq!(t.children(subject).count(), 0);
        assert_eq!(t.roots().next(), Some((legacy::INSTITUTION, &[inst][..])));
    }

    #[test]
    fn test_lookup_helpers() {
        let mut t = tree();
        let inst = t.insert(legacy::INSTITUTION, "22051", None).unwrap();
        let student = t.insert(legacy::STUDENT, "1", Some(inst)).unwrap();
        let instance = t.insert(legacy::INSTANCE, "1000-2022", Some(student)).unwrap();
        let profile = t.insert(legacy::ENTRY_PROFILE, "1000-2022", Some(instance)).unwrap();

        assert_eq!(t.find(legacy::INSTANCE, "1000-2022"), Some(instance));
        assert_eq!(t.find(legacy::INSTANCE, "missing"), None);
        assert_eq!(t.child_of_kind(instance, legacy::ENTRY_PROFILE), Some(profile));
        assert_eq!(t.ancestor_of_kind(profile, legacy::STUDENT), Some(student));
        assert_eq!(t.of_kind(legacy::INSTANCE).collect::<Vec<_>>(), vec![instance]);
        assert_eq!(t.counts().get(legacy::INSTANCE), Some(&1));
    }

    // ── Storage form ─────────────────────────────────────────────────

    #[test]
    fn test_rows_restore_identical_tree() {
        let mut t = tree();
        let inst = t.insert(legacy::INSTITUTION, "22051", None).unwrap();
        t.set(inst, "RECID", "22051").unwrap();
        let student = t.insert(legacy::STUDENT, "1", Some(inst)).unwrap();
        t.set(student, "TTPCODE", FieldValue::Empty).unwrap();
        t.clear(inst, "INSTAPP").unwrap();

        let json = serde_json::to_string(&t.to_rows()).unwrap();
        let rows: Vec<StagingRow> = serde_json::from_str(&json).unwrap();
        let restored = StagingTree::from_rows(t.schema(), "10007774", rows).unwrap();

        assert_eq!(restored.to_rows(), t.to_rows());
        // A cleared default stays cleared.
        assert_eq!(restored.get(inst).unwrap().get("INSTAPP"), None);
    }

    #[test]
    fn test_rows_out_of_order_rejected() {
        let rows = vec![StagingRow {
            id: 3,
            kind: legacy::INSTITUTION.to_string(),
            key: "22051".to_string(),
            parent: None,
            fields: BTreeMap::new(),
        }];
        let schema = SchemaDef::for_generation(Generation::Legacy);
        let err = StagingTree::from_rows(schema, "1", rows).unwrap_err();
        assert_eq!(err, StagingError::RowOrder { expected: 0, found: 3 });
    }
}
