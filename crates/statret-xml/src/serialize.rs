//! The single generic traversal from staging records to elements.

use statret_staging::{Children, RecordId, StagingTree};

use crate::element::Element;
use crate::error::XmlError;

/// The whole document: the schema's root element wrapping every record
/// placed at the top of the tree.
pub fn build_document(tree: &StagingTree) -> Element {
    let mut root = Element::new(tree.schema().root_element);
    append_groups(tree, tree.roots(), &mut root);
    tracing::debug!(
        root = tree.schema().root_element,
        records = tree.len(),
        "built document tree"
    );
    root
}

/// The subtree rooted at one record.
pub fn build_element(tree: &StagingTree, id: RecordId) -> Result<Element, XmlError> {
    let record = tree.get(id).ok_or(XmlError::UnknownRecord(id.index()))?;

    let mut element = Element::new(record.kind());
    for (field, value) in record.fields() {
        match value {
            Some(v) if !v.is_empty() => element.push(Element::leaf(field.tag, v.render())),
            Some(_) => element.push(Element::new(field.tag)),
            None if field.required => element.push(Element::new(field.tag)),
            None => {}
        }
    }
    append_groups(tree, tree.children(id), &mut element);
    Ok(element)
}

fn append_groups(tree: &StagingTree, groups: Children<'_>, parent: &mut Element) {
    for (_, ids) in groups {
        for id in ids {
            // Handles yielded by the tree always resolve.
            if let Ok(child) = build_element(tree, *id) {
                parent.push(child);
            }
        }
    }
}
