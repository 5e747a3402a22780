//! # statret-xml — Tree Serializer
//!
//! Turns a batch's [`StagingTree`](statret_staging::StagingTree) into a
//! generic [`Element`] tree and encodes it as a pretty-printed,
//! namespace-free document.
//!
//! There is exactly one traversal for every entity kind. Its behaviour
//! is driven entirely by the schema tables in `statret-staging`:
//!
//! 1. one element per record, named after its kind;
//! 2. one leaf per declared field, in declared order: the rendered value
//!    when set, an empty leaf when unset but required, nothing otherwise;
//! 3. then each declared child kind, in declared order, one subtree per
//!    child record in insertion order.

pub mod element;
pub mod encode;
pub mod error;
pub mod serialize;

pub use element::Element;
pub use encode::{encode, encode_to_string};
pub use error::XmlError;
pub use serialize::{build_document, build_element};
