#![forbid(unsafe_code)]

//! XML document abstraction for the Sigtuna canonicalization library.
//!
//! The canonicalization engine consumes documents only through the read-only
//! capability surface of [`Document`]: node kind, qualified name, namespace
//! URI, parent/child links, attribute lists and in-scope namespaces.  Trees
//! are built either programmatically through the builder methods or parsed
//! from text via the `roxmltree` bridge in [`build`].
//!
//! All character data is expected to be in Unicode Normalization Form C
//! before it enters the tree; no renormalization is performed here.

pub mod build;
pub mod document;
pub mod nodeset;

pub use document::{AttrType, Attribute, DocType, Document, Element, NodeId, NodeKind, Pi, QName};
pub use nodeset::{NodeSet, SubsetNode};

/// roxmltree parsing options used by the bridge.
///
/// DTD is allowed because roxmltree does not expand external entities or
/// perform entity substitution beyond internally declared ones, and test
/// vectors for document-subset canonicalization routinely carry an internal
/// subset.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    }
}
