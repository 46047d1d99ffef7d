#![forbid(unsafe_code)]

//! XML Canonicalization (C14N) for the Sigtuna library.
//!
//! Implements the four W3C canonicalization variants:
//! - Canonical XML 1.0 (with and without comments)
//! - Exclusive Canonical XML 1.0 (with and without comments)
//!
//! Output is a deterministic byte stream: UTF-8, line-feed line endings,
//! sorted namespace declarations and attributes, no self-closing tags, and
//! escaping chosen so the bytes are stable under re-canonicalization. The
//! primary entry point is [`Canonicalizer`], which streams into any
//! [`std::io::Write`] sink; [`canonicalize`] and [`canonicalize_str`] cover
//! the common whole-document cases.

pub mod escape;
pub mod exclusive;
pub mod inclusive;
pub mod render;
mod writer;

use std::io::Write;

use sigtuna_core::{algorithm, Error, Result};
use sigtuna_xml::{build, Document, NodeKind, NodeSet, SubsetNode};

/// The canonicalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nMode {
    /// Canonical XML 1.0
    Inclusive,
    /// Canonical XML 1.0 with comments
    InclusiveWithComments,
    /// Exclusive Canonical XML 1.0
    Exclusive,
    /// Exclusive Canonical XML 1.0 with comments
    ExclusiveWithComments,
}

impl C14nMode {
    /// Get the algorithm URI for this mode.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Inclusive => algorithm::C14N,
            Self::InclusiveWithComments => algorithm::C14N_WITH_COMMENTS,
            Self::Exclusive => algorithm::EXC_C14N,
            Self::ExclusiveWithComments => algorithm::EXC_C14N_WITH_COMMENTS,
        }
    }

    /// Parse a C14N mode from an algorithm URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            algorithm::C14N => Some(Self::Inclusive),
            algorithm::C14N_WITH_COMMENTS => Some(Self::InclusiveWithComments),
            algorithm::EXC_C14N => Some(Self::Exclusive),
            algorithm::EXC_C14N_WITH_COMMENTS => Some(Self::ExclusiveWithComments),
            _ => None,
        }
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::InclusiveWithComments | Self::ExclusiveWithComments)
    }

    pub fn is_exclusive(&self) -> bool {
        matches!(self, Self::Exclusive | Self::ExclusiveWithComments)
    }
}

/// A canonical XML serializer bound to an output sink.
///
/// Bytes are streamed into the sink as the tree is walked; when
/// canonicalization fails partway the sink may already hold a partial
/// prefix of the output. Callers that need all-or-nothing behavior should
/// canonicalize into a buffer first.
pub struct Canonicalizer<W: Write> {
    sink: W,
    mode: C14nMode,
    inclusive_prefixes: Vec<String>,
}

impl<W: Write> Canonicalizer<W> {
    pub fn new(sink: W, mode: C14nMode) -> Self {
        Self {
            sink,
            mode,
            inclusive_prefixes: Vec::new(),
        }
    }

    /// Inclusive canonicalization with or without comments, matching the
    /// two 2001 REC variants.
    pub fn with_comments(sink: W, comments: bool) -> Self {
        let mode = if comments {
            C14nMode::InclusiveWithComments
        } else {
            C14nMode::Inclusive
        };
        Self::new(sink, mode)
    }

    /// Selects the mode from its W3C algorithm identifier.
    pub fn from_uri(sink: W, uri: &str) -> Result<Self> {
        let mode = C14nMode::from_uri(uri)
            .ok_or_else(|| Error::UnsupportedAlgorithm(uri.to_owned()))?;
        Ok(Self::new(sink, mode))
    }

    pub fn mode(&self) -> C14nMode {
        self.mode
    }

    /// Sets the InclusiveNamespaces prefix list used by the exclusive
    /// modes. `None` (or an empty list) clears it. The token `#default`
    /// names the default namespace. Ignored by the inclusive modes.
    pub fn set_inclusive_prefixes(&mut self, prefixes: Option<&[&str]>) {
        self.inclusive_prefixes = prefixes
            .unwrap_or(&[])
            .iter()
            .map(|p| (*p).to_owned())
            .collect();
    }

    /// Canonicalizes the entire document.
    pub fn write_document(&mut self, doc: &Document) -> Result<()> {
        self.write_subset(doc, &NodeSet::all())
    }

    /// Canonicalizes the document subset described by `subset`.
    pub fn write_subset(&mut self, doc: &Document, subset: &NodeSet) -> Result<()> {
        subset.validate_owner(doc)?;
        let mut writer = writer::Writer {
            doc,
            subset,
            mode: self.mode,
            inclusive_prefixes: &self.inclusive_prefixes,
            out: &mut self.sink,
        };
        writer.write_tree()
    }

    /// Canonicalizes a single node.
    ///
    /// A document canonicalizes in full and an element as the subset
    /// holding its subtree with all attribute and namespace nodes. The
    /// other kinds render standalone: text escaped, comments and
    /// processing instructions without positional line feeds, attribute
    /// and namespace nodes as their space-prefixed fragments, and a
    /// document type declaration as nothing at all.
    pub fn write_node(&mut self, doc: &Document, node: &SubsetNode) -> Result<()> {
        sigtuna_xml::nodeset::validate_member(doc, node)?;
        match node {
            SubsetNode::Node(id) => match doc.node_kind(*id) {
                Some(NodeKind::Document) => self.write_document(doc),
                Some(NodeKind::Element(_)) => {
                    let subset = NodeSet::subtree(doc, *id);
                    self.write_subset(doc, &subset)
                }
                Some(NodeKind::Text(text)) => {
                    self.sink
                        .write_all(escape::escape_text(text).as_bytes())?;
                    Ok(())
                }
                Some(NodeKind::Comment(text)) => {
                    if self.mode.with_comments() {
                        self.standalone(|w| w.comment(text))?;
                    }
                    Ok(())
                }
                Some(NodeKind::ProcessingInstruction(pi)) => {
                    self.standalone(|w| w.pi(pi))
                }
                Some(NodeKind::DocType(_)) => Ok(()),
                None => Err(Error::Internal("node lookup failed".to_owned())),
            },
            SubsetNode::Attribute(elem, index) => {
                let attribute = doc
                    .element(*elem)
                    .and_then(|e| e.attributes.get(*index))
                    .ok_or_else(|| {
                        Error::Internal("attribute lookup failed".to_owned())
                    })?;
                self.sink
                    .write_all(render::attr_from(attribute).render().as_bytes())?;
                Ok(())
            }
            SubsetNode::Namespace(elem, prefix) => {
                let in_scope = doc.in_scope_namespaces(*elem);
                let uri = in_scope.get(prefix).ok_or_else(|| {
                    Error::Internal(format!("prefix {prefix:?} not in scope"))
                })?;
                let decl = render::NsDecl::new(prefix.clone(), uri.clone())?;
                self.sink.write_all(decl.render().as_bytes())?;
                Ok(())
            }
        }
    }

    fn standalone(
        &mut self,
        body: impl FnOnce(&mut writer::Writer<'_, W>) -> Result<()>,
    ) -> Result<()> {
        // A throwaway document satisfies the writer's borrows; standalone
        // comment and PI rendering never consults the tree.
        let doc = Document::new();
        let subset = NodeSet::all();
        let mut writer = writer::Writer {
            doc: &doc,
            subset: &subset,
            mode: self.mode,
            inclusive_prefixes: &self.inclusive_prefixes,
            out: &mut self.sink,
        };
        body(&mut writer)
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Canonicalize a parsed document into a byte vector.
pub fn canonicalize(
    doc: &Document,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>> {
    let mut canonicalizer = Canonicalizer::new(Vec::new(), mode);
    canonicalizer.inclusive_prefixes = inclusive_prefixes.to_vec();
    match node_set {
        Some(subset) => canonicalizer.write_subset(doc, subset)?,
        None => canonicalizer.write_document(doc)?,
    }
    Ok(canonicalizer.into_inner())
}

/// Canonicalize raw XML text into a byte vector.
pub fn canonicalize_str(
    xml: &str,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>> {
    let doc = build::from_str(xml)?;
    canonicalize(&doc, mode, node_set, inclusive_prefixes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_round_trip() {
        for mode in [
            C14nMode::Inclusive,
            C14nMode::InclusiveWithComments,
            C14nMode::Exclusive,
            C14nMode::ExclusiveWithComments,
        ] {
            assert_eq!(C14nMode::from_uri(mode.uri()), Some(mode));
        }
    }

    #[test]
    fn unknown_uri_is_rejected() {
        let err = Canonicalizer::from_uri(
            Vec::new(),
            "http://www.w3.org/2006/12/xml-c14n11",
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn prefix_list_can_be_cleared() {
        let mut canonicalizer =
            Canonicalizer::new(Vec::new(), C14nMode::Exclusive);
        canonicalizer.set_inclusive_prefixes(Some(&["n0", "n1"]));
        assert_eq!(canonicalizer.inclusive_prefixes, ["n0", "n1"]);
        canonicalizer.set_inclusive_prefixes(None);
        assert!(canonicalizer.inclusive_prefixes.is_empty());
    }
}
