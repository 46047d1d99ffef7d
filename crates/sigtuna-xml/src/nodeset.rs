#![forbid(unsafe_code)]

//! Node-set type for document-subset canonicalization.
//!
//! A node set is either the whole document or an explicit, identity-based
//! collection of selectable nodes.  Selectable nodes follow the XPath data
//! model: tree nodes, attribute nodes (owning element plus attribute index)
//! and namespace nodes (owning element plus prefix).  The set is produced by
//! an external selection facility; this crate only represents membership.

use crate::document::{Document, NodeId, NodeKind};
use sigtuna_core::{Error, Result};
use std::collections::HashSet;

/// Identity of one selectable node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubsetNode {
    /// An element, text, comment, processing-instruction, doctype or
    /// document node.
    Node(NodeId),
    /// An attribute, addressed by its owning element and position in the
    /// element's attribute list.
    Attribute(NodeId, usize),
    /// A namespace node on an element's namespace axis, addressed by prefix
    /// (empty string for the default namespace).
    Namespace(NodeId, String),
}

impl SubsetNode {
    /// The tree node this identity hangs off: the node itself, or the
    /// owning element for attribute and namespace nodes.
    pub fn anchor(&self) -> NodeId {
        match self {
            SubsetNode::Node(id) => *id,
            SubsetNode::Attribute(id, _) => *id,
            SubsetNode::Namespace(id, _) => *id,
        }
    }
}

/// A set of nodes selected for canonicalization.
#[derive(Debug, Clone)]
pub enum NodeSet {
    /// Every node of the document.
    All,
    /// Exactly the listed nodes, deduplicated by identity.
    Explicit(HashSet<SubsetNode>),
}

impl NodeSet {
    /// The whole-document sentinel.
    pub fn all() -> Self {
        NodeSet::All
    }

    /// Build an explicit set from a collection of members.  Appending the
    /// same node twice counts once.
    pub fn from_members<I: IntoIterator<Item = SubsetNode>>(members: I) -> Self {
        NodeSet::Explicit(members.into_iter().collect())
    }

    /// The subtree rooted at `id`: the node, its descendants, and for every
    /// element among them its attribute nodes and full namespace axis.
    pub fn subtree(doc: &Document, id: NodeId) -> Self {
        let mut members = HashSet::new();
        for n in doc.descendants(id) {
            members.insert(SubsetNode::Node(n));
            if let Some(elem) = doc.element(n) {
                for i in 0..elem.attributes.len() {
                    members.insert(SubsetNode::Attribute(n, i));
                }
                for prefix in doc.in_scope_namespaces(n).keys() {
                    members.insert(SubsetNode::Namespace(n, prefix.clone()));
                }
            }
        }
        NodeSet::Explicit(members)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, NodeSet::All)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            NodeSet::All => false,
            NodeSet::Explicit(m) => m.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            NodeSet::All => usize::MAX,
            NodeSet::Explicit(m) => m.len(),
        }
    }

    /// Whether a tree node is selected.
    pub fn contains_node(&self, id: NodeId) -> bool {
        match self {
            NodeSet::All => true,
            NodeSet::Explicit(m) => m.contains(&SubsetNode::Node(id)),
        }
    }

    /// Whether an element's attribute at `index` is selected.
    pub fn contains_attribute(&self, elem: NodeId, index: usize) -> bool {
        match self {
            NodeSet::All => true,
            NodeSet::Explicit(m) => m.contains(&SubsetNode::Attribute(elem, index)),
        }
    }

    /// Whether an element's namespace node for `prefix` is selected.
    pub fn contains_namespace(&self, elem: NodeId, prefix: &str) -> bool {
        match self {
            NodeSet::All => true,
            NodeSet::Explicit(m) => m.contains(&SubsetNode::Namespace(elem, prefix.to_owned())),
        }
    }

    /// Validate that every member belongs to `doc` and is attached to its
    /// tree.  Called once at the start of a write, before any output.
    pub fn validate_owner(&self, doc: &Document) -> Result<()> {
        let NodeSet::Explicit(members) = self else {
            return Ok(());
        };
        for member in members {
            validate_member(doc, member)?;
        }
        Ok(())
    }
}

/// Check one subset member against the target document: stamp match, then
/// attachment.
pub fn validate_member(doc: &Document, member: &SubsetNode) -> Result<()> {
    let anchor = member.anchor();
    if anchor.doc_stamp() != doc.stamp() {
        return Err(Error::CrossDocumentSelection);
    }
    if !doc.is_attached(anchor) {
        return Err(Error::DetachedNode(describe(doc, anchor)));
    }
    Ok(())
}

fn describe(doc: &Document, id: NodeId) -> String {
    match doc.node_kind(id) {
        Some(NodeKind::Element(e)) => format!("element <{}>", e.name.qualified()),
        Some(NodeKind::Text(_)) => "text node".to_owned(),
        Some(NodeKind::Comment(_)) => "comment node".to_owned(),
        Some(NodeKind::ProcessingInstruction(pi)) => {
            format!("processing instruction <?{}?>", pi.target)
        }
        Some(NodeKind::DocType(d)) => format!("doctype {}", d.root_name),
        Some(NodeKind::Document) => "document node".to_owned(),
        None => "unknown node".to_owned(),
    }
}
