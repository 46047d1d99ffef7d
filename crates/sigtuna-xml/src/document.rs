#![forbid(unsafe_code)]

//! Arena-backed XML document tree.
//!
//! Nodes live in a flat arena and are addressed by [`NodeId`] handles.  Each
//! document carries a process-unique identity stamp and every handle it hands
//! out is stamped with it, so a handle from one document can never silently
//! address a node of another: lookups with a foreign handle return `None`.
//!
//! The tree is a tagged union over node kinds rather than a trait hierarchy;
//! the canonicalization engine dispatches on [`NodeKind`] and never depends
//! on anything beyond the read accessors defined here.

use sigtuna_core::ns;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DOC_STAMP: AtomicU64 = AtomicU64::new(1);

/// Handle to a node within one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    doc: u64,
    index: u32,
}

impl NodeId {
    /// The identity stamp of the owning document.
    pub fn doc_stamp(&self) -> u64 {
        self.doc
    }

    /// Arena index of the node.
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// A possibly prefixed XML name with an optional namespace URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub prefix: Option<String>,
    pub local_name: String,
    pub namespace_uri: Option<String>,
}

impl QName {
    /// Split a `prefix:local` or `local` name and attach the namespace URI.
    pub fn parse(name: &str, namespace_uri: Option<&str>) -> Self {
        let (prefix, local_name) = match name.split_once(':') {
            Some((p, l)) => (Some(p.to_owned()), l.to_owned()),
            None => (None, name.to_owned()),
        };
        Self {
            prefix,
            local_name,
            namespace_uri: namespace_uri.map(str::to_owned),
        }
    }

    /// The name as it appears in markup: `prefix:local` or `local`.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.local_name),
            None => self.local_name.clone(),
        }
    }
}

/// Declared attribute type, as far as canonicalization cares.
///
/// Tokenized types (NMTOKENS, IDREFS, ENTITIES and friends) get their values
/// whitespace-normalized before escaping; CDATA values are rendered as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttrType {
    #[default]
    CData,
    Tokenized,
}

/// An attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
    pub attr_type: AttrType,
}

/// An element node: qualified name, attributes and the namespace
/// declarations made on this element itself (prefix, URI), where an empty
/// URI un-declares the prefix.
#[derive(Debug, Clone)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<Attribute>,
    pub namespace_declarations: Vec<(String, String)>,
}

impl Element {
    /// Index of the attribute with the given namespace URI and local name.
    pub fn attribute_index(&self, namespace_uri: Option<&str>, local_name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| {
            a.name.namespace_uri.as_deref() == namespace_uri && a.name.local_name == local_name
        })
    }
}

/// A processing instruction.
#[derive(Debug, Clone)]
pub struct Pi {
    pub target: String,
    pub data: Option<String>,
}

/// A document type declaration.  Carries only the root element name; a
/// doctype contributes zero bytes to canonical output regardless of content.
#[derive(Debug, Clone)]
pub struct DocType {
    pub root_name: String,
}

/// The node kinds of the tree.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document node itself, always at arena index 0.
    Document,
    Element(Element),
    Text(String),
    Comment(String),
    ProcessingInstruction(Pi),
    DocType(DocType),
}

#[derive(Debug)]
struct NodeData {
    parent: Option<u32>,
    children: Vec<u32>,
    kind: NodeKind,
}

/// An XML document: a node arena rooted at a document node.
#[derive(Debug)]
pub struct Document {
    stamp: u64,
    nodes: Vec<NodeData>,
}

impl Document {
    /// Create an empty document containing only the document node.
    pub fn new() -> Self {
        Self {
            stamp: NEXT_DOC_STAMP.fetch_add(1, Ordering::Relaxed),
            nodes: vec![NodeData {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
        }
    }

    /// The identity stamp of this document.
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId {
            doc: self.stamp,
            index: 0,
        }
    }

    /// The document element, if one has been attached.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .into_iter()
            .find(|id| matches!(self.node_kind(*id), Some(NodeKind::Element(_))))
    }

    fn get(&self, id: NodeId) -> Option<&NodeData> {
        if id.doc != self.stamp {
            return None;
        }
        self.nodes.get(id.index())
    }

    fn make_id(&self, index: usize) -> NodeId {
        NodeId {
            doc: self.stamp,
            index: index as u32,
        }
    }

    /// The kind of a node, or `None` for a handle from another document.
    pub fn node_kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|n| &n.kind)
    }

    /// The element payload of a node, if it is an element of this document.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.node_kind(id) {
            Some(NodeKind::Element(e)) => Some(e),
            _ => None,
        }
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent.map(|p| self.make_id(p as usize))
    }

    /// Children of a node, in document order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.get(id) {
            Some(n) => n
                .children
                .iter()
                .map(|c| self.make_id(*c as usize))
                .collect(),
            None => Vec::new(),
        }
    }

    /// The node and all its descendants, preorder.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if self.get(n).is_none() {
                continue;
            }
            out.push(n);
            let mut kids = self.children(n);
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// Whether the node's ancestor chain reaches the document node.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(n) = current {
            if self.get(n).is_none() {
                return false;
            }
            if n.index() == 0 {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// In-scope namespace bindings at an element: the merge of all
    /// declarations on the ancestor-or-self chain, nearer declarations
    /// winning and empty URIs un-declaring, plus the implicit `xml` binding.
    ///
    /// Map iteration order is the canonical one: the default namespace
    /// (empty prefix) first, then prefixes lexicographically.
    pub fn in_scope_namespaces(&self, id: NodeId) -> BTreeMap<String, String> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(n) = current {
            if let Some(elem) = self.element(n) {
                chain.push(&elem.namespace_declarations);
            }
            current = self.parent(n);
        }

        let mut result = BTreeMap::new();
        for decls in chain.into_iter().rev() {
            for (prefix, uri) in decls {
                if uri.is_empty() {
                    result.remove(prefix);
                } else {
                    result.insert(prefix.clone(), uri.clone());
                }
            }
        }
        result.insert("xml".to_owned(), ns::XML.to_owned());
        result
    }

    // ── Builder surface ──────────────────────────────────────────────

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData {
            parent: None,
            children: Vec::new(),
            kind,
        });
        self.make_id(index)
    }

    /// Create a detached element.  `name` may be `prefix:local` or `local`;
    /// the element's own namespace binding is declared on it (an element in
    /// no namespace un-declares the default namespace, as serializing it
    /// would require).
    pub fn new_element(&mut self, name: &str, namespace_uri: Option<&str>) -> NodeId {
        let qname = QName::parse(name, namespace_uri);
        let decl = match (&qname.prefix, namespace_uri) {
            (Some(p), Some(uri)) => (p.clone(), uri.to_owned()),
            (None, Some(uri)) => (String::new(), uri.to_owned()),
            (_, None) => (String::new(), String::new()),
        };
        self.push(NodeKind::Element(Element {
            name: qname,
            attributes: Vec::new(),
            namespace_declarations: vec![decl],
        }))
    }

    /// Create a detached text node.
    pub fn new_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_owned()))
    }

    /// Create a detached comment.
    pub fn new_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Comment(text.to_owned()))
    }

    /// Create a detached processing instruction.
    pub fn new_pi(&mut self, target: &str, data: Option<&str>) -> NodeId {
        self.push(NodeKind::ProcessingInstruction(Pi {
            target: target.to_owned(),
            data: data.map(str::to_owned),
        }))
    }

    /// Create a detached document type declaration node.
    pub fn new_doctype(&mut self, root_name: &str) -> NodeId {
        self.push(NodeKind::DocType(DocType {
            root_name: root_name.to_owned(),
        }))
    }

    /// Append `child` to `parent`'s child list.
    ///
    /// Panics if either handle belongs to another document or `child`
    /// already has a parent; tree construction errors are programmer errors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        assert_eq!(parent.doc, self.stamp, "parent from another document");
        assert_eq!(child.doc, self.stamp, "child from another document");
        assert!(
            self.nodes[child.index()].parent.is_none(),
            "child already attached"
        );
        self.nodes[child.index()].parent = Some(parent.index() as u32);
        self.nodes[parent.index()].children.push(child.index() as u32);
    }

    /// Set a CDATA attribute on an element, replacing any existing attribute
    /// with the same namespace URI and local name.
    pub fn set_attribute(&mut self, elem: NodeId, name: &str, ns_uri: Option<&str>, value: &str) {
        self.set_attribute_typed(elem, name, ns_uri, value, AttrType::CData);
    }

    /// Set an attribute with an explicit declared type.
    ///
    /// A prefixed attribute declares its prefix binding on the element
    /// (except `xml:`, whose binding is implicit everywhere).
    pub fn set_attribute_typed(
        &mut self,
        elem: NodeId,
        name: &str,
        ns_uri: Option<&str>,
        value: &str,
        attr_type: AttrType,
    ) {
        assert_eq!(elem.doc, self.stamp, "element from another document");
        let qname = QName::parse(name, ns_uri);
        if let (Some(prefix), Some(uri)) = (&qname.prefix, ns_uri) {
            if prefix != "xml" {
                let prefix = prefix.clone();
                self.declare_namespace(elem, &prefix, uri);
            }
        }
        let NodeKind::Element(element) = &mut self.nodes[elem.index()].kind else {
            panic!("set_attribute on a non-element node");
        };
        let attribute = Attribute {
            value: value.to_owned(),
            attr_type,
            name: qname,
        };
        match element.attribute_index(
            attribute.name.namespace_uri.as_deref(),
            &attribute.name.local_name,
        ) {
            Some(i) => element.attributes[i] = attribute,
            None => element.attributes.push(attribute),
        }
    }

    /// Declare (or redeclare) a namespace binding on an element.  An empty
    /// URI records an un-declaration.
    pub fn declare_namespace(&mut self, elem: NodeId, prefix: &str, uri: &str) {
        assert_eq!(elem.doc, self.stamp, "element from another document");
        let NodeKind::Element(element) = &mut self.nodes[elem.index()].kind else {
            panic!("declare_namespace on a non-element node");
        };
        match element
            .namespace_declarations
            .iter_mut()
            .find(|(p, _)| p == prefix)
        {
            Some(entry) => entry.1 = uri.to_owned(),
            None => element
                .namespace_declarations
                .push((prefix.to_owned(), uri.to_owned())),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
