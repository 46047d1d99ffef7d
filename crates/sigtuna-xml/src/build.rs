#![forbid(unsafe_code)]

//! Bridge from `roxmltree` parse trees to [`Document`].
//!
//! roxmltree resolves entities and performs attribute-value normalization;
//! this module only reshapes the parsed tree into the arena model.  Local
//! namespace declarations are recovered by diffing each element's in-scope
//! bindings against its parent's, which also recovers `xmlns=""`
//! un-declarations.  Declared attribute types are not available from the
//! parser, so all bridged attributes are CDATA; tokenized attributes can
//! only be produced through the builder surface.

use crate::document::{Document, NodeId};
use sigtuna_core::{ns, Error, Result};
use std::collections::BTreeMap;

/// Parse XML text into a [`Document`].
pub fn from_str(text: &str) -> Result<Document> {
    let rdoc = roxmltree::Document::parse_with_options(text, crate::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    Ok(from_roxmltree(&rdoc))
}

/// Convert an already-parsed roxmltree document.
pub fn from_roxmltree(rdoc: &roxmltree::Document<'_>) -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    for child in rdoc.root().children() {
        // Whitespace between top-level markup is not character data.
        if child.node_type() == roxmltree::NodeType::Text
            && child.text().is_some_and(|t| t.trim().is_empty())
        {
            continue;
        }
        if let Some(id) = convert(&mut doc, child) {
            doc.append_child(root, id);
        }
    }
    doc
}

fn convert(doc: &mut Document, rnode: roxmltree::Node<'_, '_>) -> Option<NodeId> {
    match rnode.node_type() {
        roxmltree::NodeType::Root => None,
        roxmltree::NodeType::Element => Some(convert_element(doc, rnode)),
        roxmltree::NodeType::Text => Some(doc.new_text(rnode.text().unwrap_or(""))),
        roxmltree::NodeType::Comment => Some(doc.new_comment(rnode.text().unwrap_or(""))),
        roxmltree::NodeType::PI => {
            let pi = rnode.pi()?;
            let data = pi.value.filter(|t| !t.is_empty());
            Some(doc.new_pi(pi.target, data))
        }
    }
}

fn convert_element(doc: &mut Document, rnode: roxmltree::Node<'_, '_>) -> NodeId {
    // roxmltree does not expose the original prefix, so recover the qname
    // from the source text: the node's range starts at `<`.
    let source = &rnode.document().input_text()[rnode.range()];
    let name = source[1..]
        .split(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
        .next()
        .unwrap_or("")
        .to_owned();
    let id = doc.new_element(&name, rnode.tag_name().namespace());

    // Recover this element's own declarations from the scope delta.
    let own = scope_of(Some(rnode));
    let inherited = scope_of(rnode.parent().filter(|p| p.is_element()));
    for (prefix, uri) in &own {
        if inherited.get(prefix) != Some(uri) {
            doc.declare_namespace(id, prefix, uri);
        }
    }
    for prefix in inherited.keys() {
        if !own.contains_key(prefix) {
            doc.declare_namespace(id, prefix, "");
        }
    }

    for attr in rnode.attributes() {
        let qname = match attr.namespace() {
            Some(uri) if uri == ns::XML => format!("xml:{}", attr.name()),
            // The original prefix is only recoverable from the source text.
            _ => rnode.document().input_text()[attr.range_qname()].to_owned(),
        };
        doc.set_attribute(id, &qname, attr.namespace(), attr.value());
    }

    for child in rnode.children() {
        if let Some(converted) = convert(doc, child) {
            doc.append_child(id, converted);
        }
    }
    id
}

fn scope_of(rnode: Option<roxmltree::Node<'_, '_>>) -> BTreeMap<String, String> {
    let mut scope = BTreeMap::new();
    if let Some(n) = rnode {
        for binding in n.namespaces() {
            let prefix = binding.name().unwrap_or("");
            if prefix == "xml" {
                continue;
            }
            scope.insert(prefix.to_owned(), binding.uri().to_owned());
        }
    }
    scope
}
