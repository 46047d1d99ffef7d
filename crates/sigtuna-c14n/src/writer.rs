#![forbid(unsafe_code)]

//! The canonical serialization traversal.
//!
//! A single top-down pass over the document threads two pieces of state:
//! the namespace bindings already rendered by the nearest selected ancestor
//! and, for the inclusive algorithms, the `xml:*` attributes accumulated
//! from unselected ancestors that a selected element must inherit.

use std::collections::BTreeMap;
use std::io::Write;

use sigtuna_core::{ns, Error, Result};
use sigtuna_xml::{Document, Element, NodeId, NodeKind, NodeSet, Pi};

use crate::render::{self, Attr};
use crate::{escape, exclusive, inclusive, C14nMode};

pub(crate) struct Writer<'a, W: Write> {
    pub doc: &'a Document,
    pub subset: &'a NodeSet,
    pub mode: C14nMode,
    pub inclusive_prefixes: &'a [String],
    pub out: &'a mut W,
}

impl<W: Write> Writer<'_, W> {
    /// Serializes the document: prolog, document element, epilog.
    ///
    /// A selected prolog node is followed by a line feed and a selected
    /// epilog node preceded by one, so a subset that omits the document
    /// element separates prolog from epilog with a blank line.
    pub fn write_tree(&mut self) -> Result<()> {
        let empty = BTreeMap::new();
        let mut seen_element = false;
        for id in self.doc.children(self.doc.root()) {
            match self.doc.node_kind(id) {
                Some(NodeKind::Element(_)) => {
                    seen_element = true;
                    self.element(id, &empty, &empty)?;
                }
                Some(NodeKind::Comment(text)) => {
                    if self.mode.with_comments() && self.subset.contains_node(id) {
                        self.misc_separator(seen_element, |w| w.comment(text))?;
                    }
                }
                Some(NodeKind::ProcessingInstruction(pi)) => {
                    if self.subset.contains_node(id) {
                        self.misc_separator(seen_element, |w| w.pi(pi))?;
                    }
                }
                Some(NodeKind::DocType(_)) => {}
                Some(NodeKind::Text(_)) => {
                    return Err(Error::Internal(
                        "text node at document level".to_owned(),
                    ));
                }
                Some(NodeKind::Document) | None => {
                    return Err(Error::Internal("malformed document tree".to_owned()));
                }
            }
        }
        Ok(())
    }

    fn misc_separator(
        &mut self,
        after_element: bool,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        if after_element {
            self.out.write_all(b"\n")?;
        }
        body(self)?;
        if !after_element {
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }

    fn process_node(
        &mut self,
        id: NodeId,
        rendered: &BTreeMap<String, String>,
        xml_pending: &BTreeMap<String, String>,
    ) -> Result<()> {
        match self.doc.node_kind(id) {
            Some(NodeKind::Element(_)) => self.element(id, rendered, xml_pending),
            Some(NodeKind::Text(text)) => {
                if self.subset.contains_node(id) {
                    self.out
                        .write_all(escape::escape_text(text).as_bytes())?;
                }
                Ok(())
            }
            Some(NodeKind::Comment(text)) => {
                if self.mode.with_comments() && self.subset.contains_node(id) {
                    self.comment(text)?;
                }
                Ok(())
            }
            Some(NodeKind::ProcessingInstruction(pi)) => {
                if self.subset.contains_node(id) {
                    self.pi(pi)?;
                }
                Ok(())
            }
            // A document type declaration contributes nothing.
            Some(NodeKind::DocType(_)) => Ok(()),
            Some(NodeKind::Document) | None => {
                Err(Error::Internal("malformed document tree".to_owned()))
            }
        }
    }

    fn element(
        &mut self,
        id: NodeId,
        rendered: &BTreeMap<String, String>,
        xml_pending: &BTreeMap<String, String>,
    ) -> Result<()> {
        let elem = self
            .doc
            .element(id)
            .ok_or_else(|| Error::Internal("element lookup failed".to_owned()))?;
        let in_scope = self.doc.in_scope_namespaces(id);
        if self.subset.contains_node(id) {
            self.selected_element(id, elem, &in_scope, rendered, xml_pending)
        } else {
            self.unselected_element(id, elem, &in_scope, rendered, xml_pending)
        }
    }

    /// A selected element renders a full start tag, its children, and an
    /// end tag. Empty elements still render `<e></e>`, never `<e/>`.
    fn selected_element(
        &mut self,
        id: NodeId,
        elem: &Element,
        in_scope: &BTreeMap<String, String>,
        rendered: &BTreeMap<String, String>,
        xml_pending: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut attrs: Vec<Attr> = elem
            .attributes
            .iter()
            .enumerate()
            .filter(|(i, _)| self.subset.contains_attribute(id, *i))
            .map(|(_, a)| render::attr_from(a))
            .collect();

        // The inclusive algorithms pull xml:* attributes down from pruned
        // ancestors; the element's own xml:* attributes win.
        if !self.mode.is_exclusive() {
            for (local, value) in xml_pending {
                if elem.attribute_index(Some(ns::XML), local).is_none() {
                    attrs.push(Attr {
                        ns_uri: ns::XML.to_owned(),
                        local_name: local.clone(),
                        qualified_name: format!("xml:{local}"),
                        value: value.clone(),
                    });
                }
            }
        }

        let (decls, child_rendered);
        if self.mode.is_exclusive() {
            let (d, utilized) = exclusive::namespace_decls(
                id,
                elem,
                &attrs,
                in_scope,
                self.subset,
                rendered,
                self.inclusive_prefixes,
            )?;
            child_rendered = exclusive::child_rendered(
                id, &d, &utilized, in_scope, self.subset, rendered,
            );
            decls = d;
        } else {
            decls = inclusive::namespace_decls(id, in_scope, self.subset, rendered)?;
            child_rendered = inclusive::child_rendered(id, in_scope, self.subset, rendered);
        }

        attrs.sort();

        let qualified = elem.name.qualified();
        self.out.write_all(b"<")?;
        self.out.write_all(qualified.as_bytes())?;
        for decl in &decls {
            self.out.write_all(decl.render().as_bytes())?;
        }
        for attr in &attrs {
            self.out.write_all(attr.render().as_bytes())?;
        }
        self.out.write_all(b">")?;

        // Inherited xml:* state restarts below every rendered element.
        let child_pending = BTreeMap::new();
        for child in self.doc.children(id) {
            self.process_node(child, &child_rendered, &child_pending)?;
        }

        self.out.write_all(b"</")?;
        self.out.write_all(qualified.as_bytes())?;
        self.out.write_all(b">")?;
        Ok(())
    }

    /// An unselected element renders no tags but still contributes its
    /// selected namespace and attribute nodes as free-standing fragments,
    /// each with a leading space, in axis order (namespaces sorted, then
    /// attributes in document order). Its `xml:*` attributes join the
    /// pending inheritance state for descendant selected elements.
    fn unselected_element(
        &mut self,
        id: NodeId,
        elem: &Element,
        in_scope: &BTreeMap<String, String>,
        rendered: &BTreeMap<String, String>,
        xml_pending: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut fragments = Vec::new();
        for (prefix, uri) in in_scope {
            if prefix == "xml" {
                continue;
            }
            if !self.subset.contains_namespace(id, prefix) {
                continue;
            }
            if rendered.get(prefix) != Some(uri) {
                fragments.push(render::NsDecl::new(prefix.clone(), uri.clone())?);
            }
        }
        fragments.sort();
        for fragment in &fragments {
            self.out.write_all(fragment.render().as_bytes())?;
        }
        for (i, attribute) in elem.attributes.iter().enumerate() {
            if self.subset.contains_attribute(id, i) {
                self.out
                    .write_all(render::attr_from(attribute).render().as_bytes())?;
            }
        }

        let mut child_pending = xml_pending.clone();
        if !self.mode.is_exclusive() {
            for attribute in &elem.attributes {
                if attribute.name.namespace_uri.as_deref() == Some(ns::XML) {
                    child_pending
                        .insert(attribute.name.local_name.clone(), attribute.value.clone());
                }
            }
        }
        for child in self.doc.children(id) {
            self.process_node(child, rendered, &child_pending)?;
        }
        Ok(())
    }

    pub(crate) fn comment(&mut self, text: &str) -> Result<()> {
        self.out.write_all(b"<!--")?;
        self.out.write_all(text.as_bytes())?;
        self.out.write_all(b"-->")?;
        Ok(())
    }

    pub(crate) fn pi(&mut self, pi: &Pi) -> Result<()> {
        self.out.write_all(b"<?")?;
        self.out.write_all(pi.target.as_bytes())?;
        if let Some(data) = pi.data.as_deref().filter(|d| !d.is_empty()) {
            self.out.write_all(b" ")?;
            self.out.write_all(data.as_bytes())?;
        }
        self.out.write_all(b"?>")?;
        Ok(())
    }
}
