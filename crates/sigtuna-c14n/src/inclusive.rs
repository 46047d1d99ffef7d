#![forbid(unsafe_code)]

//! Canonical XML 1.0 namespace rendering.
//!
//! Inclusive canonicalization copies an element's in-scope namespace axis
//! down the tree: every selected in-scope binding that differs from what the
//! nearest rendered ancestor already emitted is declared again.

use std::collections::BTreeMap;

use sigtuna_core::Result;
use sigtuna_xml::{NodeId, NodeSet};

use crate::render::NsDecl;

/// Computes the namespace declarations for a selected element.
///
/// `in_scope` is the element's full in-scope mapping (prefix to URI,
/// including the implicit `xml` binding), `rendered` the bindings already
/// emitted by the nearest selected ancestor. The `xml` prefix is never
/// declared. When an ancestor rendered a non-empty default namespace and no
/// default namespace is in scope here, the `xmlns=""` un-declaration is
/// emitted so a reparse does not inherit the wrong default.
pub(crate) fn namespace_decls(
    elem: NodeId,
    in_scope: &BTreeMap<String, String>,
    subset: &NodeSet,
    rendered: &BTreeMap<String, String>,
) -> Result<Vec<NsDecl>> {
    let mut decls = Vec::new();
    for (prefix, uri) in in_scope {
        if prefix == "xml" {
            continue;
        }
        if !subset.contains_namespace(elem, prefix) {
            continue;
        }
        if rendered.get(prefix) != Some(uri) {
            decls.push(NsDecl::new(prefix.clone(), uri.clone())?);
        }
    }
    if let Some(default) = rendered.get("") {
        if !default.is_empty() && !in_scope.contains_key("") {
            decls.push(NsDecl {
                prefix: String::new(),
                uri: String::new(),
            });
        }
    }
    decls.sort();
    Ok(decls)
}

/// The rendered-namespace state passed to a selected element's children.
///
/// Under full-document canonicalization the child state is the parent state
/// overlaid with everything in scope; when a default namespace went out of
/// scope it is removed so a later re-appearance is re-declared. Under
/// node-set canonicalization only the bindings whose namespace nodes were
/// selected at this element count as rendered.
pub(crate) fn child_rendered(
    elem: NodeId,
    in_scope: &BTreeMap<String, String>,
    subset: &NodeSet,
    rendered: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    if subset.is_all() {
        let mut child = rendered.clone();
        for (prefix, uri) in in_scope {
            if prefix != "xml" {
                child.insert(prefix.clone(), uri.clone());
            }
        }
        if !in_scope.contains_key("") {
            child.remove("");
        }
        child
    } else {
        let mut child = BTreeMap::new();
        for (prefix, uri) in in_scope {
            if prefix != "xml" && subset.contains_namespace(elem, prefix) {
                child.insert(prefix.clone(), uri.clone());
            }
        }
        child
    }
}
