#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 namespace rendering.
//!
//! Exclusive canonicalization only declares the prefixes an element
//! actually uses: its own prefix, the prefixes of its rendered attributes
//! and any prefix named on the inclusive-namespaces list. A prefix is
//! declared when its binding is not already rendered by the nearest output
//! ancestor, which keeps extracted fragments independent of the namespace
//! context they were cut from.

use std::collections::{BTreeMap, BTreeSet};

use sigtuna_core::Result;
use sigtuna_xml::{Element, NodeId, NodeSet};

use crate::render::{Attr, NsDecl};

/// The token that names the default namespace on an inclusive-namespaces
/// prefix list.
pub const DEFAULT_TOKEN: &str = "#default";

/// Computes the namespace declarations for a selected element, returning
/// both the declarations and the utilized-prefix set (needed to decide
/// which bindings the children may treat as already rendered).
pub(crate) fn namespace_decls(
    elem: NodeId,
    element: &Element,
    rendered_attrs: &[Attr],
    in_scope: &BTreeMap<String, String>,
    subset: &NodeSet,
    rendered: &BTreeMap<String, String>,
    inclusive_prefixes: &[String],
) -> Result<(Vec<NsDecl>, BTreeSet<String>)> {
    let mut utilized = BTreeSet::new();
    utilized.insert(element.name.prefix.clone().unwrap_or_default());
    for attr in rendered_attrs {
        if let Some(prefix) = attr.prefix() {
            if prefix != "xml" {
                utilized.insert(prefix.to_owned());
            }
        }
    }
    for prefix in inclusive_prefixes {
        if prefix == DEFAULT_TOKEN {
            utilized.insert(String::new());
        } else {
            utilized.insert(prefix.clone());
        }
    }

    let mut decls = Vec::new();
    for prefix in &utilized {
        if prefix == "xml" {
            continue;
        }
        let visible = in_scope
            .get(prefix)
            .filter(|_| subset.contains_namespace(elem, prefix));
        match visible {
            Some(uri) => {
                if rendered.get(prefix) != Some(uri) {
                    decls.push(NsDecl::new(prefix.clone(), uri.clone())?);
                }
            }
            // A utilized default namespace with no visible binding must
            // un-declare an inherited rendered default.
            None if prefix.is_empty() => {
                if rendered.get("").is_some_and(|uri| !uri.is_empty()) {
                    decls.push(NsDecl {
                        prefix: String::new(),
                        uri: String::new(),
                    });
                }
            }
            None => {}
        }
    }
    decls.sort();
    Ok((decls, utilized))
}

/// The rendered-namespace state passed to a selected element's children.
///
/// Bindings declared here are added to the inherited state. A utilized
/// prefix whose binding was not visible at this element breaks the chain:
/// it is removed so a descendant that uses it declares it afresh.
pub(crate) fn child_rendered(
    elem: NodeId,
    decls: &[NsDecl],
    utilized: &BTreeSet<String>,
    in_scope: &BTreeMap<String, String>,
    subset: &NodeSet,
    rendered: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut child = rendered.clone();
    for decl in decls {
        child.insert(decl.prefix.clone(), decl.uri.clone());
    }
    for prefix in utilized {
        if prefix == "xml" {
            continue;
        }
        let visible =
            in_scope.contains_key(prefix) && subset.contains_namespace(elem, prefix);
        if !visible {
            child.remove(prefix);
        }
    }
    child
}
