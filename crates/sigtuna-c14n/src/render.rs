#![forbid(unsafe_code)]

//! Rendering primitives shared by the inclusive and exclusive passes.

use sigtuna_core::{Error, Result};
use sigtuna_xml::{AttrType, Attribute};

use crate::escape;

/// A namespace declaration scheduled for output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsDecl {
    /// The prefix ("" for the default namespace).
    pub prefix: String,
    /// The namespace URI ("" un-declares the default namespace).
    pub uri: String,
}

impl NsDecl {
    /// Builds a declaration, rejecting relative namespace URIs.
    ///
    /// The empty URI is allowed: it renders the `xmlns=""` un-declaration.
    pub fn new(prefix: String, uri: String) -> Result<Self> {
        ensure_absolute(&uri)?;
        Ok(Self { prefix, uri })
    }

    /// Renders this declaration as ` xmlns="uri"` or ` xmlns:prefix="uri"`.
    pub fn render(&self) -> String {
        if self.prefix.is_empty() {
            format!(" xmlns=\"{}\"", escape::escape_attr(&self.uri))
        } else {
            format!(
                " xmlns:{}=\"{}\"",
                self.prefix,
                escape::escape_attr(&self.uri)
            )
        }
    }
}

impl Ord for NsDecl {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Default namespace (empty prefix) sorts first,
        // then prefixes compare lexicographically.
        match (self.prefix.is_empty(), other.prefix.is_empty()) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => self.prefix.cmp(&other.prefix),
        }
    }
}

impl PartialOrd for NsDecl {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// An attribute scheduled for output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// The namespace URI of the attribute ("" for no namespace).
    pub ns_uri: String,
    /// The local name.
    pub local_name: String,
    /// The qualified name (prefix:local or just local).
    pub qualified_name: String,
    /// The attribute value, already whitespace-normalized if tokenized.
    pub value: String,
}

impl Attr {
    /// Renders this attribute as ` qname="escaped-value"`.
    pub fn render(&self) -> String {
        format!(
            " {}=\"{}\"",
            self.qualified_name,
            escape::escape_attr(&self.value)
        )
    }

    /// The prefix portion of the qualified name, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.qualified_name.split_once(':').map(|(p, _)| p)
    }
}

impl Ord for Attr {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Attributes with no namespace come before those with a namespace.
        // Among those with namespaces, sort by (ns_uri, local_name).
        // Among those without namespaces, sort by local_name.
        match (self.ns_uri.is_empty(), other.ns_uri.is_empty()) {
            (true, true) => self.local_name.cmp(&other.local_name),
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            (false, false) => self
                .ns_uri
                .cmp(&other.ns_uri)
                .then(self.local_name.cmp(&other.local_name)),
        }
    }
}

impl PartialOrd for Attr {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Converts a tree attribute into its render form, collapsing whitespace
/// in tokenized (NMTOKENS) values.
pub fn attr_from(attribute: &Attribute) -> Attr {
    let value = match attribute.attr_type {
        AttrType::Tokenized => escape::normalize_space(&attribute.value),
        AttrType::CData => attribute.value.clone(),
    };
    Attr {
        ns_uri: attribute.name.namespace_uri.clone().unwrap_or_default(),
        local_name: attribute.name.local_name.clone(),
        qualified_name: attribute.name.qualified(),
        value,
    }
}

/// Rejects relative namespace URIs.
///
/// Canonical XML requires every bound namespace name to be an absolute URI;
/// a URI is absolute when it starts with `scheme:` where the scheme matches
/// RFC 3986 (`ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`). The empty string
/// is accepted because it only ever denotes the absent default namespace.
pub fn ensure_absolute(uri: &str) -> Result<()> {
    if uri.is_empty() || is_absolute(uri) {
        Ok(())
    } else {
        Err(Error::InvalidNamespaceUri(uri.to_owned()))
    }
}

fn is_absolute(uri: &str) -> bool {
    let Some(colon) = uri.find(':') else {
        return false;
    };
    let scheme = &uri[..colon];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_namespace_sorts_first() {
        let mut decls = vec![
            NsDecl::new("b".into(), "http://b.example".into()).unwrap(),
            NsDecl::new(String::new(), "http://d.example".into()).unwrap(),
            NsDecl::new("a".into(), "http://a.example".into()).unwrap(),
        ];
        decls.sort();
        let prefixes: Vec<&str> = decls.iter().map(|d| d.prefix.as_str()).collect();
        assert_eq!(prefixes, ["", "a", "b"]);
    }

    #[test]
    fn unqualified_attributes_sort_before_namespaced() {
        let plain = Attr {
            ns_uri: String::new(),
            local_name: "z".into(),
            qualified_name: "z".into(),
            value: String::new(),
        };
        let namespaced = Attr {
            ns_uri: "http://a.example".into(),
            local_name: "a".into(),
            qualified_name: "p:a".into(),
            value: String::new(),
        };
        assert!(plain < namespaced);
    }

    #[test]
    fn relative_uri_is_rejected() {
        assert!(matches!(
            NsDecl::new("p".into(), "relative".into()),
            Err(Error::InvalidNamespaceUri(_))
        ));
        assert!(ensure_absolute("http://example.org").is_ok());
        assert!(ensure_absolute("urn:example:animal").is_ok());
        assert!(ensure_absolute("").is_ok());
        assert!(ensure_absolute("/rooted/path").is_err());
        assert!(ensure_absolute("9http://x").is_err());
    }

    #[test]
    fn undeclaration_renders_empty_value() {
        let decl = NsDecl::new(String::new(), String::new()).unwrap();
        assert_eq!(decl.render(), " xmlns=\"\"");
    }
}
