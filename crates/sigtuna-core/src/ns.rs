#![forbid(unsafe_code)]

//! XML namespace constants.

/// The XML namespace, bound to the `xml` prefix implicitly in every document.
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";

/// The namespace of `xmlns` attributes themselves.
pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
