#![forbid(unsafe_code)]
//! Character escaping for canonical output.
//!
//! Text content and attribute values use different escape tables; comment
//! bodies and processing-instruction data are emitted verbatim.

use std::borrow::Cow;

/// Escapes character data for element content.
///
/// `&`, `<` and `>` become entity references and carriage returns become
/// `&#xD;`. Everything else passes through as UTF-8.
pub fn escape_text(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '\r']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Escapes an attribute value.
///
/// `&`, `<` and `"` become entity references; tab, carriage return and line
/// feed become character references so they survive attribute-value
/// normalization on reparse. `>` stays literal in attribute values.
pub fn escape_attr(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '"', '\t', '\r', '\n']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\r' => out.push_str("&#xD;"),
            '\n' => out.push_str("&#xA;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Collapses the whitespace in a tokenized attribute value.
///
/// Leading and trailing whitespace is dropped and each internal run of
/// space, tab, carriage return or line feed becomes a single space. Applied
/// to NMTOKENS-typed values before escaping.
pub fn normalize_space(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for token in value.split([' ', '\t', '\r', '\n']).filter(|t| !t.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_escapes_markup_and_carriage_return() {
        assert_eq!(escape_text("a & b < c > d\re"), "a &amp; b &lt; c &gt; d&#xD;e");
    }

    #[test]
    fn text_without_specials_borrows() {
        assert!(matches!(escape_text("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn attr_keeps_gt_literal() {
        assert_eq!(escape_attr("v1&<>\"\t\r\n"), "v1&amp;&lt;>&quot;&#x9;&#xD;&#xA;");
    }

    #[test]
    fn normalize_space_collapses_runs() {
        assert_eq!(normalize_space("  value1 \t\r\n value2  "), "value1 value2");
        assert_eq!(normalize_space("   "), "");
        assert_eq!(normalize_space("single"), "single");
    }
}
