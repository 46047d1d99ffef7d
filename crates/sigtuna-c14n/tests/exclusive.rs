//! Exclusive Canonical XML 1.0 scenarios, including the worked example
//! from the exclusive canonicalization recommendation and the
//! InclusiveNamespaces prefix-list behavior.

use sigtuna_c14n::{canonicalize, C14nMode};
use sigtuna_xml::{build, Document, NodeId, NodeKind, NodeSet, SubsetNode};

fn exc(doc: &Document, subset: Option<&NodeSet>, prefixes: &[&str]) -> String {
    let prefixes: Vec<String> = prefixes.iter().map(|p| (*p).to_owned()).collect();
    String::from_utf8(canonicalize(doc, C14nMode::Exclusive, subset, &prefixes).unwrap())
        .unwrap()
}

fn inc(doc: &Document, subset: Option<&NodeSet>) -> String {
    String::from_utf8(canonicalize(doc, C14nMode::Inclusive, subset, &[]).unwrap()).unwrap()
}

fn find_element(doc: &Document, local_name: &str) -> NodeId {
    doc.descendants(doc.root())
        .into_iter()
        .find(|id| {
            matches!(doc.node_kind(*id),
                Some(NodeKind::Element(e)) if e.name.local_name == local_name)
        })
        .unwrap_or_else(|| panic!("no element named {local_name}"))
}

// The exclusive canonicalization recommendation's example document: the
// subset rooted at n1:elem2 drags along an unused n0 binding and an n3
// binding that gets re-declared below.
fn worked_example() -> (Document, NodeSet) {
    let doc = build::from_str(
        r#"<n0:local xmlns:n0="foo:bar" xmlns:n3="ftp://example.org"><n1:elem2 xmlns:n1="http://example.net" xml:lang="en"><n3:stuff xmlns:n3="ftp://example.org"/></n1:elem2></n0:local>"#,
    )
    .unwrap();
    let elem2 = find_element(&doc, "elem2");
    let subset = NodeSet::subtree(&doc, elem2);
    (doc, subset)
}

#[test]
fn only_utilized_prefixes_are_declared() {
    let (doc, subset) = worked_example();
    assert_eq!(
        exc(&doc, Some(&subset), &[]),
        "<n1:elem2 xmlns:n1=\"http://example.net\" xml:lang=\"en\">\
         <n3:stuff xmlns:n3=\"ftp://example.org\"></n3:stuff></n1:elem2>"
    );
}

#[test]
fn inclusive_on_same_subset_copies_whole_axis() {
    let (doc, subset) = worked_example();
    assert_eq!(
        inc(&doc, Some(&subset)),
        "<n1:elem2 xmlns:n0=\"foo:bar\" xmlns:n1=\"http://example.net\" \
         xmlns:n3=\"ftp://example.org\" xml:lang=\"en\">\
         <n3:stuff></n3:stuff></n1:elem2>"
    );
}

#[test]
fn unused_prefix_on_whole_document_is_dropped() {
    let doc = build::from_str(
        r#"<n0:tuck xmlns:n0="http://a.example" xmlns:n1="http://b.example"/>"#,
    )
    .unwrap();
    assert_eq!(
        exc(&doc, None, &[]),
        r#"<n0:tuck xmlns:n0="http://a.example"></n0:tuck>"#
    );
}

#[test]
fn attribute_prefixes_count_as_utilized() {
    let doc = build::from_str(
        r#"<root xmlns:a="http://a.example" xmlns:b="http://b.example" a:attr="v"/>"#,
    )
    .unwrap();
    assert_eq!(
        exc(&doc, None, &[]),
        r#"<root xmlns:a="http://a.example" a:attr="v"></root>"#
    );
}

#[test]
fn prefix_list_forces_declaration() {
    let doc = build::from_str(
        r#"<root xmlns:n0="http://b.example"><child/></root>"#,
    )
    .unwrap();
    let child = find_element(&doc, "child");
    let subset = NodeSet::subtree(&doc, child);
    assert_eq!(
        exc(&doc, Some(&subset), &["n0"]),
        r#"<child xmlns:n0="http://b.example"></child>"#
    );
    assert_eq!(exc(&doc, Some(&subset), &[]), "<child></child>");
}

#[test]
fn default_token_names_the_default_namespace() {
    let doc = build::from_str(
        r#"<p:root xmlns:p="http://p.example" xmlns="http://d.example"><p:child/></p:root>"#,
    )
    .unwrap();
    let child = find_element(&doc, "child");
    let subset = NodeSet::subtree(&doc, child);
    assert_eq!(
        exc(&doc, Some(&subset), &["#default"]),
        r#"<p:child xmlns="http://d.example" xmlns:p="http://p.example"></p:child>"#
    );
    assert_eq!(
        exc(&doc, Some(&subset), &[]),
        r#"<p:child xmlns:p="http://p.example"></p:child>"#
    );
}

#[test]
fn default_namespace_undeclared_for_unbound_child() {
    let doc = build::from_str(
        r#"<root xmlns="http://e.example"><child xmlns=""/></root>"#,
    )
    .unwrap();
    assert_eq!(
        exc(&doc, None, &[]),
        r#"<root xmlns="http://e.example"><child xmlns=""></child></root>"#
    );
}

#[test]
fn xml_attributes_are_not_inherited() {
    let doc = build::from_str(r#"<root xml:id="p1"><child312/></root>"#).unwrap();
    let child = find_element(&doc, "child312");
    let subset = NodeSet::subtree(&doc, child);
    assert_eq!(exc(&doc, Some(&subset), &[]), "<child312></child312>");
}

#[test]
fn own_xml_attributes_still_render() {
    let doc = build::from_str(r#"<root><child xml:lang="en"/></root>"#).unwrap();
    let child = find_element(&doc, "child");
    let subset = NodeSet::subtree(&doc, child);
    assert_eq!(
        exc(&doc, Some(&subset), &[]),
        r#"<child xml:lang="en"></child>"#
    );
}

// When a prefix's namespace node is unselected at an intermediate output
// element, nothing renders there and the binding drops out of the rendered
// chain, so a deeper element that uses the prefix declares it afresh.
#[test]
fn hidden_binding_breaks_the_rendered_chain() {
    let doc = build::from_str(
        r#"<p:a xmlns:p="http://p.example"><p:c><p:d/></p:c></p:a>"#,
    )
    .unwrap();
    let a = find_element(&doc, "a");
    let c = find_element(&doc, "c");
    let d = find_element(&doc, "d");
    // p's namespace node is selected at a and d but not at c.
    let subset = NodeSet::from_members([
        SubsetNode::Node(a),
        SubsetNode::Namespace(a, "p".to_owned()),
        SubsetNode::Node(c),
        SubsetNode::Node(d),
        SubsetNode::Namespace(d, "p".to_owned()),
    ]);
    assert_eq!(
        exc(&doc, Some(&subset), &[]),
        "<p:a xmlns:p=\"http://p.example\"><p:c>\
         <p:d xmlns:p=\"http://p.example\"></p:d></p:c></p:a>"
    );
}

// A namespace node selected without its element still renders as a
// free-standing fragment under the exclusive modes.
#[test]
fn namespace_fragment_from_unselected_element() {
    let doc = build::from_str(r#"<foo xmlns="http://www.example.org"/>"#).unwrap();
    let root = doc.document_element().unwrap();
    let subset = NodeSet::from_members([SubsetNode::Namespace(root, String::new())]);
    assert_eq!(
        exc(&doc, Some(&subset), &[]),
        r#" xmlns="http://www.example.org""#
    );
}

#[test]
fn comments_follow_the_mode() {
    let doc = build::from_str("<doc><!--c--><child/></doc>").unwrap();
    let with = canonicalize(&doc, C14nMode::ExclusiveWithComments, None, &[]).unwrap();
    assert_eq!(
        String::from_utf8(with).unwrap(),
        "<doc><!--c--><child></child></doc>"
    );
    let without = canonicalize(&doc, C14nMode::Exclusive, None, &[]).unwrap();
    assert_eq!(String::from_utf8(without).unwrap(), "<doc><child></child></doc>");
}
