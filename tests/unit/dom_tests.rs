/*!
 * Tests for the chapter node tree: parsing, node ids, mutation, and
 * serialization fidelity.
 */

use epubtrans::chapter::dom::Dom;

fn roundtrip(input: &str) -> String {
    let dom = Dom::parse(input.as_bytes()).unwrap();
    String::from_utf8(dom.serialize()).unwrap()
}

#[test]
fn test_parse_simpleParagraphs_shouldFindTextNodes() {
    let dom = Dom::parse(b"<html><body><p>Hello</p><p>World</p></body></html>").unwrap();
    let nodes = dom.text_nodes();
    assert_eq!(nodes.len(), 2);
    assert_eq!(dom.text(nodes[0]), "Hello");
    assert_eq!(dom.text(nodes[1]), "World");
}

#[test]
fn test_roundtrip_shouldPreserveMarkupAndAttributes() {
    let input = r#"<html><body><p class="first">Hello <em>little</em> world</p></body></html>"#;
    assert_eq!(roundtrip(input), input);
}

#[test]
fn test_roundtrip_shouldPreserveXmlDeclAndDoctype() {
    let input = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE html>\n<html><body><p>x</p></body></html>";
    let output = roundtrip(input);
    assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    assert!(output.contains("<!DOCTYPE html>"));
    assert!(output.contains("<p>x</p>"));
}

#[test]
fn test_roundtrip_shouldPreserveComments() {
    let input = "<html><body><!-- keep me --><p>x</p></body></html>";
    assert_eq!(roundtrip(input), input);
}

#[test]
fn test_roundtrip_shouldEscapeEntities() {
    let dom = Dom::parse(b"<html><body><p>Fish &amp; chips &lt;now&gt;</p></body></html>").unwrap();
    let nodes = dom.text_nodes();
    assert_eq!(dom.text(nodes[0]), "Fish & chips <now>");
    let output = String::from_utf8(dom.serialize()).unwrap();
    assert!(output.contains("Fish &amp; chips &lt;now&gt;"));
}

#[test]
fn test_parse_numericEntity_shouldResolve() {
    let dom = Dom::parse(b"<html><body><p>caf&#233;</p></body></html>").unwrap();
    let nodes = dom.text_nodes();
    assert_eq!(dom.text(nodes[0]), "caf\u{e9}");
}

#[test]
fn test_serialize_selfClosedSpan_shouldBecomePairedTags() {
    let output = roundtrip("<html><body><p><span/>text</p></body></html>");
    assert!(output.contains("<span></span>"));
    assert!(!output.contains("<span/>"));
}

#[test]
fn test_serialize_voidElements_shouldStaySelfClosed() {
    let output = roundtrip("<html><body><p>line<br/>break</p><hr/></body></html>");
    assert!(output.contains("<br/>"));
    assert!(output.contains("<hr/>"));
}

#[test]
fn test_setText_shouldRewriteOnlyThatNode() {
    let mut dom =
        Dom::parse(b"<html><body><p>Hello</p><code>raw</code></body></html>").unwrap();
    let nodes = dom.text_nodes();
    dom.set_text(nodes[0], "Bonjour".to_string());
    let output = String::from_utf8(dom.serialize()).unwrap();
    assert!(output.contains("<p>Bonjour</p>"));
    assert!(output.contains("<code>raw</code>"));
}

#[test]
fn test_nodePath_shouldUseSiblingPositions() {
    let dom = Dom::parse(b"<html><body><p>one</p><p>two</p></body></html>").unwrap();
    let nodes = dom.text_nodes();
    assert_eq!(dom.node_path(nodes[0]), "/html[1]/body[1]/p[1]/text()[1]");
    assert_eq!(dom.node_path(nodes[1]), "/html[1]/body[1]/p[2]/text()[1]");
}

#[test]
fn test_nodePath_shouldSurviveTextReplacement() {
    let mut dom = Dom::parse(b"<html><body><p>one</p><p>two</p></body></html>").unwrap();
    let nodes = dom.text_nodes();
    let before = dom.node_path(nodes[1]);
    dom.set_text(nodes[1], "a much longer replacement text".to_string());
    assert_eq!(dom.node_path(nodes[1]), before);
}

#[test]
fn test_ancestors_shouldListNearestFirst() {
    let dom = Dom::parse(b"<html><body><div><p>deep</p></div></body></html>").unwrap();
    let nodes = dom.text_nodes();
    let tags: Vec<String> = dom
        .ancestor_ids(nodes[0])
        .into_iter()
        .filter_map(|id| dom.element_local_tag(id))
        .collect();
    assert_eq!(tags, vec!["p", "div", "body", "html"]);
}

#[test]
fn test_fullText_shouldJoinInDocumentOrder() {
    let dom =
        Dom::parse(b"<html><body><p>One</p><p>Two <em>three</em></p></body></html>").unwrap();
    assert_eq!(dom.full_text(), "One Two three");
}

#[test]
fn test_parse_mismatchedTags_shouldBeStructuralError() {
    assert!(Dom::parse(b"<html><body><p>bad</b></body></html>").is_err());
}

#[test]
fn test_parse_unclosedElement_shouldBeStructuralError() {
    assert!(Dom::parse(b"<html><body><p>never closed").is_err());
}

#[test]
fn test_parse_inlineMarkup_shouldSplitTextNodes() {
    let dom = Dom::parse(b"<html><body><p>Hello <b>bold</b> tail</p></body></html>").unwrap();
    let nodes = dom.text_nodes();
    assert_eq!(nodes.len(), 3);
    assert_eq!(dom.text(nodes[0]), "Hello ");
    assert_eq!(dom.text(nodes[1]), "bold");
    assert_eq!(dom.text(nodes[2]), " tail");
    assert_eq!(
        dom.node_path(nodes[2]),
        "/html[1]/body[1]/p[1]/text()[2]"
    );
}
