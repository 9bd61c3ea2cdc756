/*!
 * Chapter node tree.
 *
 * A small arena DOM built from quick-xml events, tuned for one job: finding
 * text-bearing nodes, rewriting some of their text in place, and serializing
 * the tree back out without disturbing any markup. Node ids are derived from
 * tree position, not content, so they survive text replacement.
 */

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::errors::AppError;

/// Index into the arena. Id 0 is the synthetic document node.
pub type NodeId = usize;

const DOCUMENT: NodeId = 0;

/// Elements that may legally be serialized self-closed.
///
/// Everything else is written as `<tag></tag>` even when empty: EPUB readers
/// parsing XHTML as HTML treat `<span/>` as an unclosed opening tag, which
/// bleeds its styling over the rest of the chapter.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Node payload variants
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Synthetic document root
    Document,
    /// An element with its tag as written (prefix preserved) and raw
    /// attribute name/value pairs
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    /// Character data, entity references resolved
    Text { content: String },
    /// Comment, raw content without the delimiters
    Comment { raw: String },
    /// CDATA section, raw content
    CData { raw: String },
    /// Processing instruction, raw content without `<?` `?>`
    ProcessingInstruction { raw: String },
    /// An entity reference this parser does not resolve, kept verbatim
    EntityRef { name: String },
}

/// One arena node
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Parsed chapter markup as a mutable node tree.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    /// Raw XML declaration content, without `<?` `?>`
    decl: Option<String>,
    /// Raw DOCTYPE content, without `<!DOCTYPE` and `>`
    doctype: Option<String>,
}

impl Dom {
    /// Parse chapter bytes into a node tree.
    ///
    /// Malformed markup (mismatched or unclosed tags, stray entity syntax)
    /// is a structural error; callers abort the run before any translation
    /// call is made.
    pub fn parse(bytes: &[u8]) -> Result<Self, AppError> {
        let source = String::from_utf8_lossy(bytes);
        // Default reader config: end-tag names are checked, so unbalanced
        // markup surfaces as a parse error here.
        let mut reader = Reader::from_str(&source);

        let mut dom = Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            decl: None,
            doctype: None,
        };

        let mut stack: Vec<NodeId> = vec![DOCUMENT];
        let mut pending_text = String::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    dom.flush_text(&mut pending_text, *stack.last().unwrap());
                    let id = dom.push_element(&e, false, *stack.last().unwrap())?;
                    stack.push(id);
                }
                Ok(Event::Empty(e)) => {
                    dom.flush_text(&mut pending_text, *stack.last().unwrap());
                    dom.push_element(&e, true, *stack.last().unwrap())?;
                }
                Ok(Event::End(_)) => {
                    dom.flush_text(&mut pending_text, *stack.last().unwrap());
                    if stack.len() <= 1 {
                        return Err(AppError::Structural(
                            "closing tag without matching opening tag".to_string(),
                        ));
                    }
                    stack.pop();
                }
                Ok(Event::Text(e)) => {
                    pending_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
                Ok(Event::GeneralRef(e)) => {
                    let entity = String::from_utf8_lossy(e.as_ref()).to_string();
                    match resolve_entity(&entity) {
                        Some(resolved) => pending_text.push_str(&resolved),
                        None => {
                            dom.flush_text(&mut pending_text, *stack.last().unwrap());
                            dom.push_node(
                                NodeKind::EntityRef { name: entity },
                                *stack.last().unwrap(),
                            );
                        }
                    }
                }
                Ok(Event::CData(e)) => {
                    dom.flush_text(&mut pending_text, *stack.last().unwrap());
                    dom.push_node(
                        NodeKind::CData {
                            raw: String::from_utf8_lossy(&e).to_string(),
                        },
                        *stack.last().unwrap(),
                    );
                }
                Ok(Event::Comment(e)) => {
                    dom.flush_text(&mut pending_text, *stack.last().unwrap());
                    dom.push_node(
                        NodeKind::Comment {
                            raw: String::from_utf8_lossy(&e).to_string(),
                        },
                        *stack.last().unwrap(),
                    );
                }
                Ok(Event::PI(e)) => {
                    dom.flush_text(&mut pending_text, *stack.last().unwrap());
                    dom.push_node(
                        NodeKind::ProcessingInstruction {
                            raw: String::from_utf8_lossy(&e).to_string(),
                        },
                        *stack.last().unwrap(),
                    );
                }
                Ok(Event::Decl(e)) => {
                    let version = e
                        .version()
                        .map(|v| String::from_utf8_lossy(&v).to_string())
                        .unwrap_or_else(|_| "1.0".to_string());
                    let mut decl = format!("xml version=\"{}\"", version);
                    if let Some(Ok(encoding)) = e.encoding() {
                        decl.push_str(&format!(
                            " encoding=\"{}\"",
                            String::from_utf8_lossy(&encoding)
                        ));
                    }
                    dom.decl = Some(decl);
                }
                Ok(Event::DocType(e)) => {
                    dom.doctype = Some(String::from_utf8_lossy(&e).trim().to_string());
                }
                Ok(Event::Eof) => {
                    dom.flush_text(&mut pending_text, *stack.last().unwrap());
                    break;
                }
                Err(e) => {
                    return Err(AppError::Structural(e.to_string()));
                }
            }
        }

        if stack.len() > 1 {
            return Err(AppError::Structural(format!(
                "{} unclosed element(s) at end of document",
                stack.len() - 1
            )));
        }

        Ok(dom)
    }

    fn push_node(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    fn push_element(
        &mut self,
        start: &quick_xml::events::BytesStart<'_>,
        self_closing: bool,
        parent: NodeId,
    ) -> Result<NodeId, AppError> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).to_string();

        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| AppError::Structural(e.to_string()))?;
            attrs.push((
                String::from_utf8_lossy(attr.key.as_ref()).to_string(),
                String::from_utf8_lossy(&attr.value).to_string(),
            ));
        }

        Ok(self.push_node(
            NodeKind::Element {
                tag,
                attrs,
                self_closing,
            },
            parent,
        ))
    }

    fn flush_text(&mut self, pending: &mut String, parent: NodeId) {
        if pending.is_empty() {
            return;
        }
        let content = std::mem::take(pending);
        self.push_node(NodeKind::Text { content }, parent);
    }

    /// All text node ids in document order
    pub fn text_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(DOCUMENT, &mut |id, node| {
            if matches!(node.kind, NodeKind::Text { .. }) {
                out.push(id);
            }
        });
        out
    }

    fn walk(&self, id: NodeId, visit: &mut impl FnMut(NodeId, &Node)) {
        for &child in &self.nodes[id].children {
            visit(child, &self.nodes[child]);
            self.walk(child, visit);
        }
    }

    /// Current text of a text node; empty for any other kind
    pub fn text(&self, id: NodeId) -> &str {
        match &self.nodes[id].kind {
            NodeKind::Text { content } => content,
            _ => "",
        }
    }

    /// Replace the text of a text node in place
    pub fn set_text(&mut self, id: NodeId, content: String) {
        if let NodeKind::Text { content: slot } = &mut self.nodes[id].kind {
            *slot = content;
        }
    }

    /// Element ancestor ids of a node, nearest first, document excluded
    pub fn ancestor_ids(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes[id].parent;
        while let Some(parent) = current {
            if parent == DOCUMENT {
                break;
            }
            out.push(parent);
            current = self.nodes[parent].parent;
        }
        out
    }

    /// Lowercase local tag name of an element node
    pub fn element_local_tag(&self, id: NodeId) -> Option<String> {
        match &self.nodes[id].kind {
            NodeKind::Element { tag, .. } => Some(local_name(tag).to_lowercase()),
            _ => None,
        }
    }

    /// Attribute value of an element, matched by lowercase local name
    pub fn attribute_local(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| local_name(key).eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Stable position-derived id for a node, XPath-like:
    /// `/html[1]/body[1]/p[2]/text()[1]`
    pub fn node_path(&self, id: NodeId) -> String {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            if parent == DOCUMENT {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain.reverse();

        let mut path = String::new();
        for &nid in &chain {
            let parent = match self.nodes[nid].parent {
                Some(p) => p,
                None => continue,
            };
            match &self.nodes[nid].kind {
                NodeKind::Element { tag, .. } => {
                    let local = local_name(tag).to_lowercase();
                    let index = self.sibling_index(parent, nid, |other| {
                        matches!(&other.kind, NodeKind::Element { tag: t, .. }
                            if local_name(t).eq_ignore_ascii_case(&local))
                    });
                    path.push_str(&format!("/{}[{}]", local, index));
                }
                NodeKind::Text { .. } => {
                    let index = self.sibling_index(parent, nid, |other| {
                        matches!(other.kind, NodeKind::Text { .. })
                    });
                    path.push_str(&format!("/text()[{}]", index));
                }
                _ => {}
            }
        }
        path
    }

    /// 1-based position of `id` among the children of `parent` that match
    fn sibling_index(&self, parent: NodeId, id: NodeId, matches: impl Fn(&Node) -> bool) -> usize {
        let mut index = 0;
        for &child in &self.nodes[parent].children {
            if matches(&self.nodes[child]) {
                index += 1;
            }
            if child == id {
                break;
            }
        }
        index
    }

    /// All text content in document order, trimmed and space-joined
    pub fn full_text(&self) -> String {
        let mut pieces = Vec::new();
        self.walk(DOCUMENT, &mut |_, node| {
            if let NodeKind::Text { content } = &node.kind {
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    pieces.push(trimmed.to_string());
                }
            }
        });
        pieces.join(" ")
    }

    /// Serialize the tree back to chapter bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = String::new();

        if let Some(decl) = &self.decl {
            out.push_str("<?");
            out.push_str(decl);
            out.push_str("?>\n");
        }
        if let Some(doctype) = &self.doctype {
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype);
            out.push_str(">\n");
        }

        for &child in &self.nodes[DOCUMENT].children {
            self.write_node(child, &mut out);
        }

        out.into_bytes()
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id].kind {
            NodeKind::Document => {}
            NodeKind::Element {
                tag,
                attrs,
                self_closing,
            } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in attrs {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&value.replace('"', "&quot;"));
                    out.push('"');
                }

                let children = &self.nodes[id].children;
                let local = local_name(tag).to_lowercase();
                let is_void = VOID_ELEMENTS.contains(&local.as_str());

                if children.is_empty() && is_void {
                    out.push_str("/>");
                } else if children.is_empty() && *self_closing {
                    // Was self-closed in the source, but writing it that way
                    // confuses HTML-mode EPUB readers.
                    out.push_str("></");
                    out.push_str(tag);
                    out.push('>');
                } else {
                    out.push('>');
                    for &child in children {
                        self.write_node(child, out);
                    }
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                }
            }
            NodeKind::Text { content } => {
                out.push_str(&escape_text(content));
            }
            NodeKind::Comment { raw } => {
                out.push_str("<!--");
                out.push_str(raw);
                out.push_str("-->");
            }
            NodeKind::CData { raw } => {
                out.push_str("<![CDATA[");
                out.push_str(raw);
                out.push_str("]]>");
            }
            NodeKind::ProcessingInstruction { raw } => {
                out.push_str("<?");
                out.push_str(raw);
                out.push_str("?>");
            }
            NodeKind::EntityRef { name } => {
                out.push('&');
                out.push_str(name);
                out.push(';');
            }
        }
    }
}

/// Strip a namespace prefix from a tag or attribute name
fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// Escape character data for serialization
fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Resolve XML and common HTML entity references
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        "nbsp" => return Some("\u{a0}".to_string()),
        "shy" => return Some("\u{ad}".to_string()),
        "mdash" => return Some("\u{2014}".to_string()),
        "ndash" => return Some("\u{2013}".to_string()),
        "hellip" => return Some("\u{2026}".to_string()),
        "lsquo" => return Some("\u{2018}".to_string()),
        "rsquo" => return Some("\u{2019}".to_string()),
        "ldquo" => return Some("\u{201c}".to_string()),
        "rdquo" => return Some("\u{201d}".to_string()),
        "copy" => return Some("\u{a9}".to_string()),
        _ => {}
    }

    if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        if let Ok(code) = u32::from_str_radix(hex, 16) {
            return char::from_u32(code).map(|c| c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#') {
        if let Ok(code) = dec.parse::<u32>() {
            return char::from_u32(code).map(|c| c.to_string());
        }
    }

    None
}
