//! Tolerant HTML document parsing and element access.
//!
//! Ticketing pages are rarely well formed, so the parser never fails: it
//! recovers from unclosed tags, stray closers, and truncated markup, and it
//! only models what the resolution engine needs (tags, attributes, text).

use crate::selector::Selector;

/// Elements that never have children.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text, not markup.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    children: Vec<usize>,
}

/// Parsed HTML document held as a node arena.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    roots: Vec<usize>,
}

/// Handle to a single element within a document.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    doc: &'a Document,
    index: usize,
}

impl Document {
    /// Parse HTML markup. Never fails; malformed input degrades to text.
    pub fn parse(html: &str) -> Self {
        Parser::new(html).run()
    }

    /// First element matching the selector, in document order.
    pub fn query_first(&self, selector: &Selector) -> Option<Element<'_>> {
        self.walk()
            .find(|element| selector.matches(element))
    }

    /// Text of the first `<title>` element, if any.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        let title = self.query_first(&selector)?.text();
        if title.is_empty() { None } else { Some(title) }
    }

    /// Preorder walk over all elements.
    fn walk(&self) -> DocumentWalk<'_> {
        let mut pending: Vec<usize> = self.roots.iter().rev().copied().collect();
        pending.retain(|index| matches!(self.nodes[*index].data, NodeData::Element { .. }));
        DocumentWalk { doc: self, pending }
    }

    /// Collect normalized descendant text for a subtree.
    fn collect_text(&self, index: usize, out: &mut String) {
        let node = &self.nodes[index];
        if let NodeData::Text(text) = &node.data {
            out.push_str(text);
            out.push(' ');
        }
        for child in &node.children {
            self.collect_text(*child, out);
        }
    }
}

struct DocumentWalk<'a> {
    doc: &'a Document,
    pending: Vec<usize>,
}

impl<'a> Iterator for DocumentWalk<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let index = self.pending.pop()?;
            let node = &self.doc.nodes[index];
            for child in node.children.iter().rev() {
                if matches!(self.doc.nodes[*child].data, NodeData::Element { .. }) {
                    self.pending.push(*child);
                }
            }
            if matches!(node.data, NodeData::Element { .. }) {
                return Some(Element {
                    doc: self.doc,
                    index,
                });
            }
        }
    }
}

impl<'a> Element<'a> {
    /// Lowercase tag name.
    pub fn tag(&self) -> &'a str {
        match &self.doc.nodes[self.index].data {
            NodeData::Element { tag, .. } => tag,
            NodeData::Text(_) => "",
        }
    }

    /// Attribute value by lowercase name.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        match &self.doc.nodes[self.index].data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(attr, _)| attr == name)
                .map(|(_, value)| value.as_str()),
            NodeData::Text(_) => None,
        }
    }

    /// Whitespace-normalized descendant text.
    pub fn text(&self) -> String {
        let mut raw = String::new();
        self.doc.collect_text(self.index, &mut raw);
        normalize_ws(&raw)
    }

    /// Form value for input-like elements.
    pub fn form_value(&self) -> Option<String> {
        match self.tag() {
            "input" | "option" | "select" => self.attr("value").map(str::to_string),
            "textarea" => Some(self.text()),
            _ => None,
        }
    }
}

/// Collapse whitespace runs and trim, like rendered text content.
fn normalize_ws(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct Parser<'a> {
    html: &'a str,
    pos: usize,
    nodes: Vec<Node>,
    roots: Vec<usize>,
    stack: Vec<usize>,
}

impl<'a> Parser<'a> {
    fn new(html: &'a str) -> Self {
        Self {
            html,
            pos: 0,
            nodes: Vec::new(),
            roots: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn run(mut self) -> Document {
        while self.pos < self.html.len() {
            let rest = &self.html[self.pos..];
            if let Some(stripped) = rest.strip_prefix("<!--") {
                self.pos += 4 + stripped.find("-->").map_or(stripped.len(), |i| i + 3);
            } else if rest.starts_with("</") {
                self.close_tag();
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_past_gt();
            } else if rest.starts_with('<') && starts_tag_name(&rest[1..]) {
                self.open_tag();
            } else {
                self.text_run();
            }
        }
        Document {
            nodes: self.nodes,
            roots: self.roots,
        }
    }

    /// Attach a node under the innermost open element, or as a root.
    fn attach(&mut self, node: Node) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        match self.stack.last() {
            Some(parent) => self.nodes[*parent].children.push(index),
            None => self.roots.push(index),
        }
        index
    }

    fn skip_past_gt(&mut self) {
        match self.html[self.pos..].find('>') {
            Some(offset) => self.pos += offset + 1,
            None => self.pos = self.html.len(),
        }
    }

    fn text_run(&mut self) {
        let rest = &self.html[self.pos..];
        // A lone '<' that opens nothing is treated as literal text.
        let end = rest[1..].find('<').map_or(rest.len(), |i| i + 1);
        let text = decode_entities(&rest[..end]);
        self.attach(Node {
            data: NodeData::Text(text),
            children: Vec::new(),
        });
        self.pos += end;
    }

    fn close_tag(&mut self) {
        let rest = &self.html[self.pos + 2..];
        let end = rest.find('>').unwrap_or(rest.len());
        let name = rest[..end].trim().to_ascii_lowercase();
        if let Some(open) = self.stack.iter().rposition(|index| {
            matches!(&self.nodes[*index].data, NodeData::Element { tag, .. } if *tag == name)
        }) {
            self.stack.truncate(open);
        }
        self.pos += 2 + end + if end < rest.len() { 1 } else { 0 };
    }

    fn open_tag(&mut self) {
        let (tag, attrs, self_closing) = self.parse_open_tag();
        let index = self.attach(Node {
            data: NodeData::Element {
                tag: tag.clone(),
                attrs,
            },
            children: Vec::new(),
        });
        if RAW_TEXT_TAGS.contains(&tag.as_str()) {
            self.skip_raw_text(&tag);
            return;
        }
        if !self_closing && !VOID_TAGS.contains(&tag.as_str()) {
            self.stack.push(index);
        }
    }

    /// Parse `<tag attr=value ...>` starting at the current `<`.
    fn parse_open_tag(&mut self) -> (String, Vec<(String, String)>, bool) {
        let bytes = self.html.as_bytes();
        let mut cursor = self.pos + 1;
        let name_start = cursor;
        while cursor < bytes.len() && is_name_byte(bytes[cursor]) {
            cursor += 1;
        }
        let tag = self.html[name_start..cursor].to_ascii_lowercase();
        let mut attrs = Vec::new();
        let mut self_closing = false;

        loop {
            while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
                cursor += 1;
            }
            if cursor >= bytes.len() {
                break;
            }
            match bytes[cursor] {
                b'>' => {
                    cursor += 1;
                    break;
                }
                b'/' => {
                    self_closing = true;
                    cursor += 1;
                }
                _ => {
                    let attr_start = cursor;
                    while cursor < bytes.len()
                        && !bytes[cursor].is_ascii_whitespace()
                        && !matches!(bytes[cursor], b'=' | b'>' | b'/')
                    {
                        cursor += 1;
                    }
                    let name = self.html[attr_start..cursor].to_ascii_lowercase();
                    while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
                        cursor += 1;
                    }
                    let mut value = String::new();
                    if cursor < bytes.len() && bytes[cursor] == b'=' {
                        cursor += 1;
                        while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
                            cursor += 1;
                        }
                        if cursor < bytes.len() && matches!(bytes[cursor], b'"' | b'\'') {
                            let quote = bytes[cursor];
                            cursor += 1;
                            let value_start = cursor;
                            while cursor < bytes.len() && bytes[cursor] != quote {
                                cursor += 1;
                            }
                            value = decode_entities(&self.html[value_start..cursor]);
                            if cursor < bytes.len() {
                                cursor += 1;
                            }
                        } else {
                            let value_start = cursor;
                            while cursor < bytes.len()
                                && !bytes[cursor].is_ascii_whitespace()
                                && bytes[cursor] != b'>'
                            {
                                cursor += 1;
                            }
                            value = decode_entities(&self.html[value_start..cursor]);
                        }
                    }
                    if !name.is_empty() {
                        attrs.push((name, value));
                    }
                }
            }
        }
        self.pos = cursor;
        (tag, attrs, self_closing)
    }

    /// Consume raw content up to the matching close tag, discarding it.
    fn skip_raw_text(&mut self, tag: &str) {
        let close = format!("</{tag}");
        let lower = self.html[self.pos..].to_ascii_lowercase();
        match lower.find(&close) {
            Some(offset) => {
                self.pos += offset;
                self.skip_past_gt();
            }
            None => self.pos = self.html.len(),
        }
    }
}

fn starts_tag_name(rest: &str) -> bool {
    rest.bytes().next().is_some_and(|b| b.is_ascii_alphabetic())
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b':'
}

/// Decode the handful of entities that show up in scraped values.
fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        let Some(end) = rest.find(';') else {
            out.push_str(rest);
            return out;
        };
        let entity = &rest[1..end];
        match decode_entity(entity) {
            Some(decoded) => out.push_str(&decoded),
            None => out.push_str(&rest[..end + 1]),
        }
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<String> {
    let decoded = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        _ => {
            let code = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X"));
            let value = match code {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => entity.strip_prefix('#')?.parse().ok()?,
            };
            return char::from_u32(value).map(String::from);
        }
    };
    Some(decoded.to_string())
}

#[cfg(test)]
mod tests {
    use super::Document;
    use crate::selector::Selector;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_nested_markup_and_normalizes_text() {
        let doc = Document::parse("<div><h1>  Jazz\n  <em>Night</em>  </h1></div>");
        let h1 = doc
            .query_first(&Selector::parse("h1").expect("selector"))
            .expect("h1");
        assert_eq!(h1.text(), "Jazz Night");
    }

    #[test]
    fn recovers_from_unclosed_and_stray_tags() {
        let doc = Document::parse("<div><p>first</div></span><p>second");
        let p = doc
            .query_first(&Selector::parse("p").expect("selector"))
            .expect("p");
        assert_eq!(p.text(), "first");
    }

    #[test]
    fn reads_attributes_and_form_values() {
        let doc = Document::parse(r#"<input type="email" value="a@b.example">"#);
        let input = doc
            .query_first(&Selector::parse("input").expect("selector"))
            .expect("input");
        assert_eq!(input.attr("type"), Some("email"));
        assert_eq!(input.form_value().as_deref(), Some("a@b.example"));
    }

    #[test]
    fn skips_comments_and_script_content() {
        let doc = Document::parse("<!-- <h1>no</h1> --><script>let x = \"<h1>no</h1>\";</script><h1>yes</h1>");
        let h1 = doc
            .query_first(&Selector::parse("h1").expect("selector"))
            .expect("h1");
        assert_eq!(h1.text(), "yes");
    }

    #[test]
    fn decodes_entities_in_text_and_attributes() {
        let doc = Document::parse(r#"<p data-note="a &amp; b">Caf&#233; &lt;3</p>"#);
        let p = doc
            .query_first(&Selector::parse("p").expect("selector"))
            .expect("p");
        assert_eq!(p.attr("data-note"), Some("a & b"));
        assert_eq!(p.text(), "Café <3");
    }

    #[test]
    fn title_returns_first_title_text() {
        let doc = Document::parse("<head><title> Concert Hall </title></head>");
        assert_eq!(doc.title().as_deref(), Some("Concert Hall"));
        assert_eq!(Document::parse("<p>no title</p>").title(), None);
    }
}
