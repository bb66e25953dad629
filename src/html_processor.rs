/*!
 * HTML document handling and translation-unit extraction.
 *
 * This module owns the document model used by the translation pipeline:
 * a lenient, arena-indexed tree of elements and text nodes that preserves
 * the input bytes of everything it does not rewrite. Entities are never
 * decoded; text nodes and attribute values hold the raw source text, so
 * regions the pipeline leaves alone serialize back byte-identically.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Tags whose descendants are never translated.
pub const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "code", "pre", "kbd", "samp", "var", "svg", "math",
];

/// Attributes whose values are translatable.
pub const TRANSLATABLE_ATTRS: &[&str] = &["alt", "title", "aria-label"];

/// Elements with no closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is raw text up to the matching close tag.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

static LEADING_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+").unwrap());
static TRAILING_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+$").unwrap());
static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").unwrap());
/// Known prompt-leakage artifact occasionally emitted by the model.
static PLACEHOLDER_ARTIFACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\$\$\s*i\s*\$\$").unwrap());

fn tag_in(list: &[&str], tag: &str) -> bool {
    list.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

fn is_anchor(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("a")
}

/// Index of a node in the document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Quote style an attribute value was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrQuote {
    Double,
    Single,
    Unquoted,
}

/// One attribute on an element; `value` is the raw source text between the
/// quotes (or `None` for boolean attributes).
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
    pub quote: AttrQuote,
}

#[derive(Debug, Clone)]
pub enum NodeData {
    /// Synthetic document root.
    Root,
    Element {
        tag: String,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    /// Raw text run, entities undecoded.
    Text(String),
    /// Comment body without the `<!--`/`-->` delimiters.
    Comment(String),
    /// Doctype, CDATA or processing instruction, stored verbatim.
    Raw(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Where a translated string is written back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBack {
    /// Replace the content of a text node.
    Text(NodeId),
    /// Replace the value of the n-th attribute of an element.
    Attr(NodeId, usize),
}

/// One atomic piece of translatable content in document order.
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    /// Position in the global ordered unit list; stable for batch addressing.
    pub index: usize,
    pub write_back: WriteBack,
    /// Whitespace split off the front of the raw value.
    pub leading: String,
    /// Whitespace split off the back of the raw value.
    pub trailing: String,
    /// Trimmed content with embedded CR/LF collapsed to spaces.
    pub core: String,
}

/// An ordered tree of HTML nodes backed by an arena.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    nodes: Vec<Node>,
}

/// Split leading and trailing whitespace off a raw string.
pub fn split_edge_whitespace(raw: &str) -> (&str, &str, &str) {
    let lead_end = LEADING_WS.find(raw).map(|m| m.end()).unwrap_or(0);
    let trail_start = TRAILING_WS.find(raw).map(|m| m.start()).unwrap_or(raw.len());
    if lead_end >= trail_start {
        // Pure whitespace: treat everything as leading.
        return (raw, "", "");
    }
    (&raw[..lead_end], &raw[lead_end..trail_start], &raw[trail_start..])
}

/// Collapse embedded line breaks so one unit occupies one request line.
pub fn normalize_for_request(core: &str) -> String {
    core.replace(['\r', '\n'], " ")
}

impl HtmlDocument {
    const ROOT: NodeId = NodeId(0);

    /// Parse markup text into a document tree.
    ///
    /// The parser is deliberately lenient: stray `<` characters become text,
    /// unmatched close tags are dropped, and anything left open at the end of
    /// input is implicitly closed.
    pub fn parse(html: &str) -> Self {
        let mut doc = Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Root,
            }],
        };
        let bytes = html.as_bytes();
        let len = bytes.len();
        let mut stack: Vec<NodeId> = vec![Self::ROOT];
        let mut pos = 0usize;
        let mut text_start = 0usize;

        while pos < len {
            if bytes[pos] != b'<' || !is_markup_start(bytes, pos) {
                pos += 1;
                continue;
            }
            let parent = *stack.last().unwrap_or(&Self::ROOT);
            if pos > text_start {
                doc.append(parent, NodeData::Text(html[text_start..pos].to_string()));
            }

            if html[pos..].starts_with("<!--") {
                let body_start = pos + 4;
                match html[body_start..].find("-->") {
                    Some(rel) => {
                        doc.append(
                            parent,
                            NodeData::Comment(html[body_start..body_start + rel].to_string()),
                        );
                        pos = body_start + rel + 3;
                    }
                    None => {
                        doc.append(parent, NodeData::Comment(html[body_start..].to_string()));
                        pos = len;
                    }
                }
            } else if bytes[pos + 1] == b'!' || bytes[pos + 1] == b'?' {
                // Doctype, CDATA or processing instruction: keep verbatim.
                let end = html[pos..].find('>').map(|rel| pos + rel + 1).unwrap_or(len);
                doc.append(parent, NodeData::Raw(html[pos..end].to_string()));
                pos = end;
            } else if bytes[pos + 1] == b'/' {
                let (tag, after) = read_tag_name(html, pos + 2);
                let end = html[after..].find('>').map(|rel| after + rel + 1).unwrap_or(len);
                pos = end;
                // Pop to the matching open element; ignore a close tag that
                // matches nothing.
                if let Some(depth) = stack
                    .iter()
                    .rposition(|id| doc.tag_of(*id).is_some_and(|t| t.eq_ignore_ascii_case(&tag)))
                {
                    stack.truncate(depth);
                }
            } else {
                let (tag, after) = read_tag_name(html, pos + 1);
                let (attrs, self_closing, after_attrs) = read_attributes(html, after);
                pos = after_attrs;
                let id = doc.append(
                    parent,
                    NodeData::Element {
                        tag: tag.clone(),
                        attrs,
                        self_closing,
                    },
                );
                if self_closing || tag_in(VOID_TAGS, &tag) {
                    // No content.
                } else if tag_in(RAW_TEXT_TAGS, &tag) {
                    let (content_end, resume) = find_raw_text_end(html, pos, &tag);
                    if content_end > pos {
                        doc.append(id, NodeData::Text(html[pos..content_end].to_string()));
                    }
                    pos = resume;
                } else {
                    stack.push(id);
                }
            }
            text_start = pos;
        }

        if text_start < len {
            let parent = *stack.last().unwrap_or(&Self::ROOT);
            doc.append(parent, NodeData::Text(html[text_start..].to_string()));
        }

        doc
    }

    fn append(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn tag_of(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Serialize the tree back to markup text.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for child in &self.nodes[Self::ROOT.0].children {
            self.serialize_node(*child, &mut out);
        }
        out
    }

    fn serialize_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].data {
            NodeData::Root => {}
            NodeData::Text(text) => out.push_str(text),
            NodeData::Comment(body) => {
                out.push_str("<!--");
                out.push_str(body);
                out.push_str("-->");
            }
            NodeData::Raw(raw) => out.push_str(raw),
            NodeData::Element {
                tag,
                attrs,
                self_closing,
            } => {
                out.push('<');
                out.push_str(tag);
                for attr in attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    if let Some(value) = &attr.value {
                        match attr.quote {
                            AttrQuote::Double => {
                                out.push_str("=\"");
                                out.push_str(value);
                                out.push('"');
                            }
                            AttrQuote::Single => {
                                out.push_str("='");
                                out.push_str(value);
                                out.push('\'');
                            }
                            AttrQuote::Unquoted => {
                                out.push('=');
                                out.push_str(value);
                            }
                        }
                    }
                }
                if *self_closing {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                if tag_in(VOID_TAGS, tag) {
                    return;
                }
                for child in &self.nodes[id.0].children {
                    self.serialize_node(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    /// Produce the ordered sequence of translation units.
    ///
    /// Text nodes and whitelisted attribute values qualify unless the ancestor
    /// chain contains a skip tag or an anchor; pure-whitespace candidates are
    /// dropped. The tree is not mutated.
    pub fn extract_units(&self) -> Vec<TranslationUnit> {
        let mut units = Vec::new();
        for child in &self.nodes[Self::ROOT.0].children {
            self.collect_units(*child, false, &mut units);
        }
        units
    }

    fn collect_units(&self, id: NodeId, ancestors_excluded: bool, units: &mut Vec<TranslationUnit>) {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => {
                if ancestors_excluded {
                    return;
                }
                let (leading, core, trailing) = split_edge_whitespace(text);
                if core.is_empty() {
                    return;
                }
                units.push(TranslationUnit {
                    index: units.len(),
                    write_back: WriteBack::Text(id),
                    leading: leading.to_string(),
                    trailing: trailing.to_string(),
                    core: normalize_for_request(core),
                });
            }
            NodeData::Element { tag, attrs, .. } => {
                if !ancestors_excluded {
                    for (attr_idx, attr) in attrs.iter().enumerate() {
                        if !tag_in(TRANSLATABLE_ATTRS, &attr.name) {
                            continue;
                        }
                        let Some(raw) = &attr.value else { continue };
                        let (leading, core, trailing) = split_edge_whitespace(raw);
                        if core.is_empty() {
                            continue;
                        }
                        units.push(TranslationUnit {
                            index: units.len(),
                            write_back: WriteBack::Attr(id, attr_idx),
                            leading: leading.to_string(),
                            trailing: trailing.to_string(),
                            core: normalize_for_request(core),
                        });
                    }
                }
                let child_excluded =
                    ancestors_excluded || tag_in(SKIP_TAGS, tag) || is_anchor(tag);
                for child in &self.nodes[id.0].children {
                    self.collect_units(*child, child_excluded, units);
                }
            }
            _ => {}
        }
    }

    /// Collect the raw text of every translatable text node, using the same
    /// skip-tag and anchor exclusions as extraction but ignoring attributes.
    /// Used by the language coverage gate.
    pub fn translatable_text(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for child in &self.nodes[Self::ROOT.0].children {
            self.collect_text(*child, false, &mut out);
        }
        out
    }

    fn collect_text<'a>(&'a self, id: NodeId, excluded: bool, out: &mut Vec<&'a str>) {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => {
                if !excluded {
                    out.push(text);
                }
            }
            NodeData::Element { tag, .. } => {
                let child_excluded = excluded || tag_in(SKIP_TAGS, tag) || is_anchor(tag);
                for child in &self.nodes[id.0].children {
                    self.collect_text(*child, child_excluded, out);
                }
            }
            _ => {}
        }
    }

    /// Write translated outputs back into the tree.
    ///
    /// `outputs[i]` corresponds to `units[i]`; each slot is written exactly
    /// once as `leading + output + trailing`. Remaining line breaks are
    /// collapsed to a single space and the known placeholder artifact is
    /// stripped. Nothing outside the unit write-back slots is touched.
    pub fn apply_translations(&mut self, units: &[TranslationUnit], outputs: &[String]) {
        for (unit, output) in units.iter().zip(outputs) {
            let mut line = if output.contains('\n') || output.contains('\r') {
                LINE_BREAKS.replace_all(output, " ").into_owned()
            } else {
                output.clone()
            };
            line = PLACEHOLDER_ARTIFACT.replace_all(&line, "").into_owned();
            let full = format!("{}{}{}", unit.leading, line, unit.trailing);
            match unit.write_back {
                WriteBack::Text(id) => {
                    if let NodeData::Text(text) = &mut self.nodes[id.0].data {
                        *text = full;
                    }
                }
                WriteBack::Attr(id, attr_idx) => {
                    if let NodeData::Element { attrs, .. } = &mut self.nodes[id.0].data {
                        if let Some(attr) = attrs.get_mut(attr_idx) {
                            set_attr_value(attr, full);
                        }
                    }
                }
            }
        }
    }
}

/// Store a rewritten attribute value, escaping whatever would terminate the
/// original quoting early.
fn set_attr_value(attr: &mut Attribute, value: String) {
    match attr.quote {
        AttrQuote::Double => attr.value = Some(value.replace('"', "&quot;")),
        AttrQuote::Single => attr.value = Some(value.replace('\'', "&#39;")),
        AttrQuote::Unquoted => {
            let needs_quotes = value.is_empty()
                || value
                    .chars()
                    .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '=' | '`'));
            if needs_quotes {
                attr.quote = AttrQuote::Double;
                attr.value = Some(value.replace('"', "&quot;"));
            } else {
                attr.value = Some(value);
            }
        }
    }
}

/// A `<` only opens markup when followed by `!`, `?`, `/` or a letter.
fn is_markup_start(bytes: &[u8], pos: usize) -> bool {
    match bytes.get(pos + 1) {
        Some(b'!') | Some(b'?') | Some(b'/') => true,
        Some(b) => b.is_ascii_alphabetic(),
        None => false,
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

/// Read a tag name starting at `pos`; returns (name, position after name).
fn read_tag_name(html: &str, pos: usize) -> (String, usize) {
    let bytes = html.as_bytes();
    let mut end = pos;
    while end < bytes.len() && is_name_byte(bytes[end]) {
        end += 1;
    }
    (html[pos..end].to_string(), end)
}

/// Read the attribute list of an open tag; returns (attrs, self_closing,
/// position just past the closing `>`).
fn read_attributes(html: &str, mut pos: usize) -> (Vec<Attribute>, bool, usize) {
    let bytes = html.as_bytes();
    let len = bytes.len();
    let mut attrs = Vec::new();
    let mut self_closing = false;

    loop {
        while pos < len && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= len {
            break;
        }
        match bytes[pos] {
            b'>' => {
                pos += 1;
                break;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'>') => {
                self_closing = true;
                pos += 2;
                break;
            }
            b'/' => {
                pos += 1;
            }
            _ => {
                let name_start = pos;
                while pos < len && !bytes[pos].is_ascii_whitespace() && !matches!(bytes[pos], b'=' | b'>' | b'/') {
                    pos += 1;
                }
                if pos == name_start {
                    pos += 1;
                    continue;
                }
                let name = html[name_start..pos].to_string();
                while pos < len && bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
                if pos < len && bytes[pos] == b'=' {
                    pos += 1;
                    while pos < len && bytes[pos].is_ascii_whitespace() {
                        pos += 1;
                    }
                    let (value, quote, next) = read_attr_value(html, pos);
                    attrs.push(Attribute {
                        name,
                        value: Some(value),
                        quote,
                    });
                    pos = next;
                } else {
                    attrs.push(Attribute {
                        name,
                        value: None,
                        quote: AttrQuote::Unquoted,
                    });
                }
            }
        }
    }

    (attrs, self_closing, pos)
}

fn read_attr_value(html: &str, pos: usize) -> (String, AttrQuote, usize) {
    let bytes = html.as_bytes();
    let len = bytes.len();
    if pos >= len {
        return (String::new(), AttrQuote::Unquoted, pos);
    }
    match bytes[pos] {
        quote @ (b'"' | b'\'') => {
            let start = pos + 1;
            let mut end = start;
            while end < len && bytes[end] != quote {
                end += 1;
            }
            let style = if quote == b'"' {
                AttrQuote::Double
            } else {
                AttrQuote::Single
            };
            let next = if end < len { end + 1 } else { end };
            (html[start..end].to_string(), style, next)
        }
        _ => {
            let start = pos;
            let mut end = pos;
            while end < len && !bytes[end].is_ascii_whitespace() && bytes[end] != b'>' {
                end += 1;
            }
            (html[start..end].to_string(), AttrQuote::Unquoted, end)
        }
    }
}

/// Scan raw-text element content for the matching close tag.
/// Returns (end of content, position past the close tag).
fn find_raw_text_end(html: &str, pos: usize, tag: &str) -> (usize, usize) {
    let bytes = html.as_bytes();
    let len = bytes.len();
    let tag_bytes = tag.as_bytes();
    let mut i = pos;
    while i + 1 < len {
        if bytes[i] == b'<' && bytes[i + 1] == b'/' {
            let name_start = i + 2;
            let matches_tag = name_start + tag_bytes.len() <= len
                && bytes[name_start..name_start + tag_bytes.len()]
                    .iter()
                    .zip(tag_bytes)
                    .all(|(a, b)| a.eq_ignore_ascii_case(b))
                && bytes
                    .get(name_start + tag_bytes.len())
                    .is_none_or(|b| !is_name_byte(*b));
            if matches_tag {
                let close_end = html[i..].find('>').map(|rel| i + rel + 1).unwrap_or(len);
                return (i, close_end);
            }
        }
        i += 1;
    }
    (len, len)
}
