//! XML parser that builds document trees.
//!
//! This parser uses quick-xml's streaming API and enforces the
//! well-formedness rules quick-xml leaves to the caller (a single root,
//! no unclosed elements at end of input, no text outside the root).
//!
//! Line endings are folded to `\n` and literal whitespace in attribute
//! values becomes a space, as an XML processor is required to do. General
//! entities declared in the internal DTD subset are expanded; their
//! replacement text may not contain markup.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::node::{Document, Element, Node, XmlSpace};

/// Nesting limit for entities whose replacement text refers to other entities.
const MAX_ENTITY_DEPTH: usize = 16;

/// Upper bound, in bytes, on the expansion of a single reference.
const MAX_ENTITY_EXPANSION: usize = 1 << 20;

/// Options controlling how text is kept while parsing.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Drop text nodes that consist only of whitespace, except inside
    /// elements scoped by `xml:space="preserve"`.
    pub remove_blank_text: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            remove_blank_text: true,
        }
    }
}

/// XML parser that builds document trees.
#[derive(Debug, Clone, Default)]
pub struct XmlParser {
    options: ParseOptions,
}

impl XmlParser {
    /// Creates a parser with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser with the given options.
    pub fn with_options(options: ParseOptions) -> Self {
        XmlParser { options }
    }

    /// Parses XML from a string.
    pub fn parse_str(&self, xml: &str) -> Result<Document> {
        self.parse_reader(xml.as_bytes())
    }

    /// Parses XML from a buffered byte stream.
    ///
    /// The input may be in any ASCII-compatible encoding named by its XML
    /// declaration. UTF-16 input is rejected.
    pub fn parse_reader<R: BufRead>(&self, mut input: R) -> Result<Document> {
        let head = input.fill_buf()?;
        if head.starts_with(&[0xFF, 0xFE]) || head.starts_with(&[0xFE, 0xFF]) {
            return Err(Error::parse(0, "UTF-16 input is not supported"));
        }

        let mut reader = Reader::from_reader(input);
        // Whitespace is decided per text node, after entities are resolved
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        reader.config_mut().check_end_names = true;

        let mut builder = TreeBuilder::new(self.options);
        let mut entities = Entities::default();
        let mut buf = Vec::new();

        loop {
            let position = reader.buffer_position();
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    builder.flush_text(position)?;
                    let element = parse_element(e, &reader, &entities)?;
                    builder.open(element, position)?;
                }
                Ok(Event::Empty(ref e)) => {
                    builder.flush_text(position)?;
                    let element = parse_element(e, &reader, &entities)?;
                    builder.open(element, position)?;
                    builder.close(position)?;
                }
                Ok(Event::End(_)) => {
                    builder.flush_text(position)?;
                    builder.close(position)?;
                }
                Ok(Event::Text(e)) => {
                    let text = e.decode().map_err(|e| Error::parse(position, e.to_string()))?;
                    builder.push_char_data(&text);
                }
                Ok(Event::CData(e)) => {
                    // CDATA is ordinary character data once parsed
                    let text = reader
                        .decoder()
                        .decode(&e)
                        .map_err(|e| Error::parse(position, e.to_string()))?;
                    builder.push_char_data(&text);
                }
                Ok(Event::GeneralRef(e)) => {
                    let name = e.decode().map_err(|e| Error::parse(position, e.to_string()))?;
                    let resolved = entities
                        .resolve(&name)
                        .map_err(|message| Error::parse(position, message))?;
                    builder.push_text(&resolved);
                }
                Ok(Event::Comment(e)) => {
                    builder.flush_text(position)?;
                    let text = e.decode().map_err(|e| Error::parse(position, e.to_string()))?;
                    let text = normalize_line_endings(&text).into_owned();
                    builder.push_misc(Node::Comment(text));
                }
                Ok(Event::PI(e)) => {
                    builder.flush_text(position)?;
                    let text = reader
                        .decoder()
                        .decode(&e)
                        .map_err(|e| Error::parse(position, e.to_string()))?;
                    let text = normalize_line_endings(&text).into_owned();
                    builder.push_misc(Node::ProcessingInstruction(text));
                }
                Ok(Event::Decl(e)) => {
                    if let Some(standalone) = e.standalone() {
                        let value = standalone.map_err(|e| Error::parse(position, e.to_string()))?;
                        builder.standalone = Some(&*value == b"yes");
                    }
                }
                Ok(Event::DocType(e)) => {
                    let text = e.decode().map_err(|e| Error::parse(position, e.to_string()))?;
                    let text = normalize_line_endings(text.trim()).into_owned();
                    entities = Entities::from_doctype(&text);
                    builder.doctype = Some(text);
                }
                Ok(Event::Eof) => {
                    builder.flush_text(position)?;
                    return builder.finish(position);
                }
                Err(e) => return Err(Error::parse(reader.error_position(), e.to_string())),
            }
            buf.clear();
        }
    }
}

/// Parses an element's name and attributes.
fn parse_element<R>(e: &BytesStart, reader: &Reader<R>, entities: &Entities) -> Result<Element> {
    let position = reader.buffer_position();
    let decoder = reader.decoder();
    let qname = e.name();
    let name = decoder
        .decode(qname.as_ref())
        .map_err(|e| Error::parse(position, e.to_string()))?;

    let mut element = Element::new(name);
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(quick_xml::Error::from)?;
        let key = decoder
            .decode(attr.key.as_ref())
            .map_err(|e| Error::parse(position, e.to_string()))?;
        let raw = decoder
            .decode(&attr.value)
            .map_err(|e| Error::parse(position, e.to_string()))?;
        let value = entities
            .expand(&normalize_attribute_whitespace(&raw), 0)
            .map_err(|message| Error::parse(position, message))?;
        element.add_attribute(key, value);
    }

    Ok(element)
}

/// Folds `\r\n` and lone `\r` into `\n`.
fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Replaces each literal line ending or tab in a raw attribute value with a
/// space. Character references are expanded afterwards and stay intact.
fn normalize_attribute_whitespace(raw: &str) -> String {
    normalize_line_endings(raw).replace(['\n', '\t'], " ")
}

/// Parses the digits of a character reference (`#65` or `#x41`).
fn char_reference(code: &str) -> Option<char> {
    let code = match code.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => code.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}

fn is_blank(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

/// General entities in scope for a document.
#[derive(Debug, Default)]
struct Entities {
    /// Literal values from `<!ENTITY name "value">` declarations.
    declared: HashMap<String, String>,
}

impl Entities {
    /// Collects internal general entity declarations from DOCTYPE text.
    ///
    /// Parameter entities and external entities are skipped.
    fn from_doctype(doctype: &str) -> Self {
        const DECLARATION: &str = "<!ENTITY";

        let mut declared = HashMap::new();
        let mut rest = doctype;
        while let Some(start) = rest.find(DECLARATION) {
            rest = rest[start + DECLARATION.len()..].trim_start();
            if rest.starts_with('%') {
                continue;
            }
            let name_end = rest
                .find(|c: char| c.is_whitespace())
                .unwrap_or(rest.len());
            let name = &rest[..name_end];
            rest = rest[name_end..].trim_start();

            let Some(quote) = rest.chars().next().filter(|c| matches!(*c, '"' | '\'')) else {
                continue;
            };
            let body = &rest[1..];
            let Some(end) = body.find(quote) else {
                break;
            };
            // The first declaration of a name is binding
            declared
                .entry(name.to_string())
                .or_insert_with(|| body[..end].to_string());
            rest = &body[end + 1..];
        }

        Entities { declared }
    }

    /// Replacement text for the reference `&name;`.
    fn resolve(&self, name: &str) -> std::result::Result<String, String> {
        self.resolve_at(name, 0)
    }

    fn resolve_at(&self, name: &str, depth: usize) -> std::result::Result<String, String> {
        if let Some(resolved) = resolve_xml_entity(name) {
            return Ok(resolved.to_string());
        }
        if let Some(code) = name.strip_prefix('#') {
            return char_reference(code)
                .map(String::from)
                .ok_or_else(|| format!("invalid character reference &{name};"));
        }

        let value = self
            .declared
            .get(name)
            .ok_or_else(|| format!("undefined entity &{name};"))?;
        if value.contains('<') {
            return Err(format!("entity &{name}; contains markup"));
        }
        if depth >= MAX_ENTITY_DEPTH {
            return Err(format!("entity &{name}; is nested too deeply"));
        }
        self.expand(value, depth + 1)
    }

    /// Replaces every reference in `text` with its replacement text.
    fn expand(&self, text: &str, depth: usize) -> std::result::Result<String, String> {
        let mut expanded = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find('&') {
            expanded.push_str(&rest[..start]);
            let reference = &rest[start + 1..];
            let end = reference
                .find(';')
                .ok_or_else(|| "unterminated entity reference".to_string())?;
            expanded.push_str(&self.resolve_at(&reference[..end], depth)?);
            if expanded.len() > MAX_ENTITY_EXPANSION {
                return Err("entity expansion is too large".to_string());
            }
            rest = &reference[end + 1..];
        }
        expanded.push_str(rest);
        Ok(expanded)
    }
}

/// Incremental tree construction state.
struct TreeBuilder {
    options: ParseOptions,
    standalone: Option<bool>,
    doctype: Option<String>,
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
    /// Open elements with their effective `xml:space="preserve"` flag.
    stack: Vec<(Element, bool)>,
    /// Character data not yet attached to a node.
    pending_text: String,
}

impl TreeBuilder {
    fn new(options: ParseOptions) -> Self {
        TreeBuilder {
            options,
            standalone: None,
            doctype: None,
            prolog: Vec::new(),
            root: None,
            epilog: Vec::new(),
            stack: Vec::new(),
            pending_text: String::new(),
        }
    }

    /// Adds literal character data from the source.
    fn push_char_data(&mut self, text: &str) {
        self.pending_text.push_str(&normalize_line_endings(text));
    }

    /// Adds already-resolved text, such as an expanded reference.
    fn push_text(&mut self, text: &str) {
        self.pending_text.push_str(text);
    }

    /// Attaches accumulated text to the current element.
    fn flush_text(&mut self, position: u64) -> Result<()> {
        if self.pending_text.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.pending_text);

        match self.stack.last_mut() {
            Some((parent, preserve)) => {
                if self.options.remove_blank_text && !*preserve && is_blank(&text) {
                    return Ok(());
                }
                parent.push_child(Node::Text(text));
                Ok(())
            }
            None if is_blank(&text) => Ok(()),
            None => Err(Error::parse(position, "text outside the root element")),
        }
    }

    fn push_misc(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some((parent, _)) => parent.push_child(node),
            None if self.root.is_none() => self.prolog.push(node),
            None => self.epilog.push(node),
        }
    }

    fn open(&mut self, element: Element, position: u64) -> Result<()> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(Error::parse(
                position,
                format!("second root element <{}>", element.qname()),
            ));
        }
        let inherited = self.stack.last().is_some_and(|(_, preserve)| *preserve);
        let preserve = match element.xml_space() {
            Some(XmlSpace::Preserve) => true,
            Some(XmlSpace::Default) => false,
            None => inherited,
        };
        self.stack.push((element, preserve));
        Ok(())
    }

    fn close(&mut self, position: u64) -> Result<()> {
        let (element, _) = self
            .stack
            .pop()
            .ok_or_else(|| Error::parse(position, "end tag without a matching start tag"))?;
        match self.stack.last_mut() {
            Some((parent, _)) => parent.push_child(Node::Element(element)),
            None => self.root = Some(element),
        }
        Ok(())
    }

    fn finish(self, position: u64) -> Result<Document> {
        if let Some((open, _)) = self.stack.last() {
            return Err(Error::parse(
                position,
                format!("unclosed element <{}>", open.qname()),
            ));
        }
        let root = self
            .root
            .ok_or_else(|| Error::parse(position, "no root element"))?;

        Ok(Document {
            standalone: self.standalone,
            doctype: self.doctype,
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

/// Parses XML from a string with default options.
pub fn parse_str(xml: &str) -> Result<Document> {
    XmlParser::new().parse_str(xml)
}
