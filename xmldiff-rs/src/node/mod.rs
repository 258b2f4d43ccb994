//! Document tree built by the parser and consumed by the printer.
//!
//! The tree is deliberately plain: it only has to carry a document from the
//! parser to the printer, so names stay as raw qualified names and attributes
//! keep the order they had in the source.

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The `standalone` pseudo-attribute of the XML declaration, if present.
    pub standalone: Option<bool>,
    /// Raw DOCTYPE content (everything between `<!DOCTYPE ` and `>`).
    pub doctype: Option<String>,
    /// Comments and processing instructions before the root element.
    pub prolog: Vec<Node>,
    /// The document element.
    pub root: Element,
    /// Comments and processing instructions after the root element.
    pub epilog: Vec<Node>,
}

impl Document {
    /// Creates a document with only a root element.
    pub fn new(root: Element) -> Self {
        Document {
            standalone: None,
            doctype: None,
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }
}

/// A child of an element, or a misc node outside the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A nested element.
    Element(Element),
    /// Character data with entities resolved and CDATA sections merged in.
    Text(String),
    /// A comment body.
    Comment(String),
    /// A processing instruction body (target and data).
    ProcessingInstruction(String),
}

impl Node {
    /// Returns true for nodes that carry character data.
    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    /// Returns a reference to the element, if this is an element node.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the character data, if this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// A single attribute, stored with its unescaped value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// An XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    qname: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an element with no attributes and no children.
    pub fn new(qname: impl Into<String>) -> Self {
        Element {
            qname: qname.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns the qualified name, prefix included.
    pub fn qname(&self) -> &str {
        &self.qname
    }

    /// Returns the attributes in document order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Looks up an attribute value by qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Appends an attribute.
    pub fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push(Attribute {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Returns the child nodes.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Appends a child node.
    pub fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Returns true if the element has no children at all.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns true if any direct child is character data.
    ///
    /// Such elements are printed inline, since indenting inside them would
    /// change their text content.
    pub fn has_text(&self) -> bool {
        self.children.iter().any(Node::is_text)
    }

    /// Returns the `xml:space` setting declared on this element, if any.
    pub fn xml_space(&self) -> Option<XmlSpace> {
        match self.attribute("xml:space")? {
            "preserve" => Some(XmlSpace::Preserve),
            "default" => Some(XmlSpace::Default),
            _ => None,
        }
    }
}

/// Values of the `xml:space` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlSpace {
    Default,
    Preserve,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup_keeps_order() {
        let mut e = Element::new("item");
        e.add_attribute("b", "2");
        e.add_attribute("a", "1");

        let names: Vec<&str> = e.attributes().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(e.attribute("a"), Some("1"));
        assert_eq!(e.attribute("c"), None);
    }

    #[test]
    fn test_has_text() {
        let mut e = Element::new("p");
        e.push_child(Node::Element(Element::new("b")));
        assert!(!e.has_text());

        e.push_child(Node::Text("x < y".to_string()));
        assert!(e.has_text());
    }

    #[test]
    fn test_xml_space() {
        let mut e = Element::new("pre");
        assert_eq!(e.xml_space(), None);
        e.add_attribute("xml:space", "preserve");
        assert_eq!(e.xml_space(), Some(XmlSpace::Preserve));
    }
}
