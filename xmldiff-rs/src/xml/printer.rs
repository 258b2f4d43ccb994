//! XML printer that outputs document trees.
//!
//! In pretty mode every element that holds only markup is broken over
//! lines with one indentation step per depth. Elements with character data
//! among their children are written inline, since adding whitespace inside
//! them would change their content.

use std::io::Write;

use crate::node::{Document, Element, Node};

/// Options for XML printing.
#[derive(Debug, Clone)]
pub struct XmlPrinterOptions {
    /// Whether to pretty-print with indentation.
    pub pretty_print: bool,
    /// Spaces per nesting level in pretty mode.
    pub indent_width: usize,
}

impl Default for XmlPrinterOptions {
    fn default() -> Self {
        XmlPrinterOptions {
            pretty_print: true,
            indent_width: 2,
        }
    }
}

/// XML printer that outputs document trees.
pub struct XmlPrinter<W: Write> {
    writer: W,
    options: XmlPrinterOptions,
}

impl<W: Write> XmlPrinter<W> {
    /// Creates a pretty-printing XML printer.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, XmlPrinterOptions::default())
    }

    /// Creates a new XML printer with the given options.
    pub fn with_options(writer: W, options: XmlPrinterOptions) -> Self {
        XmlPrinter { writer, options }
    }

    /// Prints a whole document, starting with the XML declaration.
    pub fn print(&mut self, doc: &Document) -> std::io::Result<()> {
        write!(self.writer, "<?xml version='1.0' encoding='UTF-8'")?;
        match doc.standalone {
            Some(true) => write!(self.writer, " standalone='yes'")?,
            Some(false) => write!(self.writer, " standalone='no'")?,
            None => {}
        }
        writeln!(self.writer, "?>")?;

        if let Some(doctype) = &doc.doctype {
            writeln!(self.writer, "<!DOCTYPE {}>", doctype)?;
        }
        for node in &doc.prolog {
            self.print_node(node, 0, true)?;
            self.end_line(true)?;
        }

        self.print_element(&doc.root, 0, self.options.pretty_print)?;
        self.end_line(true)?;

        for node in &doc.epilog {
            self.print_node(node, 0, true)?;
            self.end_line(true)?;
        }
        self.writer.flush()
    }

    fn print_node(&mut self, node: &Node, depth: usize, pretty: bool) -> std::io::Result<()> {
        match node {
            Node::Element(e) => self.print_element(e, depth, pretty),
            Node::Text(text) => write!(self.writer, "{}", escape_text(text)),
            Node::Comment(text) => {
                self.indent(depth, pretty)?;
                write!(self.writer, "<!--{}-->", text)
            }
            Node::ProcessingInstruction(text) => {
                self.indent(depth, pretty)?;
                write!(self.writer, "<?{}?>", text)
            }
        }
    }

    /// Prints an element without a trailing newline.
    fn print_element(&mut self, e: &Element, depth: usize, pretty: bool) -> std::io::Result<()> {
        self.indent(depth, pretty)?;
        write!(self.writer, "<{}", e.qname())?;
        for attr in e.attributes() {
            write!(self.writer, " {}=\"{}\"", attr.name, escape_attribute(&attr.value))?;
        }

        if e.is_empty() {
            return write!(self.writer, "/>");
        }
        write!(self.writer, ">")?;

        if pretty && !e.has_text() {
            for child in e.children() {
                self.end_line(true)?;
                self.print_node(child, depth + 1, true)?;
            }
            self.end_line(true)?;
            self.indent(depth, true)?;
        } else {
            for child in e.children() {
                self.print_node(child, 0, false)?;
            }
        }

        write!(self.writer, "</{}>", e.qname())
    }

    fn indent(&mut self, depth: usize, pretty: bool) -> std::io::Result<()> {
        if pretty && self.options.pretty_print {
            let width = depth * self.options.indent_width;
            write!(self.writer, "{:width$}", "")?;
        }
        Ok(())
    }

    fn end_line(&mut self, pretty: bool) -> std::io::Result<()> {
        if pretty && self.options.pretty_print {
            writeln!(self.writer)?;
        }
        Ok(())
    }
}

/// Escapes character data.
fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\r' => result.push_str("&#13;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escapes an attribute value for use inside double quotes.
fn escape_attribute(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\n' => result.push_str("&#10;"),
            '\r' => result.push_str("&#13;"),
            '\t' => result.push_str("&#9;"),
            _ => result.push(c),
        }
    }
    result
}

/// Prints a document to a string on a single line after the declaration.
pub fn print_to_string(doc: &Document) -> std::io::Result<String> {
    let options = XmlPrinterOptions {
        pretty_print: false,
        ..XmlPrinterOptions::default()
    };
    print_with(doc, options)
}

/// Prints a document to a string with pretty printing.
pub fn print_to_string_pretty(doc: &Document) -> std::io::Result<String> {
    print_with(doc, XmlPrinterOptions::default())
}

fn print_with(doc: &Document, options: XmlPrinterOptions) -> std::io::Result<String> {
    let mut output = Vec::new();
    XmlPrinter::with_options(&mut output, options).print(doc)?;
    // Only &str content is ever written
    Ok(String::from_utf8_lossy(&output).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    const DECL: &str = "<?xml version='1.0' encoding='UTF-8'?>\n";

    fn pretty(xml: &str) -> String {
        print_to_string_pretty(&parse_str(xml).unwrap()).unwrap()
    }

    #[test]
    fn test_print_simple() {
        assert_eq!(pretty("<root>text</root>"), format!("{DECL}<root>text</root>\n"));
    }

    #[test]
    fn test_print_empty_element() {
        assert_eq!(pretty("<root></root>"), format!("{DECL}<root/>\n"));
    }

    #[test]
    fn test_pretty_print_nested() {
        let output = pretty(r#"<a x="1"  y = "2"><b><c>deep</c><d/></b></a>"#);
        let expected = format!(
            "{DECL}<a x=\"1\" y=\"2\">\n  <b>\n    <c>deep</c>\n    <d/>\n  </b>\n</a>\n"
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn test_mixed_content_stays_inline() {
        let output = pretty("<p>Hello <b>big <i>wide</i></b> world<br/></p>");
        assert_eq!(
            output,
            format!("{DECL}<p>Hello <b>big <i>wide</i></b> world<br/></p>\n")
        );
    }

    #[test]
    fn test_comments_and_pis_on_own_lines() {
        let output = pretty("<!--c0--><a><!--c1--><?pi data?><b/></a><!--c2-->");
        let expected = format!(
            "{DECL}<!--c0-->\n<a>\n  <!--c1-->\n  <?pi data?>\n  <b/>\n</a>\n<!--c2-->\n"
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn test_doctype_and_standalone() {
        let output = pretty("<?xml version=\"1.0\" standalone=\"no\"?><!DOCTYPE a><a/>");
        assert_eq!(
            output,
            "<?xml version='1.0' encoding='UTF-8' standalone='no'?>\n<!DOCTYPE a>\n<a/>\n"
        );
    }

    #[test]
    fn test_entity_encoding() {
        let output = pretty(r#"<root attr="&amp;&lt;&gt;&quot;">&amp;&lt;&gt;</root>"#);
        assert!(output.contains(r#"attr="&amp;&lt;&gt;&quot;""#));
        assert!(output.contains(">&amp;&lt;&gt;</root>"));
    }

    #[test]
    fn test_compact_print() {
        let doc = parse_str("<a>\n  <b>1</b>\n  <c/>\n</a>").unwrap();
        let output = print_to_string(&doc).unwrap();
        assert_eq!(output, format!("{DECL}<a><b>1</b><c/></a>"));
    }

    #[test]
    fn test_custom_indent_width() {
        let doc = parse_str("<a><b/></a>").unwrap();
        let mut output = Vec::new();
        let options = XmlPrinterOptions {
            pretty_print: true,
            indent_width: 4,
        };
        XmlPrinter::with_options(&mut output, options)
            .print(&doc)
            .unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            format!("{DECL}<a>\n    <b/>\n</a>\n")
        );
    }

    #[test]
    fn test_double_round_trip() {
        // Parse -> Print -> Parse -> Print should produce identical output
        let xml = r#"<doc><section id="s1"><para>First paragraph.</para><para>Second &amp; last.</para></section></doc>"#;
        let output1 = pretty(xml);
        let output2 = pretty(&output1);
        assert_eq!(output1, output2);
    }
}
