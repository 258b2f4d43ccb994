//! Whitespace-insensitive normalization of XML documents.

use std::io::BufRead;

use crate::error::Result;
use crate::xml::{ParseOptions, XmlParser, XmlPrinter, XmlPrinterOptions};

/// Parses one document with blank text removed and pretty-prints it.
///
/// Every caller gets the same parser and printer settings, so two
/// normalized documents differ only where their content does.
pub fn normalize<R: BufRead>(input: R) -> Result<String> {
    let parser = XmlParser::with_options(ParseOptions {
        remove_blank_text: true,
    });
    let doc = parser.parse_reader(input)?;

    let mut output = Vec::new();
    XmlPrinter::with_options(&mut output, XmlPrinterOptions::default()).print(&doc)?;
    Ok(String::from_utf8_lossy(&output).into_owned())
}

/// Normalizes a document held in memory.
pub fn normalize_str(xml: &str) -> Result<String> {
    normalize(xml.as_bytes())
}
