//! XML parsing and output.
//!
//! The parser and printer are used as a pair: a document is read with
//! blank text removed and written back in a fixed layout, so that two
//! documents differing only in formatting print identically.

mod parser;
mod printer;

pub use parser::{parse_str, ParseOptions, XmlParser};
pub use printer::{print_to_string, print_to_string_pretty, XmlPrinter, XmlPrinterOptions};
