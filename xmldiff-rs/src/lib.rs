//! xml-linediff - line diffs of normalized XML
//!
//! Two documents are parsed with insignificant whitespace removed and
//! pretty-printed in one fixed layout. The printed forms are then compared
//! line by line, so the resulting unified or context diff shows changes in
//! content and structure, not in formatting.
//!
//! # Example
//!
//! ```
//! use xml_linediff::{diff_from_text, DiffStyle};
//!
//! let lines: Vec<String> = diff_from_text(
//!     "<a><b>1</b></a>",
//!     "<a>\n  <b>2</b>\n</a>",
//!     "old",
//!     "new",
//!     DiffStyle::Unified,
//! )?
//! .collect();
//!
//! assert!(lines.iter().any(|l| l.starts_with("-  <b>1</b>")));
//! assert!(lines.iter().any(|l| l.starts_with("+  <b>2</b>")));
//! # Ok::<(), xml_linediff::Error>(())
//! ```
//!
//! The whole comparison is line based. Reordered attributes or moved
//! elements show up as changed lines.

pub mod diff;
pub mod error;
pub mod input;
pub mod node;
pub mod normalize;
pub mod xml;

use tracing::debug;

pub use diff::{line_diff, DiffLines, DiffOptions, DiffStyle};
pub use error::{Error, Result};
pub use input::{Input, ResolvedInput};
pub use node::{Attribute, Document, Element, Node, XmlSpace};
pub use normalize::{normalize, normalize_str};
pub use xml::{ParseOptions, XmlParser, XmlPrinter, XmlPrinterOptions};

/// Diffs two XML documents after normalizing both.
///
/// Both inputs are opened before either is parsed. All streams are
/// released before this function returns, whether it succeeds or not.
pub fn diff(
    old: Input<'_>,
    new: Input<'_>,
    style: DiffStyle,
    options: &DiffOptions,
) -> Result<DiffLines> {
    let mut old = old.resolve("old")?;
    let mut new = new.resolve("new")?;

    debug!(name = %old.name(), "normalizing old document");
    let old_text = normalize(old.reader())?;
    debug!(name = %new.name(), "normalizing new document");
    let new_text = normalize(new.reader())?;

    Ok(line_diff(
        &old_text,
        &new_text,
        old.name(),
        new.name(),
        style,
        options,
    ))
}

/// Diffs two XML documents held in memory, with default options.
pub fn diff_from_text(
    old_text: &str,
    new_text: &str,
    old_name: &str,
    new_name: &str,
    style: DiffStyle,
) -> Result<DiffLines> {
    diff(
        Input::stream(old_text.as_bytes()).named(old_name),
        Input::stream(new_text.as_bytes()).named(new_name),
        style,
        &DiffOptions::default(),
    )
}

/// Reusable diff settings.
///
/// ```
/// use xml_linediff::{DiffOptions, DiffStyle, XmlDiff};
///
/// let differ = XmlDiff::new()
///     .style(DiffStyle::Context)
///     .options(DiffOptions::default().with_line_terminator(""));
/// let lines: Vec<String> = differ.diff_text("<a>x</a>", "<a>y</a>")?.collect();
/// assert_eq!(lines[0], "*** old");
/// # Ok::<(), xml_linediff::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct XmlDiff {
    style: DiffStyle,
    options: DiffOptions,
}

impl XmlDiff {
    /// Unified diff with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output layout.
    pub fn style(mut self, style: DiffStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets the formatting options.
    pub fn options(mut self, options: DiffOptions) -> Self {
        self.options = options;
        self
    }

    /// Diffs two inputs.
    pub fn diff(&self, old: Input<'_>, new: Input<'_>) -> Result<DiffLines> {
        diff(old, new, self.style, &self.options)
    }

    /// Diffs two in-memory documents named `old` and `new`.
    pub fn diff_text(&self, old_text: &str, new_text: &str) -> Result<DiffLines> {
        self.diff(
            Input::stream(old_text.as_bytes()),
            Input::stream(new_text.as_bytes()),
        )
    }
}
