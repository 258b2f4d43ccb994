//! Error types for xml-linediff.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for xml-linediff operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while normalizing or diffing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// An input path could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error while reading an input.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not well-formed XML.
    #[error("XML parse error at byte {position}: {message}")]
    Parse { position: u64, message: String },

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Context size must be a positive integer.
    #[error("context should be a positive integer, got {0:?}")]
    InvalidContext(String),

    /// A string-keyed diff option that is not recognized.
    #[error("unknown diff option: {0}")]
    UnknownOption(String),
}

impl Error {
    pub(crate) fn parse(position: u64, message: impl Into<String>) -> Self {
        Error::Parse {
            position,
            message: message.into(),
        }
    }
}
