//! Resolution of diff inputs.
//!
//! An input is either a path, which the pipeline opens and owns, or a
//! stream handed over by the caller. Either way the resolved stream is
//! released when the [`ResolvedInput`] is dropped, on success and on every
//! error path alike. A caller that wants to keep its handle open passes
//! `&mut reader` instead of the reader itself.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{Error, Result};

/// One side of a diff.
pub enum Input<'a> {
    /// A file to open; its path is the default display name.
    Path {
        path: PathBuf,
        name: Option<String>,
    },
    /// An already-open byte stream.
    Stream {
        reader: Box<dyn Read + 'a>,
        name: Option<String>,
    },
}

impl<'a> Input<'a> {
    /// An input read from the file at `path`.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Input::Path {
            path: path.into(),
            name: None,
        }
    }

    /// An input read from an open stream.
    pub fn stream(reader: impl Read + 'a) -> Self {
        Input::Stream {
            reader: Box::new(reader),
            name: None,
        }
    }

    /// Overrides the name shown in the diff header.
    pub fn named(self, name: impl Into<String>) -> Self {
        let name = Some(name.into());
        match self {
            Input::Path { path, .. } => Input::Path { path, name },
            Input::Stream { reader, .. } => Input::Stream { reader, name },
        }
    }

    /// Opens the input if needed and settles its display name.
    ///
    /// `default_name` is used for streams that were not given a name.
    pub fn resolve(self, default_name: &str) -> Result<ResolvedInput<'a>> {
        match self {
            Input::Path { path, name } => {
                let file = File::open(&path).map_err(|source| Error::Open {
                    path: path.clone(),
                    source,
                })?;
                let name = name.unwrap_or_else(|| path.display().to_string());
                debug!(%name, path = %path.display(), "opened input");
                Ok(ResolvedInput {
                    reader: Box::new(BufReader::new(file)),
                    name,
                    owned: true,
                })
            }
            Input::Stream { reader, name } => {
                let name = name.unwrap_or_else(|| default_name.to_string());
                debug!(%name, "using caller stream");
                Ok(ResolvedInput {
                    reader: Box::new(BufReader::new(reader)),
                    name,
                    owned: false,
                })
            }
        }
    }
}

impl From<PathBuf> for Input<'_> {
    fn from(path: PathBuf) -> Self {
        Input::path(path)
    }
}

impl From<&Path> for Input<'_> {
    fn from(path: &Path) -> Self {
        Input::path(path)
    }
}

impl std::fmt::Debug for Input<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Path { path, name } => f
                .debug_struct("Path")
                .field("path", path)
                .field("name", name)
                .finish(),
            Input::Stream { name, .. } => f
                .debug_struct("Stream")
                .field("name", name)
                .finish_non_exhaustive(),
        }
    }
}

/// An input ready to be read.
///
/// Dropping it closes the underlying stream. Close errors are discarded.
pub struct ResolvedInput<'a> {
    reader: Box<dyn BufRead + 'a>,
    name: String,
    owned: bool,
}

impl<'a> ResolvedInput<'a> {
    /// The name shown in the diff header.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the stream was opened by the pipeline rather than the caller.
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// The buffered stream.
    pub fn reader(&mut self) -> &mut (dyn BufRead + 'a) {
        &mut *self.reader
    }
}

impl std::fmt::Debug for ResolvedInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedInput")
            .field("name", &self.name)
            .field("owned", &self.owned)
            .finish_non_exhaustive()
    }
}

impl Drop for ResolvedInput<'_> {
    fn drop(&mut self) {
        trace!(name = %self.name, owned = self.owned, "releasing input");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_path_name_defaults_to_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<a/>").unwrap();

        let resolved = Input::path(file.path()).resolve("old").unwrap();
        assert_eq!(resolved.name(), file.path().display().to_string());
        assert!(resolved.is_owned());
    }

    #[test]
    fn test_name_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<a/>").unwrap();

        let resolved = Input::path(file.path())
            .named("before.xml")
            .resolve("old")
            .unwrap();
        assert_eq!(resolved.name(), "before.xml");
    }

    #[test]
    fn test_stream_uses_default_name() {
        let mut resolved = Input::stream("<a/>".as_bytes()).resolve("new").unwrap();
        assert_eq!(resolved.name(), "new");
        assert!(!resolved.is_owned());

        let mut text = String::new();
        resolved.reader().read_to_string(&mut text).unwrap();
        assert_eq!(text, "<a/>");
    }

    #[test]
    fn test_borrowed_stream_survives() {
        let mut cursor = std::io::Cursor::new(b"<a/>".to_vec());
        {
            let mut resolved = Input::stream(&mut cursor).resolve("old").unwrap();
            let mut text = String::new();
            resolved.reader().read_to_string(&mut text).unwrap();
        }
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.xml");

        let err = Input::path(&missing).resolve("old").unwrap_err();
        match err {
            Error::Open { path, source } => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected open error, got {other}"),
        }
    }
}
