//! Line diffs in unified and context format.
//!
//! Lines are compared with the Myers algorithm from `similar` and grouped
//! into hunks by its `grouped_ops`. The hunk layout follows the classic
//! `diff -u` / `diff -c` conventions, including the way empty ranges are
//! numbered.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use similar::{Algorithm, DiffOp, DiffTag, TextDiff};
use tracing::debug;

use crate::error::{Error, Result};

const DEFAULT_CONTEXT: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(n) => n,
    None => unreachable!(),
};

/// Output layout of a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffStyle {
    /// `---`/`+++` headers and `@@` hunks.
    #[default]
    Unified,
    /// `***`/`---` headers with separate old and new blocks per hunk.
    Context,
}

/// Formatting options for a diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOptions {
    /// Unchanged lines shown around each change.
    pub context: NonZeroUsize,
    /// Timestamp shown after the old name in the header.
    pub from_date: Option<String>,
    /// Timestamp shown after the new name in the header.
    pub to_date: Option<String>,
    /// Appended to every produced line.
    pub line_terminator: String,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            context: DEFAULT_CONTEXT,
            from_date: None,
            to_date: None,
            line_terminator: "\n".to_string(),
        }
    }
}

impl DiffOptions {
    /// Sets the number of context lines; zero is rejected.
    pub fn with_context(mut self, lines: usize) -> Result<Self> {
        self.context =
            NonZeroUsize::new(lines).ok_or_else(|| Error::InvalidContext(lines.to_string()))?;
        Ok(self)
    }

    /// Sets the old side's header timestamp.
    pub fn with_from_date(mut self, date: impl Into<String>) -> Self {
        self.from_date = Some(date.into());
        self
    }

    /// Sets the new side's header timestamp.
    pub fn with_to_date(mut self, date: impl Into<String>) -> Self {
        self.to_date = Some(date.into());
        self
    }

    /// Sets the string appended to each line.
    pub fn with_line_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.line_terminator = terminator.into();
        self
    }

    /// Sets an option by its `difflib` keyword name.
    ///
    /// Recognized keys are `n`, `fromdate`, `todate` and `lineterm`. Any
    /// other key is an error rather than being silently dropped.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "n" => {
                self.context = value
                    .trim()
                    .parse::<NonZeroUsize>()
                    .map_err(|_| Error::InvalidContext(value.to_string()))?;
            }
            "fromdate" => self.from_date = Some(value.to_string()),
            "todate" => self.to_date = Some(value.to_string()),
            "lineterm" => self.line_terminator = value.to_string(),
            _ => return Err(Error::UnknownOption(key.to_string())),
        }
        Ok(())
    }
}

/// Diffs two texts line by line.
///
/// Nothing is formatted until the returned iterator is advanced; each hunk
/// is rendered when the previous one has been consumed.
pub fn line_diff(
    old_text: &str,
    new_text: &str,
    old_name: &str,
    new_name: &str,
    style: DiffStyle,
    options: &DiffOptions,
) -> DiffLines {
    let old: Vec<String> = old_text.lines().map(str::to_owned).collect();
    let new: Vec<String> = new_text.lines().map(str::to_owned).collect();

    let groups = {
        let old_slices: Vec<&str> = old.iter().map(String::as_str).collect();
        let new_slices: Vec<&str> = new.iter().map(String::as_str).collect();
        let diff = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .diff_slices(&old_slices, &new_slices);
        diff.grouped_ops(options.context.get())
    };
    debug!(
        old_lines = old.len(),
        new_lines = new.len(),
        hunks = groups.len(),
        "computed line diff"
    );

    DiffLines {
        old,
        new,
        old_name: old_name.to_string(),
        new_name: new_name.to_string(),
        style,
        options: options.clone(),
        groups: groups.into_iter(),
        header_done: false,
        pending: VecDeque::new(),
    }
}

/// A lazily formatted diff, one line per item.
///
/// Empty when the inputs are identical. The iterator is single-pass.
#[derive(Debug)]
pub struct DiffLines {
    old: Vec<String>,
    new: Vec<String>,
    old_name: String,
    new_name: String,
    style: DiffStyle,
    options: DiffOptions,
    groups: std::vec::IntoIter<Vec<DiffOp>>,
    header_done: bool,
    pending: VecDeque<String>,
}

impl Iterator for DiffLines {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if let Some(line) = self.pending.pop_front() {
            return Some(line);
        }

        let group = self.groups.next()?;
        if !self.header_done {
            self.header_done = true;
            self.render_header();
        }
        match self.style {
            DiffStyle::Unified => self.render_unified(&group),
            DiffStyle::Context => self.render_context(&group),
        }
        self.pending.pop_front()
    }
}

impl DiffLines {
    fn emit(&mut self, mut line: String) {
        line.push_str(&self.options.line_terminator);
        self.pending.push_back(line);
    }

    fn render_header(&mut self) {
        let (old_mark, new_mark) = match self.style {
            DiffStyle::Unified => ("---", "+++"),
            DiffStyle::Context => ("***", "---"),
        };
        let old = header_line(old_mark, &self.old_name, self.options.from_date.as_deref());
        let new = header_line(new_mark, &self.new_name, self.options.to_date.as_deref());
        self.emit(old);
        self.emit(new);
    }

    fn render_unified(&mut self, group: &[DiffOp]) {
        let (old_range, new_range) = group_ranges(group);
        self.emit(format!(
            "@@ -{} +{} @@",
            unified_range(old_range),
            unified_range(new_range)
        ));

        for op in group {
            let (tag, old, new) = op.as_tag_tuple();
            let mut lines = Vec::new();
            match tag {
                DiffTag::Equal => {
                    lines.extend(self.old[old].iter().map(|l| format!(" {l}")));
                }
                DiffTag::Delete => {
                    lines.extend(self.old[old].iter().map(|l| format!("-{l}")));
                }
                DiffTag::Insert => {
                    lines.extend(self.new[new].iter().map(|l| format!("+{l}")));
                }
                DiffTag::Replace => {
                    lines.extend(self.old[old].iter().map(|l| format!("-{l}")));
                    lines.extend(self.new[new].iter().map(|l| format!("+{l}")));
                }
            }
            for line in lines {
                self.emit(line);
            }
        }
    }

    fn render_context(&mut self, group: &[DiffOp]) {
        let (old_range, new_range) = group_ranges(group);
        self.emit("***************".to_string());

        self.emit(format!("*** {} ****", context_range(old_range)));
        let removes = group
            .iter()
            .any(|op| matches!(op.tag(), DiffTag::Delete | DiffTag::Replace));
        if removes {
            let mut lines = Vec::new();
            for op in group {
                let (tag, old, _) = op.as_tag_tuple();
                if tag == DiffTag::Insert {
                    continue;
                }
                let prefix = context_prefix(tag);
                lines.extend(self.old[old].iter().map(|l| format!("{prefix}{l}")));
            }
            for line in lines {
                self.emit(line);
            }
        }

        self.emit(format!("--- {} ----", context_range(new_range)));
        let adds = group
            .iter()
            .any(|op| matches!(op.tag(), DiffTag::Insert | DiffTag::Replace));
        if adds {
            let mut lines = Vec::new();
            for op in group {
                let (tag, _, new) = op.as_tag_tuple();
                if tag == DiffTag::Delete {
                    continue;
                }
                let prefix = context_prefix(tag);
                lines.extend(self.new[new].iter().map(|l| format!("{prefix}{l}")));
            }
            for line in lines {
                self.emit(line);
            }
        }
    }
}

fn header_line(mark: &str, name: &str, date: Option<&str>) -> String {
    match date {
        Some(date) if !date.is_empty() => format!("{mark} {name}\t{date}"),
        _ => format!("{mark} {name}"),
    }
}

/// Old and new line ranges spanned by a hunk.
fn group_ranges(group: &[DiffOp]) -> ((usize, usize), (usize, usize)) {
    match (group.first(), group.last()) {
        (Some(first), Some(last)) => (
            (first.old_range().start, last.old_range().end),
            (first.new_range().start, last.new_range().end),
        ),
        _ => ((0, 0), (0, 0)),
    }
}

/// `start,length` with a length of one omitted; empty ranges name the
/// line before them.
fn unified_range((start, stop): (usize, usize)) -> String {
    let length = stop - start;
    let beginning = if length == 0 { start } else { start + 1 };
    if length == 1 {
        beginning.to_string()
    } else {
        format!("{beginning},{length}")
    }
}

/// `first,last` line numbers, or a single number for ranges of at most one
/// line.
fn context_range((start, stop): (usize, usize)) -> String {
    let length = stop - start;
    let beginning = if length == 0 { start } else { start + 1 };
    if length <= 1 {
        beginning.to_string()
    } else {
        format!("{},{}", beginning, beginning + length - 1)
    }
}

fn context_prefix(tag: DiffTag) -> &'static str {
    match tag {
        DiffTag::Equal => "  ",
        DiffTag::Delete => "- ",
        DiffTag::Insert => "+ ",
        DiffTag::Replace => "! ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTERS: &str = "a\nb\nc\nd\ne\nf\ng\nh\n";
    const LETTERS_E: &str = "a\nb\nc\nd\nE\nf\ng\nh\n";

    fn lines(style: DiffStyle, old: &str, new: &str, options: &DiffOptions) -> Vec<String> {
        line_diff(old, new, "old", "new", style, options).collect()
    }

    fn bare() -> DiffOptions {
        DiffOptions::default().with_line_terminator("")
    }

    #[test]
    fn test_identical_is_empty() {
        assert!(lines(DiffStyle::Unified, LETTERS, LETTERS, &bare()).is_empty());
        assert!(lines(DiffStyle::Context, LETTERS, LETTERS, &bare()).is_empty());
        assert!(lines(DiffStyle::Unified, "", "", &bare()).is_empty());
    }

    #[test]
    fn test_unified_replace() {
        let options = bare().with_context(1).unwrap();
        assert_eq!(
            lines(DiffStyle::Unified, LETTERS, LETTERS_E, &options),
            vec!["--- old", "+++ new", "@@ -4,3 +4,3 @@", " d", "-e", "+E", " f"]
        );
    }

    #[test]
    fn test_context_replace() {
        let options = bare().with_context(1).unwrap();
        assert_eq!(
            lines(DiffStyle::Context, LETTERS, LETTERS_E, &options),
            vec![
                "*** old",
                "--- new",
                "***************",
                "*** 4,6 ****",
                "  d",
                "! e",
                "  f",
                "--- 4,6 ----",
                "  d",
                "! E",
                "  f",
            ]
        );
    }

    #[test]
    fn test_context_insert_only_omits_old_block() {
        assert_eq!(
            lines(DiffStyle::Context, "a\nb\n", "a\nb\nc\n", &bare()),
            vec![
                "*** old",
                "--- new",
                "***************",
                "*** 1,2 ****",
                "--- 1,3 ----",
                "  a",
                "  b",
                "+ c",
            ]
        );
    }

    #[test]
    fn test_context_delete_only_omits_new_block() {
        assert_eq!(
            lines(DiffStyle::Context, "a\nb\n", "a\n", &bare()),
            vec![
                "*** old",
                "--- new",
                "***************",
                "*** 1,2 ****",
                "  a",
                "- b",
                "--- 1 ----",
            ]
        );
    }

    #[test]
    fn test_unified_empty_ranges() {
        assert_eq!(
            lines(DiffStyle::Unified, "", "x\n", &bare()),
            vec!["--- old", "+++ new", "@@ -0,0 +1 @@", "+x"]
        );
    }

    #[test]
    fn test_separate_hunks() {
        let old = "1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n";
        let new = "one\n2\n3\n4\n5\n6\n7\n8\n9\nten\n";
        let out = lines(DiffStyle::Unified, old, new, &bare().with_context(2).unwrap());
        let hunks: Vec<&String> = out.iter().filter(|l| l.starts_with("@@")).collect();
        assert_eq!(hunks, vec!["@@ -1,3 +1,3 @@", "@@ -8,3 +8,3 @@"]);
    }

    #[test]
    fn test_context_size_bounds_unchanged_lines() {
        let options = bare().with_context(2).unwrap();
        let out = lines(DiffStyle::Unified, LETTERS, LETTERS_E, &options);
        let unchanged = out.iter().filter(|l| l.starts_with(' ')).count();
        assert_eq!(unchanged, 4);
    }

    #[test]
    fn test_dates_and_terminator() {
        let options = DiffOptions::default()
            .with_from_date("2024-01-01")
            .with_to_date("2024-01-02");
        let out = lines(DiffStyle::Unified, "a\n", "b\n", &options);
        assert_eq!(out[0], "--- old\t2024-01-01\n");
        assert_eq!(out[1], "+++ new\t2024-01-02\n");
        assert!(out.iter().all(|l| l.ends_with('\n')));
    }

    #[test]
    fn test_lazy_iteration() {
        let mut diff = line_diff(LETTERS, LETTERS_E, "old", "new", DiffStyle::Unified, &bare());
        assert_eq!(diff.next().as_deref(), Some("--- old"));
        // header and the single hunk are rendered together
        assert_eq!(diff.pending.len(), 10);
        assert_eq!(diff.by_ref().count(), 10);
        assert_eq!(diff.next(), None);
    }

    #[test]
    fn test_zero_context_rejected() {
        let err = DiffOptions::default().with_context(0).unwrap_err();
        assert!(matches!(&err, Error::InvalidContext(value) if value == "0"));
        assert_eq!(
            err.to_string(),
            "context should be a positive integer, got \"0\""
        );
    }

    #[test]
    fn test_set_known_keys() {
        let mut options = DiffOptions::default();
        options.set("n", "5").unwrap();
        options.set("fromdate", "then").unwrap();
        options.set("todate", "now").unwrap();
        options.set("lineterm", "").unwrap();

        assert_eq!(options.context.get(), 5);
        assert_eq!(options.from_date.as_deref(), Some("then"));
        assert_eq!(options.to_date.as_deref(), Some("now"));
        assert_eq!(options.line_terminator, "");
    }

    #[test]
    fn test_set_rejects_bad_values_and_keys() {
        let mut options = DiffOptions::default();
        assert!(matches!(
            options.set("n", "-1"),
            Err(Error::InvalidContext(value)) if value == "-1"
        ));
        assert!(matches!(
            options.set("n", "0"),
            Err(Error::InvalidContext(_))
        ));
        assert!(matches!(
            options.set("linejunk", "x"),
            Err(Error::UnknownOption(key)) if key == "linejunk"
        ));
        assert_eq!(options, DiffOptions::default());
    }
}
