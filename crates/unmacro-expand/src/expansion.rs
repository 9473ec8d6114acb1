//! Expansion bookkeeping
//!
//! Per source file and line, the distinct texts that line expanded to across
//! every translation unit and inclusion site. Entries are created on first
//! write and never removed; the reconciler only reads them.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use unmacro_core::FileLinePosition;

/// One distinct expansion text and everywhere it was observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpansionOccurrences {
    /// Literal preprocessed text
    pub text: String,
    /// Positions in preprocessed artifacts, in observation order
    pub locations: Vec<FileLinePosition>,
}

impl ExpansionOccurrences {
    /// First place this text was observed
    pub fn first_location(&self) -> Option<&FileLinePosition> {
        self.locations.first()
    }
}

/// What one source line expanded to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineInfo {
    /// Some inclusion site produced an empty line here (e.g. an untaken `#if` branch)
    pub saw_blank_expansion: bool,
    /// Distinct non-blank texts in first-seen order
    occurrences: Vec<ExpansionOccurrences>,
}

impl LineInfo {
    /// Record an empty expansion
    pub fn record_blank(&mut self) {
        self.saw_blank_expansion = true;
    }

    /// Record a non-blank expansion observed at `at`
    pub fn record_expansion(&mut self, text: &str, at: FileLinePosition) {
        match self.occurrences.iter_mut().find(|o| o.text == text) {
            Some(existing) => existing.locations.push(at),
            None => self.occurrences.push(ExpansionOccurrences {
                text: text.to_string(),
                locations: vec![at],
            }),
        }
    }

    /// Distinct non-blank expansions, first-seen first
    pub fn expansions(&self) -> &[ExpansionOccurrences] {
        &self.occurrences
    }
}

/// Line table of one source file
#[derive(Debug, Clone, Default)]
pub struct SourceFileInfo {
    lines: BTreeMap<u32, LineInfo>,
}

impl SourceFileInfo {
    /// Get or insert the entry for a line
    pub fn line_mut(&mut self, line: u32) -> &mut LineInfo {
        self.lines.entry(line).or_default()
    }

    /// Entry for a line, if it was ever observed
    pub fn line(&self, line: u32) -> Option<&LineInfo> {
        self.lines.get(&line)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Every source file seen in a run, keyed by canonical path
#[derive(Debug, Clone, Default)]
pub struct SourceFiles {
    files: BTreeMap<PathBuf, SourceFileInfo>,
}

impl SourceFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or insert the entry for a file
    pub fn file_mut(&mut self, path: &Path) -> &mut SourceFileInfo {
        self.files.entry(path.to_path_buf()).or_default()
    }

    /// Get or insert the entry for one line of a file
    pub fn line_mut(&mut self, path: &Path, line: u32) -> &mut LineInfo {
        self.file_mut(path).line_mut(line)
    }

    /// Entry for a file, if it was ever observed
    pub fn get(&self, path: &Path) -> Option<&SourceFileInfo> {
        self.files.get(path)
    }

    /// Files in path order
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &SourceFileInfo)> {
        self.files.iter().map(|(p, info)| (p.as_path(), info))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_expansions_keep_first_seen_order() {
        let mut info = LineInfo::default();
        info.record_expansion("foo();", FileLinePosition::new("a.em.i", 10));
        info.record_expansion("bar();", FileLinePosition::new("b.em.i", 4));
        info.record_expansion("foo();", FileLinePosition::new("b.em.i", 20));

        let expansions = info.expansions();
        assert_eq!(expansions.len(), 2);
        assert_eq!(expansions[0].text, "foo();");
        assert_eq!(
            expansions[0].locations,
            vec![
                FileLinePosition::new("a.em.i", 10),
                FileLinePosition::new("b.em.i", 20)
            ]
        );
        assert_eq!(expansions[1].text, "bar();");
        assert_eq!(
            expansions[1].first_location(),
            Some(&FileLinePosition::new("b.em.i", 4))
        );
        assert!(!info.saw_blank_expansion);
    }

    #[test]
    fn test_blank_does_not_add_expansion() {
        let mut info = LineInfo::default();
        info.record_blank();
        assert!(info.saw_blank_expansion);
        assert!(info.expansions().is_empty());
    }

    #[test]
    fn test_get_or_insert() {
        let mut files = SourceFiles::new();
        assert!(files.get(Path::new("/p/a.c")).is_none());

        files
            .line_mut(Path::new("/p/a.c"), 3)
            .record_expansion("x;", FileLinePosition::new("a.em.i", 1));
        files.line_mut(Path::new("/p/a.c"), 1).record_blank();
        files.file_mut(Path::new("/p/b.h"));

        assert_eq!(files.len(), 2);
        let a = files.get(Path::new("/p/a.c")).unwrap();
        assert_eq!(a.len(), 2);
        assert!(a.line(1).unwrap().saw_blank_expansion);
        assert_eq!(a.line(3).unwrap().expansions()[0].text, "x;");
        assert!(a.line(2).is_none());
        assert!(files.get(Path::new("/p/b.h")).unwrap().is_empty());
    }
}
