//! Line reconciliation
//!
//! Rewrites each eligible source file so every line holds the text the
//! preprocessor produced for it. Directive lines are passed through (minus
//! comments) so the file still preprocesses the same way; lines whose
//! expansion differs between inclusion sites keep their original text.
//!
//! Comment stripping inside directives is textual and does not understand
//! string literals. A directive such as `#define URL "http://x"` is cut at
//! the `//`; the verifier reports the resulting difference.

use crate::expansion::{LineInfo, SourceFileInfo, SourceFiles};
use crate::report::{ExpansionReport, RewriteWarning, SkipReason, SkippedFile, WarningKind};
use crate::split_lines;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use unmacro_core::{backup_path, with_suffix, Artifact, Error, FileLinePosition, Result};

/// Suffix of the staging file new content is written to before the swap
const STAGING_SUFFIX: &str = ".em-new";

/// New content for one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenFile {
    pub text: String,
    pub warnings: Vec<RewriteWarning>,
}

/// Rewrites source files from the scanned expansion table
pub struct LineReconciler {
    base_dir: PathBuf,
    block_comment: Regex,
    continuation: Regex,
}

impl LineReconciler {
    /// Create a reconciler rewriting files below `base_dir`
    pub fn new(base_dir: &Path) -> Result<Self> {
        let base_dir = base_dir
            .canonicalize()
            .map_err(|_| Error::FileNotFound(base_dir.display().to_string()))?;

        Ok(Self {
            base_dir,
            block_comment: Regex::new(r"/\*.*?\*/").unwrap(),
            continuation: Regex::new(r"\\\s*$").unwrap(),
        })
    }

    /// Canonical base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Why `path` must not be rewritten, if it must not
    pub fn skip_reason(&self, path: &Path) -> Option<SkipReason> {
        if !path.is_absolute() || !path.starts_with(&self.base_dir) || path == self.base_dir {
            return Some(SkipReason::OutsideBaseDir);
        }
        if Artifact::is_synthetic_source(path) {
            return Some(SkipReason::SyntheticUnit);
        }
        if !path.is_file() {
            return Some(SkipReason::Missing);
        }
        None
    }

    /// Remove `/* ... */` comments, then cut at the first remaining `//` or `/*`
    pub fn strip_directive_comments(&self, line: &str) -> String {
        let stripped = self.block_comment.replace_all(line, "");
        let cut = [stripped.find("//"), stripped.find("/*")]
            .into_iter()
            .flatten()
            .min();
        match cut {
            Some(at) => stripped[..at].to_string(),
            None => stripped.into_owned(),
        }
    }

    /// Compute the new content of `path` from its original text
    pub fn rewrite_lines(&self, path: &Path, original: &str, info: &SourceFileInfo) -> RewrittenFile {
        let mut text = String::with_capacity(original.len());
        let mut warnings = Vec::new();
        let mut in_directive = false;

        for (index, line) in split_lines(original).enumerate() {
            let lineno = index as u32 + 1;
            let location = FileLinePosition::new(path, lineno);
            let expansions = info.line(lineno).map(LineInfo::expansions).unwrap_or(&[]);

            if !in_directive && line.trim_start().starts_with('#') {
                in_directive = true;
            }

            if in_directive {
                if let Some(first) = expansions.first() {
                    let message = format!(
                        "in a preprocessor directive but had a non-blank expansion: {:?} at {}",
                        first.text,
                        describe_first(first.first_location())
                    );
                    warn!("{}: {}", location, message);
                    warnings.push(RewriteWarning {
                        kind: WarningKind::DirectiveExpansion,
                        location,
                        message,
                    });
                }
                text.push_str(&self.strip_directive_comments(line));
                if !self.continuation.is_match(line) {
                    in_directive = false;
                }
            } else {
                match expansions {
                    // Never reached, or only ever preprocessed away.
                    [] => {}
                    [only] => text.push_str(&only.text),
                    [first, second, ..] => {
                        let message = format!(
                            "had several different expansions, including {:?} at {} and {:?} at {}; keeping original content",
                            first.text,
                            describe_first(first.first_location()),
                            second.text,
                            describe_first(second.first_location())
                        );
                        warn!("{}: {}", location, message);
                        warnings.push(RewriteWarning {
                            kind: WarningKind::AmbiguousExpansion,
                            location,
                            message,
                        });
                        text.push_str(line);
                    }
                }
            }
            text.push('\n');
        }

        RewrittenFile { text, warnings }
    }

    /// Rewrite one file in place, keeping the original as `<path>.pre-em`
    ///
    /// The new content is staged next to the file and swapped in by rename.
    pub fn reconcile_file(&self, path: &Path, info: &SourceFileInfo) -> Result<RewrittenFile> {
        info!("Updating source file {}...", path.display());

        let original = fs::read_to_string(path)?;
        let rewritten = self.rewrite_lines(path, &original, info);

        let staging = with_suffix(path, STAGING_SUFFIX);
        fs::write(&staging, &rewritten.text)?;
        fs::rename(path, backup_path(path))?;
        fs::rename(&staging, path)?;

        Ok(rewritten)
    }

    /// Rewrite every eligible file, recording results in `report`
    ///
    /// Fails before touching anything if an eligible file already has a
    /// backup, since renaming over it would lose the older original.
    pub fn reconcile_all(&self, files: &SourceFiles, report: &mut ExpansionReport) -> Result<()> {
        let mut eligible = Vec::new();

        for (path, info) in files.iter() {
            if info.is_empty() {
                continue;
            }
            match self.skip_reason(path) {
                Some(reason) => {
                    debug!("Not updating {}: {:?}", path.display(), reason);
                    report.skipped.push(SkippedFile {
                        path: path.to_path_buf(),
                        reason,
                    });
                }
                None => eligible.push((path, info)),
            }
        }

        if let Some((path, _)) = eligible.iter().find(|(p, _)| backup_path(p).exists()) {
            return Err(Error::BackupExists(backup_path(path).display().to_string()));
        }

        for (path, info) in eligible {
            let rewritten = self.reconcile_file(path, info)?;
            report.rewritten.push(path.to_path_buf());
            report.warnings.extend(rewritten.warnings);
        }

        Ok(())
    }
}

fn describe_first(location: Option<&FileLinePosition>) -> String {
    location
        .map(|l| l.to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}
