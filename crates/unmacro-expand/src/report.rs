//! Reconciliation report

use serde::Serialize;
use std::path::PathBuf;
use unmacro_core::FileLinePosition;

/// Kind of non-fatal anomaly found while rewriting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A directive line had a non-blank expansion
    DirectiveExpansion,
    /// A line expanded to several distinct texts; original kept
    AmbiguousExpansion,
}

/// A non-fatal anomaly at one source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteWarning {
    pub kind: WarningKind,
    pub location: FileLinePosition,
    pub message: String,
}

impl std::fmt::Display for RewriteWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Why a file with recorded expansions was not rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Not below the base directory (includes pseudo files like `<built-in>`)
    OutsideBaseDir,
    /// A synthetic unit written by the scanner
    SyntheticUnit,
    /// Named by a line marker but not present on disk
    Missing,
}

/// A file left untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Outcome of a reconciliation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpansionReport {
    /// Whether expansion ran at all
    pub enabled: bool,
    /// Number of translation units processed
    pub units: usize,
    /// Files rewritten in place (backups next to them)
    pub rewritten: Vec<PathBuf>,
    /// Files with expansions that were left alone
    pub skipped: Vec<SkippedFile>,
    /// Non-fatal anomalies, in file then line order
    pub warnings: Vec<RewriteWarning>,
}

impl ExpansionReport {
    /// Report for a disabled run
    pub fn disabled() -> Self {
        Self::default()
    }
}
