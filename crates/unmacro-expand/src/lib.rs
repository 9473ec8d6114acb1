//! unmacro Expand
//!
//! Rewrites C sources so every macro invocation is replaced in place by its
//! expansion, keeping line structure, `#include`s and other directives.
//!
//! ## Modules
//!
//! - `preprocessor` - Compiler invocation and line marker parsing
//! - `expansion` - Per-file, per-line table of observed expansions
//! - `scanner` - Builds the table from customized preprocessed output
//! - `reconciler` - Rewrites source files from the table
//! - `verifier` - Proves the rewrite preprocesses identically
//! - `backup` - Restores the originals kept by the reconciler

pub mod backup;
pub mod expansion;
pub mod preprocessor;
pub mod reconciler;
pub mod report;
pub mod scanner;
pub mod verifier;

pub use expansion::{ExpansionOccurrences, LineInfo, SourceFileInfo, SourceFiles};
pub use reconciler::LineReconciler;
pub use report::{ExpansionReport, RewriteWarning, SkipReason, SkippedFile, WarningKind};
pub use scanner::ExpansionScanner;

use std::path::Path;
use tracing::info;
use unmacro_core::{ReconciliationOptions, Result, TranslationUnit};

/// Expand macros in every source below `base_dir` reached by `units`
///
/// Runs scan, rewrite and verification in order. Does nothing when
/// `options.enabled` is false. Any error leaves already rewritten files and
/// their backups in place.
pub fn expand_macros(
    options: &ReconciliationOptions,
    base_dir: &Path,
    units: &[TranslationUnit],
) -> Result<ExpansionReport> {
    if !options.enabled {
        return Ok(ExpansionReport::disabled());
    }

    let reconciler = LineReconciler::new(base_dir)?;
    info!(
        "Expanding macros for {} translation units below {}",
        units.len(),
        reconciler.base_dir().display()
    );

    let files = scanner::scan_units(options, units)?;

    let mut report = ExpansionReport {
        enabled: true,
        units: units.len(),
        ..ExpansionReport::default()
    };
    reconciler.reconcile_all(&files, &mut report)?;

    verifier::verify_units(units)?;

    info!(
        "Rewrote {} files ({} skipped, {} warnings)",
        report.rewritten.len(),
        report.skipped.len(),
        report.warnings.len()
    );
    Ok(report)
}

/// Split on `\n` only, without a trailing empty piece
///
/// Unlike `str::lines`, a `\r` before the newline stays part of the line.
pub(crate) fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let body = text.strip_suffix('\n').unwrap_or(text);
    let count = if text.is_empty() { 0 } else { usize::MAX };
    body.split('\n').take(count)
}
