//! Round-trip verification
//!
//! Preprocesses every translation unit again after rewriting and compares
//! the result with the baseline captured before any file was touched. A
//! difference means a rewrite changed the program, which is always fatal.

use crate::preprocessor::{preprocess, run_checked};
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};
use unmacro_core::{Artifact, Error, Result, TranslationUnit};

/// A baseline/after mismatch for one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDiff {
    /// Unit description
    pub unit: String,
    /// `diff -u` output
    pub diff: String,
}

/// Compare two files with `diff -u`
///
/// Returns the diff text when they differ. Exit status decides, not output.
pub fn diff_files(before: &Path, after: &Path) -> Result<Option<String>> {
    let mut cmd = Command::new("diff");
    cmd.arg("-u").arg(before).arg(after);

    let output = run_checked(&mut cmd, &[0, 1])?;
    if output.status.success() {
        Ok(None)
    } else {
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}

/// Re-preprocess one unit and diff it against its baseline
pub fn verify_unit(unit: &TranslationUnit) -> Result<Option<UnitDiff>> {
    info!("Verifying preprocessed output of {}...", unit);

    let baseline = unit.artifact_path(Artifact::Baseline);
    if !baseline.exists() {
        return Err(Error::FileNotFound(baseline.display().to_string()));
    }

    let after = unit.artifact_path(Artifact::Verification);
    preprocess(unit, &after, None)?;

    Ok(diff_files(&baseline, &after)?.map(|diff| {
        warn!("Preprocessed output of {} changed:\n{}", unit, diff);
        UnitDiff {
            unit: unit.to_string(),
            diff,
        }
    }))
}

/// Verify every unit, failing with all diffs if any unit changed
pub fn verify_units(units: &[TranslationUnit]) -> Result<()> {
    let mut diffs = Vec::new();
    for unit in units {
        if let Some(diff) = verify_unit(unit)? {
            diffs.push(diff);
        }
    }

    if diffs.is_empty() {
        info!("Verified {} translation units", units.len());
        return Ok(());
    }

    Err(Error::VerificationFailed {
        failed: diffs.len(),
        diffs: diffs
            .iter()
            .map(|d| format!("--- {}\n{}", d.unit, d.diff))
            .collect::<Vec<_>>()
            .join("\n"),
    })
}
