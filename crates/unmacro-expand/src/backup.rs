//! Backup restore
//!
//! Puts every `<path>.pre-em` left by a reconciliation run back over
//! `<path>`. Used to recover from a run that failed verification or was
//! interrupted part way.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use unmacro_core::{Error, Result, BACKUP_SUFFIX};
use walkdir::WalkDir;

/// Backups below `dir`, sorted by path
pub fn find_backups(dir: &Path) -> Vec<PathBuf> {
    let mut backups: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|name| name.len() > BACKUP_SUFFIX.len() && name.ends_with(BACKUP_SUFFIX))
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    backups.sort();
    backups
}

/// Rename every backup below `dir` over the file it was taken from
///
/// Returns the restored source paths.
pub fn restore_backups(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::FileNotFound(dir.display().to_string()));
    }

    let mut restored = Vec::new();
    for backup in find_backups(dir) {
        let name = backup.to_string_lossy();
        let source = PathBuf::from(&name[..name.len() - BACKUP_SUFFIX.len()]);

        info!("Restoring {} from backup", source.display());
        fs::rename(&backup, &source)?;
        restored.push(source);
    }

    Ok(restored)
}
