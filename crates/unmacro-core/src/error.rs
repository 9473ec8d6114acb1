//! Error types for unmacro

use crate::location::FileLinePosition;
use thiserror::Error;

/// unmacro error type
///
/// Every variant is fatal for a reconciliation run: the caller is expected
/// to propagate it and stop touching files. Recoverable anomalies are
/// reported as warnings instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Backup already exists: {0} (restore or remove it before expanding again)")]
    BackupExists(String),

    #[error("Command `{command}` failed ({status}){}", format_stderr(.stderr))]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{location}: source line without preceding line marker")]
    MalformedOutput { location: FileLinePosition },

    #[error("Verification of preprocessed output failed for {failed} translation unit(s):\n{diffs}")]
    VerificationFailed { failed: usize, diffs: String },
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim_end();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(":\n{}", stderr)
    }
}

/// Result type alias for unmacro
pub type Result<T> = std::result::Result<T, Error>;
