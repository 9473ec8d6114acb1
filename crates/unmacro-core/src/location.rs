//! Source line location types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One physical line of a source file or of a preprocessed artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileLinePosition {
    /// File path
    pub file: PathBuf,
    /// Line number (1-based)
    pub line: u32,
}

impl FileLinePosition {
    /// Create a new position
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl std::fmt::Display for FileLinePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}
