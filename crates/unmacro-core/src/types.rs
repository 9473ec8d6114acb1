//! Core type definitions

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Suffix given to the pre-rewrite copy of a source file
pub const BACKUP_SUFFIX: &str = ".pre-em";

/// Path of the pre-rewrite copy of `source`
pub fn backup_path(source: &Path) -> PathBuf {
    with_suffix(source, BACKUP_SUFFIX)
}

/// `path` with `suffix` appended to its final component
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// One preprocessing job: a compiler invocation over a single input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Compiler executable
    pub program: String,
    /// Compiler arguments, without `-c`, `-o` and the input file
    pub args: Vec<String>,
    /// Directory the compiler runs in
    pub working_dir: PathBuf,
    /// Canonical path of the file being compiled
    pub input: PathBuf,
    /// Distinct key naming this unit's intermediate artifacts
    pub output_key: String,
}

impl TranslationUnit {
    /// Create a translation unit
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        working_dir: impl Into<PathBuf>,
        input: impl Into<PathBuf>,
        output_key: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: working_dir.into(),
            input: input.into(),
            output_key: output_key.into(),
        }
    }

    /// Path of one of this unit's intermediate artifacts
    ///
    /// Relative keys land in the working directory.
    pub fn artifact_path(&self, artifact: Artifact) -> PathBuf {
        self.working_dir
            .join(format!("{}{}", self.output_key, artifact.suffix()))
    }

    /// Arguments for `<program> -E -o <output> <args...> <input>`
    ///
    /// `input` replaces the unit's own input when given.
    pub fn preprocess_args(&self, output: &Path, input: Option<&Path>) -> Vec<String> {
        let mut args = Vec::with_capacity(self.args.len() + 4);
        args.push("-E".to_string());
        args.push("-o".to_string());
        args.push(output.to_string_lossy().into_owned());
        args.extend(self.args.iter().cloned());
        args.push(input.unwrap_or(self.input.as_path()).to_string_lossy().into_owned());
        args
    }
}

impl std::fmt::Display for TranslationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.input.display(), self.output_key)
    }
}

/// Intermediate files written next to each translation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Artifact {
    /// Preprocessed output of the unmodified input, captured before rewriting
    Baseline,
    /// Synthetic unit forcing includes and undefs before the real input
    SyntheticSource,
    /// Preprocessed output of the synthetic unit
    Customized,
    /// Preprocessed output of the rewritten input
    Verification,
}

impl Artifact {
    /// File name suffix appended to the unit's output key
    pub fn suffix(&self) -> &'static str {
        match self {
            Artifact::Baseline => ".pre-em.i",
            Artifact::SyntheticSource => ".em.c",
            Artifact::Customized => ".em.i",
            Artifact::Verification => ".post-em.i",
        }
    }

    /// Whether a path names a synthetic unit rather than a project source
    pub fn is_synthetic_source(path: &Path) -> bool {
        path.to_string_lossy()
            .ends_with(Artifact::SyntheticSource.suffix())
    }
}
