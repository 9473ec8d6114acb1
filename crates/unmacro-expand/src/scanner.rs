//! Expansion scanning
//!
//! Preprocesses every translation unit twice: once unmodified, to keep a
//! baseline for verification, and once through a synthetic unit that forces
//! the configured includes and undefs before including the real input. The
//! second output is mapped back onto source lines through its line markers.

use crate::expansion::SourceFiles;
use crate::preprocessor::{preprocess, GnuLineMarkers, LineMarkerDialect, PreprocessedLine};
use crate::split_lines;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use unmacro_core::{
    Artifact, Error, FileLinePosition, ReconciliationOptions, Result, TranslationUnit,
};

/// Builds the per-line expansion table from preprocessed output
pub struct ExpansionScanner<'a> {
    options: &'a ReconciliationOptions,
    dialect: Box<dyn LineMarkerDialect>,
    /// Marker file name -> resolved path, for the unit being ingested
    resolved: HashMap<String, PathBuf>,
}

impl<'a> ExpansionScanner<'a> {
    /// Create a scanner reading GNU line markers
    pub fn new(options: &'a ReconciliationOptions) -> Self {
        Self::with_dialect(options, Box::new(GnuLineMarkers::new()))
    }

    /// Create a scanner for another marker dialect
    pub fn with_dialect(
        options: &'a ReconciliationOptions,
        dialect: Box<dyn LineMarkerDialect>,
    ) -> Self {
        Self {
            options,
            dialect,
            resolved: HashMap::new(),
        }
    }

    /// Preprocess the unit's real input into its baseline artifact
    pub fn capture_baseline(&self, unit: &TranslationUnit) -> Result<PathBuf> {
        info!("Saving original preprocessed output of {}...", unit);
        let baseline = unit.artifact_path(Artifact::Baseline);
        create_parent_dir(&baseline)?;
        preprocess(unit, &baseline, None)?;
        Ok(baseline)
    }

    /// Text of the synthetic unit: forced includes, forced undefs, then the input
    pub fn synthetic_source(&self, unit: &TranslationUnit) -> String {
        let mut source = String::new();
        for include in &self.options.forced_includes {
            source.push_str(&format!("#include {}\n", include));
        }
        for name in &self.options.forced_undefs {
            source.push_str(&format!("#undef {}\n", name));
        }
        source.push_str(&format!(
            "#include \"{}\"\n",
            escape_include(&unit.input.to_string_lossy())
        ));
        source
    }

    /// Run the customized preprocess pass for one unit and record its expansions
    pub fn scan_unit(&mut self, unit: &TranslationUnit, files: &mut SourceFiles) -> Result<()> {
        info!("Scanning customized preprocessed output of {}...", unit);

        let synthetic = unit.artifact_path(Artifact::SyntheticSource);
        create_parent_dir(&synthetic)?;
        fs::write(&synthetic, self.synthetic_source(unit))?;

        let customized = unit.artifact_path(Artifact::Customized);
        preprocess(unit, &customized, Some(&synthetic))?;

        let output = fs::read_to_string(&customized)?;
        self.ingest(&output, &customized, &unit.working_dir, files)
    }

    /// Attribute every content line of `output` to the source line its markers name
    ///
    /// `artifact` is only used to tag occurrences; marker file names are
    /// resolved against `working_dir`.
    pub fn ingest(
        &mut self,
        output: &str,
        artifact: &Path,
        working_dir: &Path,
        files: &mut SourceFiles,
    ) -> Result<()> {
        self.resolved.clear();
        // `None` line: the previous content line was the last representable one
        let mut current: Option<(PathBuf, Option<u32>)> = None;
        let mut content_lines = 0usize;

        for (index, text) in split_lines(output).enumerate() {
            let at = FileLinePosition::new(artifact, index as u32 + 1);

            match self.dialect.parse(text) {
                PreprocessedLine::Marker { file, line } => {
                    let path = self.resolve(&file, working_dir);
                    current = Some((path, Some(line)));
                }
                PreprocessedLine::Content(text) => {
                    let (file, next) = current
                        .as_mut()
                        .ok_or_else(|| Error::MalformedOutput {
                            location: at.clone(),
                        })?;
                    let line = next.ok_or_else(|| Error::MalformedOutput {
                        location: at.clone(),
                    })?;

                    let info = files.line_mut(file.as_path(), line);
                    if text.is_empty() {
                        info.record_blank();
                    } else {
                        info.record_expansion(text, at);
                    }
                    *next = line.checked_add(1);
                    content_lines += 1;
                }
            }
        }

        debug!(
            "{}: {} content lines attributed ({} markers)",
            artifact.display(),
            content_lines,
            self.dialect.name()
        );
        Ok(())
    }

    /// Canonical path for a marker file name
    ///
    /// Pseudo files such as `<built-in>` and names that do not exist on disk
    /// are kept as written (joined to the working directory when relative).
    fn resolve(&mut self, name: &str, working_dir: &Path) -> PathBuf {
        if let Some(path) = self.resolved.get(name) {
            return path.clone();
        }

        let path = if name.starts_with('<') && name.ends_with('>') {
            PathBuf::from(name)
        } else {
            let joined = working_dir.join(name);
            joined.canonicalize().unwrap_or(joined)
        };

        self.resolved.insert(name.to_string(), path.clone());
        path
    }
}

/// Artifact keys may contain directories, e.g. `obj/main` from an `output` entry
fn create_parent_dir(artifact: &Path) -> Result<()> {
    if let Some(parent) = artifact.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Quote a path for `#include "..."`, the inverse of marker name unescaping
fn escape_include(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '\\' || c == '"' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Capture baselines and scan every unit, in order
pub fn scan_units(
    options: &ReconciliationOptions,
    units: &[TranslationUnit],
) -> Result<SourceFiles> {
    let mut scanner = ExpansionScanner::new(options);

    for unit in units {
        scanner.capture_baseline(unit)?;
    }

    let mut files = SourceFiles::new();
    for unit in units {
        scanner.scan_unit(unit, &mut files)?;
    }

    info!("Collected expansions for {} files", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn options() -> ReconciliationOptions {
        ReconciliationOptions {
            enabled: true,
            forced_includes: vec!["<stdio.h>".into(), "\"config.h\"".into()],
            forced_undefs: vec!["assert".into()],
        }
    }

    #[test]
    fn test_synthetic_source() {
        let opts = options();
        let scanner = ExpansionScanner::new(&opts);
        let unit = TranslationUnit::new("cc", vec![], "/b", "/p/src/main.c", "main");

        assert_eq!(
            scanner.synthetic_source(&unit),
            "#include <stdio.h>\n#include \"config.h\"\n#undef assert\n#include \"/p/src/main.c\"\n"
        );
    }

    #[test]
    fn test_ingest_attributes_lines() {
        let opts = options();
        let mut scanner = ExpansionScanner::new(&opts);
        let mut files = SourceFiles::new();

        let output = "\
# 1 \"/p/a.c\"

int a[3];
# 10 \"/p/a.c\"
foo();
";
        scanner
            .ingest(output, Path::new("a.em.i"), Path::new("/"), &mut files)
            .unwrap();

        let a = files.get(Path::new("/p/a.c")).unwrap();
        assert!(a.line(1).unwrap().saw_blank_expansion);
        assert!(a.line(1).unwrap().expansions().is_empty());

        let line2 = a.line(2).unwrap().expansions();
        assert_eq!(line2.len(), 1);
        assert_eq!(line2[0].text, "int a[3];");
        assert_eq!(line2[0].locations, vec![FileLinePosition::new("a.em.i", 3)]);

        assert!(a.line(3).is_none());
        assert_eq!(a.line(10).unwrap().expansions()[0].text, "foo();");
    }

    #[test]
    fn test_ingest_merges_units() {
        let opts = options();
        let mut scanner = ExpansionScanner::new(&opts);
        let mut files = SourceFiles::new();

        scanner
            .ingest("# 2 \"/p/x.c\"\nfoo();\n", Path::new("u1.em.i"), Path::new("/"), &mut files)
            .unwrap();
        scanner
            .ingest("# 2 \"/p/x.c\"\n\n", Path::new("u2.em.i"), Path::new("/"), &mut files)
            .unwrap();
        scanner
            .ingest("# 2 \"/p/x.c\"\nbar();\n", Path::new("u3.em.i"), Path::new("/"), &mut files)
            .unwrap();

        let line = files.get(Path::new("/p/x.c")).unwrap().line(2).unwrap();
        assert!(line.saw_blank_expansion);
        let texts: Vec<_> = line.expansions().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["foo();", "bar();"]);
    }

    #[test]
    fn test_content_before_marker_is_malformed() {
        let opts = options();
        let mut scanner = ExpansionScanner::new(&opts);
        let mut files = SourceFiles::new();

        let err = scanner
            .ingest("int x;\n# 1 \"a.c\"\n", Path::new("bad.em.i"), Path::new("/"), &mut files)
            .unwrap_err();
        match err {
            Error::MalformedOutput { location } => {
                assert_eq!(location, FileLinePosition::new("bad.em.i", 1));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_synthetic_source_escapes_input_path() {
        let opts = ReconciliationOptions::enabled();
        let scanner = ExpansionScanner::new(&opts);
        let unit = TranslationUnit::new("cc", vec![], "/b", "/p/we\"ird\\dir/a.c", "a");

        assert_eq!(
            scanner.synthetic_source(&unit),
            "#include \"/p/we\\\"ird\\\\dir/a.c\"\n"
        );
    }

    #[test]
    fn test_line_number_overflow_is_malformed() {
        let opts = options();
        let mut scanner = ExpansionScanner::new(&opts);
        let mut files = SourceFiles::new();

        let output = "# 4294967295 \"/p/a.c\"\nint last;\nint beyond;\n";
        let err = scanner
            .ingest(output, Path::new("big.em.i"), Path::new("/"), &mut files)
            .unwrap_err();
        match err {
            Error::MalformedOutput { location } => {
                assert_eq!(location, FileLinePosition::new("big.em.i", 3));
            }
            other => panic!("unexpected error: {}", other),
        }
        let a = files.get(Path::new("/p/a.c")).unwrap();
        assert_eq!(a.line(u32::MAX).unwrap().expansions()[0].text, "int last;");
    }

    #[test]
    fn test_nested_key_directory_is_created() {
        let temp = TempDir::new().unwrap();
        let unit = TranslationUnit::new("cc", vec![], temp.path(), "/p/a.c", "obj/a");
        let synthetic = unit.artifact_path(Artifact::SyntheticSource);

        create_parent_dir(&synthetic).unwrap();
        assert!(temp.path().join("obj").is_dir());
    }

    #[test]
    fn test_relative_marker_names_resolve_against_working_dir() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("include")).unwrap();
        fs::write(root.join("include/defs.h"), "int x;\n").unwrap();

        let opts = options();
        let mut scanner = ExpansionScanner::new(&opts);
        let mut files = SourceFiles::new();

        let output = "\
# 0 \"<built-in>\"
# 1 \"include/../include/defs.h\" 1
int x;
";
        scanner
            .ingest(output, Path::new("m.em.i"), &root, &mut files)
            .unwrap();

        assert!(files.get(&root.join("include/defs.h")).is_some());
        assert!(files.get(Path::new("<built-in>")).is_none());
    }
}
