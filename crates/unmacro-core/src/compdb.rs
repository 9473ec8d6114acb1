//! Compilation database loading
//!
//! Turns the entries of a `compile_commands.json` into [`TranslationUnit`]s.

use crate::error::{Error, Result};
use crate::types::TranslationUnit;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One entry of `compile_commands.json`
#[derive(Debug, Clone, Deserialize)]
pub struct CompileCommand {
    pub directory: PathBuf,
    pub file: PathBuf,
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl CompileCommand {
    /// Full argument vector, program first
    fn argv(&self) -> Result<Vec<String>> {
        let argv = match (&self.arguments, &self.command) {
            (Some(arguments), _) => arguments.clone(),
            (None, Some(command)) => shlex::split(command).ok_or_else(|| {
                Error::Config(format!("cannot split command for {}", self.file.display()))
            })?,
            (None, None) => {
                return Err(Error::Config(format!(
                    "entry for {} has neither `arguments` nor `command`",
                    self.file.display()
                )))
            }
        };

        if argv.is_empty() {
            return Err(Error::Config(format!(
                "empty command for {}",
                self.file.display()
            )));
        }
        Ok(argv)
    }
}

/// Load every entry of a compilation database as a translation unit
///
/// Relative `directory` values are taken relative to the database itself.
pub fn load(path: &Path) -> Result<Vec<TranslationUnit>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    let commands: Vec<CompileCommand> = serde_json::from_str(&content)?;
    let db_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut keys = HashSet::new();
    commands
        .iter()
        .map(|cmd| to_translation_unit(cmd, db_dir, &mut keys))
        .collect()
}

/// Convert one entry, reserving a distinct output key in `keys`
pub fn to_translation_unit(
    cmd: &CompileCommand,
    db_dir: &Path,
    keys: &mut HashSet<String>,
) -> Result<TranslationUnit> {
    let directory = db_dir.join(&cmd.directory);
    let input_path = directory.join(&cmd.file);
    let input = input_path
        .canonicalize()
        .map_err(|_| Error::FileNotFound(input_path.display().to_string()))?;

    let argv = cmd.argv()?;
    let program = argv[0].clone();
    let args = strip_io_args(&argv[1..], &directory, &cmd.file, &input);

    let base_key = match &cmd.output {
        Some(output) => output.with_extension("").to_string_lossy().into_owned(),
        None => cmd.file.to_string_lossy().into_owned(),
    };
    let output_key = reserve_key(keys, base_key);

    Ok(TranslationUnit::new(program, args, directory, input, output_key))
}

/// Drop `-c`, `-o <file>` and the input file from compiler arguments
fn strip_io_args(args: &[String], directory: &Path, file: &Path, input: &Path) -> Vec<String> {
    let mut kept = Vec::with_capacity(args.len());
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == "-c" {
            continue;
        }
        if arg == "-o" {
            iter.next();
            continue;
        }
        if arg.starts_with("-o") && arg.len() > 2 {
            continue;
        }
        if !arg.starts_with('-') && names_input(arg, directory, file, input) {
            continue;
        }
        kept.push(arg.clone());
    }

    kept
}

fn names_input(arg: &str, directory: &Path, file: &Path, input: &Path) -> bool {
    let candidate = directory.join(arg);
    Path::new(arg) == file
        || candidate == directory.join(file)
        || candidate.canonicalize().map(|c| c == input).unwrap_or(false)
}

/// Append `.1`, `.2`, ... until the key is unused
fn reserve_key(keys: &mut HashSet<String>, base: String) -> String {
    if keys.insert(base.clone()) {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}.{}", base, n);
        if keys.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
