//! Preprocessor invocation
//!
//! Runs a translation unit's compiler in preprocess-only mode, writing the
//! output to a named file. Every child process goes through [`run_checked`],
//! which turns a spawn failure or an unexpected exit status into a fatal
//! [`Error::CommandFailed`].

use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::debug;
use unmacro_core::{Error, Result, TranslationUnit};

/// Run a command to completion, failing unless it exits with one of `accepted`
///
/// Stdout and stderr are captured and returned to the caller.
pub fn run_checked(cmd: &mut Command, accepted: &[i32]) -> Result<Output> {
    let command = describe(cmd);
    debug!("Running: {}", command);

    let output = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| Error::CommandFailed {
            command: command.clone(),
            status: format!("could not start: {}", e),
            stderr: String::new(),
        })?;

    match output.status.code() {
        Some(code) if accepted.contains(&code) => Ok(output),
        _ => Err(Error::CommandFailed {
            command,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }),
    }
}

/// Preprocess a translation unit into `output`
///
/// Runs `<program> -E -o <output> <args...> <input>` in the unit's working
/// directory; `input_override` replaces the unit's own input file.
pub fn preprocess(
    unit: &TranslationUnit,
    output: &Path,
    input_override: Option<&Path>,
) -> Result<()> {
    let mut cmd = Command::new(&unit.program);
    cmd.args(unit.preprocess_args(output, input_override))
        .current_dir(&unit.working_dir);

    run_checked(&mut cmd, &[0])?;
    Ok(())
}

fn describe(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}
