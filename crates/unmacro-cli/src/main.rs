//! unmacro CLI
//!
//! Command-line interface for in-place macro expansion.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use unmacro_core::{compdb, Config, ReconciliationOptions};
use unmacro_expand::{backup, expand_macros, verifier, ExpansionReport};

#[derive(Parser)]
#[command(name = "unmacro")]
#[command(author, version, about = "Expand C macros in place, verified by re-preprocessing", long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite sources so macro invocations are replaced by their expansions
    Expand {
        /// compile_commands.json describing the translation units
        #[arg(short = 'p', long, value_name = "FILE")]
        compile_commands: PathBuf,

        /// Only rewrite sources below this directory
        #[arg(short, long, value_name = "DIR")]
        base_dir: Option<PathBuf>,

        /// YAML or JSON configuration file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Header to include before the undefs, e.g. '<stdio.h>' (repeatable)
        #[arg(long = "include", value_name = "TARGET")]
        includes: Vec<String>,

        /// Macro to keep unexpanded (repeatable)
        #[arg(long = "undef", value_name = "MACRO")]
        undefs: Vec<String>,

        /// Do nothing (overrides the configuration file)
        #[arg(long)]
        disable: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Re-check preprocessed output against the baseline of a previous run
    Verify {
        /// compile_commands.json describing the translation units
        #[arg(short = 'p', long, value_name = "FILE")]
        compile_commands: PathBuf,
    },

    /// Put the originals saved by a previous run back in place
    Restore {
        /// Directory to search for backups
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Expand {
            compile_commands,
            base_dir,
            config,
            includes,
            undefs,
            disable,
            format,
        } => {
            let config = load_config(config.as_deref(), base_dir, includes, undefs, disable)?;
            cmd_expand(&compile_commands, &config, &format)?;
        }
        Commands::Verify { compile_commands } => {
            cmd_verify(&compile_commands)?;
        }
        Commands::Restore { dir } => {
            cmd_restore(&dir)?;
        }
    }

    Ok(())
}

/// Configuration file (if any) with command-line overrides applied
fn load_config(
    path: Option<&Path>,
    base_dir: Option<PathBuf>,
    includes: Vec<String>,
    undefs: Vec<String>,
    disable: bool,
) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config {
            expand: ReconciliationOptions::enabled(),
            ..Config::default()
        },
    };

    if let Some(base_dir) = base_dir {
        config.base_dir = base_dir;
    }
    config.expand.forced_includes.extend(includes);
    config.expand.forced_undefs.extend(undefs);
    if disable {
        config.expand.enabled = false;
    }

    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

fn cmd_expand(compile_commands: &Path, config: &Config, format: &str) -> Result<()> {
    let units = compdb::load(compile_commands)?;
    let report = expand_macros(&config.expand, &config.base_dir, &units)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print_report(&report),
        other => bail!("Unknown format: {}", other),
    }

    Ok(())
}

fn print_report(report: &ExpansionReport) {
    if !report.enabled {
        println!("Macro expansion disabled, nothing to do");
        return;
    }

    println!("📂 Expanded macros for {} translation units", report.units);
    println!("   Rewritten: {}", report.rewritten.len());
    for path in &report.rewritten {
        println!("     {}", path.display());
    }
    println!("   Skipped: {}", report.skipped.len());

    if !report.warnings.is_empty() {
        println!("\n⚠️  Warnings:");
        for warning in &report.warnings {
            println!("   {}", warning);
        }
    }
}

fn cmd_verify(compile_commands: &Path) -> Result<()> {
    let units = compdb::load(compile_commands)?;
    verifier::verify_units(&units)?;
    println!("✅ {} translation units preprocess as before", units.len());
    Ok(())
}

fn cmd_restore(dir: &Path) -> Result<()> {
    let restored = backup::restore_backups(dir)?;
    if restored.is_empty() {
        println!("No backups found under {}", dir.display());
    } else {
        println!("🔄 Restored {} files:", restored.len());
        for path in &restored {
            println!("   {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_expand() {
        let cli = Cli::try_parse_from([
            "unmacro",
            "expand",
            "-p",
            "build/compile_commands.json",
            "--include",
            "<stdio.h>",
            "--undef",
            "assert",
            "--undef",
            "NDEBUG",
        ])
        .unwrap();

        match cli.command {
            Commands::Expand {
                compile_commands,
                includes,
                undefs,
                disable,
                format,
                ..
            } => {
                assert_eq!(compile_commands, PathBuf::from("build/compile_commands.json"));
                assert_eq!(includes, vec!["<stdio.h>"]);
                assert_eq!(undefs, vec!["assert", "NDEBUG"]);
                assert!(!disable);
                assert_eq!(format, "text");
            }
            _ => panic!("expected expand"),
        }
    }

    #[test]
    fn test_overrides_apply_to_defaults() {
        let config = load_config(
            None,
            Some(PathBuf::from("/src")),
            vec!["<stdlib.h>".into()],
            vec!["MAX".into()],
            false,
        )
        .unwrap();

        assert_eq!(config.base_dir, PathBuf::from("/src"));
        assert!(config.expand.enabled);
        assert_eq!(config.expand.forced_includes, vec!["<stdlib.h>"]);
        assert_eq!(config.expand.forced_undefs, vec!["MAX"]);

        let disabled = load_config(None, None, vec![], vec![], true).unwrap();
        assert!(!disabled.expand.enabled);
        assert_eq!(disabled.base_dir, PathBuf::from("."));
    }
}
