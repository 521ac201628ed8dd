//! Apply subcommand for config-patch CLI
//!
//! Loads a base configuration, applies patch files in order and renders the
//! result.

use crate::config::Config;
use crate::format::{OutputFormat, render_store};
use crate::reader::apply_config_file;
use crate::store::MemoryStore;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the apply subcommand
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Patch files, applied in the order given
    #[arg(value_name = "PATCH", required = true)]
    pub patches: Vec<PathBuf>,

    /// Base configuration file (overrides config)
    #[arg(short, long, value_name = "FILE")]
    pub base: Option<PathBuf>,

    /// Output format: yaml (default) or json (overrides config)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the result to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Exit with an error if any file or record fails
    #[arg(long)]
    pub strict: bool,
}

/// Result of an apply run.
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    /// The patched configuration, rendered.
    pub rendered: String,
    /// Records applied across all files.
    pub applied: usize,
    /// Records that failed across all files.
    pub failed_records: usize,
    /// Patch files that could not be read at all.
    pub failed_files: usize,
}

impl ApplyOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed_records == 0 && self.failed_files == 0
    }
}

/// Run the apply command.
pub fn run_apply(config: &Config, args: &ApplyArgs) -> Result<ApplyOutcome> {
    let base = args.base.as_ref().or(config.base.as_ref());
    let mut store = match base {
        Some(path) => MemoryStore::load(path)
            .with_context(|| format!("failed to load base configuration {}", path.display()))?,
        None => MemoryStore::new(),
    };

    let mut applied = 0;
    let mut failed_records = 0;
    let mut failed_files = 0;
    for patch_file in &args.patches {
        match apply_config_file(&mut store, patch_file) {
            Ok(report) => {
                applied += report.applied;
                failed_records += report.failures.len();
            }
            Err(_) => failed_files += 1,
        }
    }

    let format = args.format.unwrap_or(config.format);
    Ok(ApplyOutcome {
        rendered: render_store(&store, format)?,
        applied,
        failed_records,
        failed_files,
    })
}

/// Whether a non-clean run should fail the process.
pub fn is_strict(config: &Config, args: &ApplyArgs) -> bool {
    args.strict || config.strict
}
