//! CLI command definitions for config-patch
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod apply;
pub mod check;

use apply::ApplyArgs;
use check::CheckArgs;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Apply declarative patch files to a hierarchical configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply patch files to a base configuration and print the result
    Apply(ApplyArgs),

    /// Validate patch files without applying them
    Check(CheckArgs),
}
