//! Config Patch
//!
//! Applies declarative override files to a hierarchical application
//! configuration.

use anyhow::{Result, bail};
use clap::Parser;
use config_patch::cli::apply::{ApplyArgs, is_strict, run_apply};
use config_patch::cli::check::{CheckArgs, run_check};
use config_patch::cli::{Cli, Command};
use config_patch::config::Config;
use config_patch::logging::{self, LogTarget};
use tracing::{debug, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let config = Config::load_or_default(cli.config.as_deref())?;
    debug!(?config, "loaded configuration");

    match cli.command {
        Command::Apply(args) => run_apply_command(&config, &args)?,
        Command::Check(args) => run_check_command(&args)?,
    }

    Ok(())
}

fn run_apply_command(config: &Config, args: &ApplyArgs) -> Result<()> {
    let outcome = run_apply(config, args)?;

    match &args.output {
        Some(path) => std::fs::write(path, &outcome.rendered)?,
        None => print!("{}", outcome.rendered),
    }

    if !outcome.is_clean() {
        warn!(
            applied = outcome.applied,
            failed_records = outcome.failed_records,
            failed_files = outcome.failed_files,
            "some patches were not applied"
        );
        if is_strict(config, args) {
            bail!(
                "{} record(s) and {} file(s) failed",
                outcome.failed_records,
                outcome.failed_files
            );
        }
    }
    Ok(())
}

fn run_check_command(args: &CheckArgs) -> Result<()> {
    let (report, ok) = run_check(args)?;
    print!("{}", report);
    if !ok {
        bail!("patch files contain invalid records");
    }
    Ok(())
}
