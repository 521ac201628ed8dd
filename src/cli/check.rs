//! Check subcommand for config-patch CLI
//!
//! Reads and parses patch files without applying anything.

use crate::batch::FailureReason;
use crate::command;
use crate::format::{FailureEntry, format_failures_text};
use crate::reader::read_records;
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

/// Arguments for the check subcommand
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Patch files to validate
    #[arg(value_name = "PATCH", required = true)]
    pub patches: Vec<PathBuf>,

    /// Report format: text (default) or json
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    pub format: ReportFormat,
}

/// Output format for check reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!(
                "Invalid format '{}'. Valid options: text, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

/// Check result for one patch file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub records: usize,
    /// Set when the file could not be read or parsed as a whole.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub failures: Vec<FailureEntry>,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.failures.is_empty()
    }
}

/// Parse every record of a file, collecting the ones that fail.
pub fn check_file(path: &std::path::Path) -> FileReport {
    let file = path.display().to_string();
    let records = match read_records(path) {
        Ok(records) => records,
        Err(e) => {
            return FileReport {
                file,
                records: 0,
                error: Some(e.message),
                failures: Vec::new(),
            };
        }
    };

    let failures = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            command::parse(record)
                .err()
                .map(|e| FailureEntry::new(index, &FailureReason::Parse(e), record))
        })
        .collect();

    FileReport {
        file,
        records: records.len(),
        error: None,
        failures,
    }
}

/// Run the check command, returning the rendered report and whether all files passed.
pub fn run_check(args: &CheckArgs) -> Result<(String, bool)> {
    let reports: Vec<FileReport> = args.patches.iter().map(|p| check_file(p)).collect();
    let ok = reports.iter().all(FileReport::is_ok);

    let rendered = match args.format {
        ReportFormat::Json => serde_json::to_string_pretty(&reports)? + "\n",
        ReportFormat::Text => {
            let mut out = String::new();
            for report in &reports {
                match &report.error {
                    Some(error) => out.push_str(&format!("{}: {}\n", report.file, error)),
                    None if report.failures.is_empty() => {
                        out.push_str(&format!("{}: {} records ok\n", report.file, report.records))
                    }
                    None => {
                        out.push_str(&format!(
                            "{}: {} of {} records invalid\n",
                            report.file,
                            report.failures.len(),
                            report.records
                        ));
                        out.push_str(&format_failures_text(&report.failures));
                    }
                }
            }
            out
        }
    };
    Ok((rendered, ok))
}
