//! Reading patch files and applying them to a store.
//!
//! A patch file is a YAML sequence of records:
//!
//! ```yaml
//! - [set, web, listeners, http, port, 8080]
//! - [replace, web, listeners, https, !record [https, tls, {port: 8443}]]
//! - [unset, web, legacy_mode]
//! ```

use crate::batch::{self, BatchReport};
use crate::command::RawRecord;
use crate::store::ConfigStore;
use serde_yaml::Value;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};

/// Machine-readable cause of a [`FileReadError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFailure {
    Io(std::io::ErrorKind),
    /// YAML syntax error; positions are 0 when the parser gives none.
    Syntax { line: usize, column: usize },
    NotASequence,
}

/// A patch file that could not be turned into records. Nothing is applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FileReadError {
    pub reason: ReadFailure,
    pub message: String,
}

/// Parse patch file content into raw records.
pub fn parse_records(content: &str) -> Result<Vec<RawRecord>, FileReadError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let document: Value = serde_yaml::from_str(content).map_err(|e| {
        let (line, column) = e
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((0, 0));
        FileReadError {
            reason: ReadFailure::Syntax { line, column },
            message: e.to_string(),
        }
    })?;
    match document {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(records) => Ok(records),
        _ => Err(FileReadError {
            reason: ReadFailure::NotASequence,
            message: "patch file must be a sequence of records".to_string(),
        }),
    }
}

/// Read a patch file into raw records.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>, FileReadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| FileReadError {
        reason: ReadFailure::Io(e.kind()),
        message: format!("failed to read {}: {}", path.display(), e),
    })?;
    parse_records(&content)
}

/// Read a patch file and apply all of its records to `store`.
///
/// A file that cannot be read is logged once and leaves the store untouched.
/// Otherwise one error line is logged per failed record. Both outcomes are
/// also returned so callers can decide on an exit status.
pub fn apply_config_file<S, P>(store: &mut S, path: P) -> Result<BatchReport, FileReadError>
where
    S: ConfigStore + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let records = read_records(path).inspect_err(|e| {
        error!(file = %path.display(), reason = ?e.reason, "{}", e.message);
    })?;

    let report = batch::apply_all_with_report(store, &records);
    for failure in &report.failures {
        error!(file = %path.display(), "{}", failure);
    }
    info!(
        file = %path.display(),
        applied = report.applied,
        failed = report.failures.len(),
        "applied patch file"
    );
    Ok(report)
}
