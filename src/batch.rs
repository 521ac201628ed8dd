//! Best-effort application of a batch of patch records.
//!
//! Every record is parsed and applied on its own. A record that fails is
//! reported with its reason and does not stop the records after it; there is
//! no rollback of records that already succeeded.

use crate::command::{self, ParseError, PatchCommand, RawRecord};
use crate::patch::{self, Operation, PatchError};
use crate::store::ConfigStore;
use crate::value::{ConfigValue, DisplayPath, DisplayTerm};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Why a single record was not applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FailureReason {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// A failed record together with the reason it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub reason: FailureReason,
    pub record: RawRecord,
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error applying {}: {}",
            DisplayTerm(&self.record),
            self.reason
        )
    }
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Records applied successfully.
    pub applied: usize,
    /// Failed records, in input order.
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.applied + self.failures.len()
    }

    pub fn into_result(self) -> Result<(), Vec<BatchFailure>> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(self.failures)
        }
    }
}

/// Apply every record, collecting failures instead of stopping at the first.
pub fn apply_all<S>(store: &mut S, records: &[RawRecord]) -> Result<(), Vec<BatchFailure>>
where
    S: ConfigStore + ?Sized,
{
    apply_all_with_report(store, records).into_result()
}

/// Same as [`apply_all`], also counting the records that went through.
pub fn apply_all_with_report<S>(store: &mut S, records: &[RawRecord]) -> BatchReport
where
    S: ConfigStore + ?Sized,
{
    let mut report = BatchReport::default();
    for record in records {
        match apply_one(store, record) {
            Ok(()) => report.applied += 1,
            Err(reason) => report.failures.push(BatchFailure {
                reason,
                record: record.clone(),
            }),
        }
    }
    report
}

fn apply_one<S>(store: &mut S, record: &RawRecord) -> Result<(), FailureReason>
where
    S: ConfigStore + ?Sized,
{
    let PatchCommand { scope, path, op } = command::parse(record)?;

    if path.is_empty() && matches!(op, Operation::Unset) {
        store.unset(&scope);
        debug!(scope = %scope, "unset parameter");
        return Ok(());
    }

    let old = store.get(&scope).unwrap_or_else(ConfigValue::empty_list);
    let new = patch::patch(old, &path, op)?;
    store.set(&scope, new);
    debug!(scope = %scope, path = %DisplayPath(&path), "applied patch");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Scope;
    use crate::store::MemoryStore;

    fn records(src: &str) -> Vec<RawRecord> {
        serde_yaml::from_str(src).unwrap()
    }

    #[test]
    fn test_absent_scope_starts_empty() {
        let mut store = MemoryStore::new();
        apply_all(&mut store, &records("- [set, app, p, a, 1]")).unwrap();
        assert_eq!(
            store.get(&Scope::new("app", "p")),
            Some(ConfigValue::from_yaml(serde_yaml::from_str("{a: 1}").unwrap()))
        );
    }

    #[test]
    fn test_unset_whole_parameter() {
        let mut store = MemoryStore::new();
        let scope = Scope::new("app", "p");
        store.set(&scope, ConfigValue::leaf(5));
        apply_all(&mut store, &records("- [unset, app, p]")).unwrap();
        assert!(store.get(&scope).is_none());
    }

    #[test]
    fn test_failures_keep_order_and_do_not_stop_batch() {
        let mut store = MemoryStore::new();
        let input = records(
            "- [bogus, app, p]\n- [set, app, p, a, 1]\n- not-a-record\n- [set, app, p, b, 2]\n",
        );
        let report = apply_all_with_report(&mut store, &input);
        assert_eq!(report.applied, 2);
        assert_eq!(report.total(), 4);
        assert_eq!(
            report.failures,
            vec![
                BatchFailure {
                    reason: ParseError::UnknownCommand("bogus".to_string()).into(),
                    record: input[0].clone(),
                },
                BatchFailure {
                    reason: ParseError::NotATuple.into(),
                    record: input[2].clone(),
                },
            ]
        );
    }

    #[test]
    fn test_failure_display() {
        let failure = BatchFailure {
            reason: ParseError::TupleTooShort.into(),
            record: serde_yaml::from_str("[set, app]").unwrap(),
        };
        assert_eq!(
            failure.to_string(),
            "error applying [set, app]: patch record has too few fields"
        );
    }
}
