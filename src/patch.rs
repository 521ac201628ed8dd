//! Path-based patching of a configuration tree.
//!
//! [`patch`] walks a path of keys through nested association lists and applies
//! one [`Operation`] at the end of it:
//! - a missing key is created on the fly for `set`/`replace`, with the new
//!   entry placed first;
//! - a missing key is ignored for `unset`;
//! - descending into anything that is not an association list fails with
//!   [`PatchError::TupleListExpected`], carrying the full key path from the
//!   root to the offending value.

use crate::value::{ConfigValue, DisplayPath, Record, Term};
use thiserror::Error;
use tracing::info;

/// What to do at the end of a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Replace the value found at the path.
    SetTerm(ConfigValue),
    /// Replace the whole entry keyed by the last path element, metadata included.
    ReplaceEntry(Record),
    /// Remove the entry keyed by the last path element.
    Unset,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatchError {
    #[error("expected an association list at {}, found {value}", DisplayPath(.path))]
    TupleListExpected { path: Vec<Term>, value: ConfigValue },

    #[error("replace and unset need at least one key")]
    EmptyPath,
}

impl PatchError {
    /// Attach the key of the enclosing entry in front of the failing path.
    fn under(self, key: &Term) -> Self {
        match self {
            PatchError::TupleListExpected { mut path, value } => {
                path.insert(0, key.clone());
                PatchError::TupleListExpected { path, value }
            }
            other => other,
        }
    }
}

/// Apply `op` at `path` inside `old`, returning the patched tree.
///
/// Untouched entries are moved into the result as-is and keep their order.
pub fn patch(old: ConfigValue, path: &[Term], op: Operation) -> Result<ConfigValue, PatchError> {
    let Some((key, rest)) = path.split_first() else {
        return match op {
            Operation::SetTerm(term) => Ok(term),
            Operation::ReplaceEntry(_) | Operation::Unset => Err(PatchError::EmptyPath),
        };
    };

    let mut entries = match old {
        ConfigValue::AssocList(entries) => entries,
        // a bare `[]` is the empty association list too
        empty if empty.is_empty_list() => Vec::new(),
        other => {
            return Err(PatchError::TupleListExpected {
                path: vec![key.clone()],
                value: other,
            });
        }
    };
    let position = entries.iter().position(|entry| entry.key == *key);

    match (rest.is_empty(), op) {
        (true, Operation::ReplaceEntry(record)) => {
            if let Some(i) = position {
                entries.remove(i);
            }
            entries.insert(0, record);
            Ok(ConfigValue::AssocList(entries))
        }
        (true, Operation::Unset) => {
            if let Some(i) = position {
                entries.remove(i);
            }
            Ok(ConfigValue::AssocList(entries))
        }
        (_, op) => match position {
            Some(i) => {
                let entry = &mut entries[i];
                let last = std::mem::replace(&mut *entry.value, ConfigValue::empty_list());
                *entry.value = patch(last, rest, op).map_err(|e| e.under(key))?;
                Ok(ConfigValue::AssocList(entries))
            }
            None => {
                if let Some(entry) = wrap_absent(key, rest, op) {
                    info!(
                        path = %DisplayPath(path),
                        "configuring previously-absent path"
                    );
                    entries.insert(0, entry);
                }
                Ok(ConfigValue::AssocList(entries))
            }
        },
    }
}

/// Build the chain of single-entry lists that materializes a missing path.
///
/// Returns `None` for `Unset`, which never creates anything.
fn wrap_absent(key: &Term, rest: &[Term], op: Operation) -> Option<Record> {
    let (keys, inner) = match op {
        Operation::SetTerm(term) => (rest, term),
        Operation::ReplaceEntry(record) => {
            // the record stands in for the last key of the path
            let outer = rest.split_last().map_or(rest, |(_, outer)| outer);
            (outer, ConfigValue::AssocList(vec![record]))
        }
        Operation::Unset => return None,
    };
    Some(Record::pair(key.clone(), wrap_keys(keys, inner)))
}

fn wrap_keys(keys: &[Term], inner: ConfigValue) -> ConfigValue {
    keys.iter().rev().fold(inner, |value, key| {
        ConfigValue::AssocList(vec![Record::pair(key.clone(), value)])
    })
}
