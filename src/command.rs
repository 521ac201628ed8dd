//! Parsing of raw patch records into patch commands.
//!
//! A record is a YAML sequence starting with a command tag:
//! - `[set, App, Param, P1..PN, Replacement]`, N >= 0
//! - `[replace, App, Param, P1..PN, Entry]`, N >= 1
//! - `[unset, App, Param, P1..PN]`, N >= 0

use crate::patch::Operation;
use crate::value::{ConfigValue, DisplayTerm, Record, Term};
use serde_yaml::Value;
use std::fmt;
use thiserror::Error;

/// A record exactly as read from a patch file.
pub type RawRecord = Value;

/// The top-level `(app, param)` entry a patch applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    pub app: Term,
    pub param: Term,
}

impl Scope {
    pub fn new(app: impl Into<Term>, param: impl Into<Term>) -> Self {
        Self {
            app: app.into(),
            param: param.into(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", DisplayTerm(&self.app), DisplayTerm(&self.param))
    }
}

/// A validated patch: where it applies and what it does.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchCommand {
    pub scope: Scope,
    pub path: Vec<Term>,
    pub op: Operation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("patch record is not a sequence")]
    NotATuple,

    #[error("patch record has too few fields")]
    TupleTooShort,

    #[error("unknown patch command: {0}")]
    UnknownCommand(String),

    #[error("replacement entry must have a key and a value, found {0}")]
    EntryExpected(String),
}

/// Supported command tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandTag {
    Set,
    Replace,
    Unset,
}

impl CommandTag {
    fn from_term(term: &Term) -> Option<Self> {
        match term.as_str()? {
            "set" => Some(CommandTag::Set),
            "replace" => Some(CommandTag::Replace),
            "unset" => Some(CommandTag::Unset),
            _ => None,
        }
    }

    /// Fields required after the tag.
    fn min_fields(self) -> usize {
        match self {
            CommandTag::Set => 3,
            CommandTag::Replace => 4,
            CommandTag::Unset => 2,
        }
    }
}

/// Parse one raw record.
pub fn parse(raw: &RawRecord) -> Result<PatchCommand, ParseError> {
    let fields = match raw {
        Value::Sequence(fields) => fields.as_slice(),
        _ => return Err(ParseError::NotATuple),
    };
    let (tag, args) = fields.split_first().ok_or(ParseError::TupleTooShort)?;
    let tag = CommandTag::from_term(tag)
        .ok_or_else(|| ParseError::UnknownCommand(DisplayTerm(tag).to_string()))?;
    if args.len() < tag.min_fields() {
        return Err(ParseError::TupleTooShort);
    }

    let scope = Scope::new(args[0].clone(), args[1].clone());
    let rest = &args[2..];
    let (path, op) = match tag {
        CommandTag::Unset => (rest, Operation::Unset),
        CommandTag::Set | CommandTag::Replace => {
            let Some((last, path)) = rest.split_last() else {
                return Err(ParseError::TupleTooShort);
            };
            let op = match tag {
                CommandTag::Replace => Operation::ReplaceEntry(replacement_entry(last)?),
                _ => Operation::SetTerm(ConfigValue::from_yaml(last.clone())),
            };
            (path, op)
        }
    };

    Ok(PatchCommand {
        scope,
        path: path.to_vec(),
        op,
    })
}

/// Accept either `!record [..]` or a plain sequence of at least two fields.
fn replacement_entry(term: &Term) -> Result<Record, ParseError> {
    let record = match term {
        Value::Sequence(fields) => Record::from_fields(fields.clone()).ok(),
        Value::Tagged(_) => match ConfigValue::from_yaml(term.clone()) {
            ConfigValue::Record(record) => Some(record),
            _ => None,
        },
        _ => None,
    };
    record.ok_or_else(|| ParseError::EntryExpected(DisplayTerm(term).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(src: &str) -> RawRecord {
        serde_yaml::from_str(src).unwrap()
    }

    #[test]
    fn test_set_with_path() {
        let cmd = parse(&record("[set, app, p, x, y, 11]")).unwrap();
        assert_eq!(cmd.scope, Scope::new("app", "p"));
        assert_eq!(cmd.path, vec![Value::from("x"), Value::from("y")]);
        assert_eq!(cmd.op, Operation::SetTerm(ConfigValue::leaf(11)));
    }

    #[test]
    fn test_set_without_path() {
        let cmd = parse(&record("[set, app, p, {a: 1}]")).unwrap();
        assert!(cmd.path.is_empty());
        assert_eq!(
            cmd.op,
            Operation::SetTerm(ConfigValue::AssocList(vec![Record::pair(
                "a",
                ConfigValue::leaf(1)
            )]))
        );
    }

    #[test]
    fn test_set_too_short() {
        assert_eq!(parse(&record("[set, app, p]")), Err(ParseError::TupleTooShort));
    }

    #[test]
    fn test_replace_accepts_tagged_and_plain_entries() {
        let tagged = parse(&record("[replace, app, p, k, !record [k, meta, 2]]")).unwrap();
        let plain = parse(&record("[replace, app, p, k, [k, meta, 2]]")).unwrap();
        let expected = Operation::ReplaceEntry(Record::with_meta(
            "k",
            vec![ConfigValue::leaf("meta")],
            ConfigValue::leaf(2),
        ));
        assert_eq!(tagged.op, expected);
        assert_eq!(plain.op, expected);
        assert_eq!(tagged.path, vec![Value::from("k")]);
    }

    #[test]
    fn test_replace_without_path_is_too_short() {
        assert_eq!(
            parse(&record("[replace, app, p, [existing, 2]]")),
            Err(ParseError::TupleTooShort)
        );
    }

    #[test]
    fn test_replace_needs_entry() {
        assert_eq!(
            parse(&record("[replace, app, p, k, 5]")),
            Err(ParseError::EntryExpected("5".to_string()))
        );
        assert!(matches!(
            parse(&record("[replace, app, p, k, [solo]]")),
            Err(ParseError::EntryExpected(_))
        ));
    }

    #[test]
    fn test_unset_any_depth() {
        let cmd = parse(&record("[unset, app, p]")).unwrap();
        assert!(cmd.path.is_empty());
        assert_eq!(cmd.op, Operation::Unset);

        let cmd = parse(&record("[unset, app, p, a, b]")).unwrap();
        assert_eq!(cmd.path.len(), 2);
        assert_eq!(parse(&record("[unset, app]")), Err(ParseError::TupleTooShort));
    }

    #[test]
    fn test_not_a_tuple() {
        assert_eq!(parse(&record("set")), Err(ParseError::NotATuple));
        assert_eq!(parse(&record("{set: 1}")), Err(ParseError::NotATuple));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse(&record("[merge, app, p, 1]")),
            Err(ParseError::UnknownCommand("merge".to_string()))
        );
        assert_eq!(
            parse(&record("[42, app, p]")),
            Err(ParseError::UnknownCommand("42".to_string()))
        );
    }

    #[test]
    fn test_empty_record_is_too_short() {
        assert_eq!(parse(&record("[]")), Err(ParseError::TupleTooShort));
    }
}
