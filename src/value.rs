//! The configuration tree that patches operate on.
//!
//! A configuration is a [`ConfigValue`]: either an opaque leaf [`Term`], a
//! keyed [`Record`], or an association list of records. Records carry any
//! number of metadata fields between their key and their value, but only the
//! value is ever patched.
//!
//! ## YAML mapping
//! - A mapping becomes an association list of `(key, value)` pairs, in
//!   document order.
//! - `!record [key, meta.., value]` (at least two fields) becomes a record.
//! - An untagged sequence that is empty or made only of records becomes an
//!   association list.
//! - Everything else is a leaf.

use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::fmt;

/// An opaque configuration term: keys, scope components and leaf payloads.
pub type Term = Value;

/// YAML tag marking a sequence as a record.
pub const RECORD_TAG: &str = "record";

/// A node of the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Opaque value. Patching stops here unless the path is exhausted.
    Leaf(Term),
    /// A single keyed entry.
    Record(Record),
    /// Ordered entries; lookups always hit the first entry with a matching key.
    AssocList(Vec<Record>),
}

/// A keyed entry: leading fields (`key` then `meta`) and the last field `value`.
///
/// Only `value` is recursed into. `key` and `meta` travel with it unchanged,
/// so a record keeps its arity through any patch.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: Term,
    pub meta: Vec<ConfigValue>,
    pub value: Box<ConfigValue>,
}

impl Record {
    /// A plain `(key, value)` pair.
    pub fn pair(key: impl Into<Term>, value: ConfigValue) -> Self {
        Self {
            key: key.into(),
            meta: Vec::new(),
            value: Box::new(value),
        }
    }

    /// A record with metadata fields between its key and value.
    pub fn with_meta(key: impl Into<Term>, meta: Vec<ConfigValue>, value: ConfigValue) -> Self {
        Self {
            key: key.into(),
            meta,
            value: Box::new(value),
        }
    }

    /// Number of fields, key and value included.
    pub fn arity(&self) -> usize {
        self.meta.len() + 2
    }

    /// Build a record from raw fields. Fewer than two fields are handed back.
    pub fn from_fields(fields: Vec<Value>) -> Result<Self, Vec<Value>> {
        let mut fields = fields.into_iter();
        match (fields.next(), fields.next_back()) {
            (Some(key), Some(last)) => Ok(Self {
                key,
                meta: fields.map(ConfigValue::from_yaml).collect(),
                value: Box::new(ConfigValue::from_yaml(last)),
            }),
            (first, _) => Err(first.into_iter().collect()),
        }
    }

    fn from_tagged(tagged: TaggedValue) -> Result<Self, TaggedValue> {
        let TaggedValue { tag, value } = tagged;
        match value {
            Value::Sequence(fields) => Self::from_fields(fields).map_err(|fields| TaggedValue {
                tag,
                value: Value::Sequence(fields),
            }),
            value => Err(TaggedValue { tag, value }),
        }
    }

    /// Render as `!record [key, meta.., value]`.
    pub fn into_yaml(self) -> Value {
        let mut fields = Vec::with_capacity(self.arity());
        fields.push(self.key);
        fields.extend(self.meta.into_iter().map(ConfigValue::into_yaml));
        fields.push(self.value.into_yaml());
        Value::Tagged(Box::new(TaggedValue {
            tag: Tag::new(RECORD_TAG),
            value: Value::Sequence(fields),
        }))
    }
}

impl ConfigValue {
    pub fn leaf(term: impl Into<Term>) -> Self {
        ConfigValue::Leaf(term.into())
    }

    pub fn empty_list() -> Self {
        ConfigValue::AssocList(Vec::new())
    }

    pub fn is_assoc_list(&self) -> bool {
        matches!(self, ConfigValue::AssocList(_))
    }

    /// True for an empty association list, including a bare `[]` leaf.
    pub fn is_empty_list(&self) -> bool {
        match self {
            ConfigValue::AssocList(entries) => entries.is_empty(),
            ConfigValue::Leaf(Value::Sequence(items)) => items.is_empty(),
            _ => false,
        }
    }

    /// Convert a YAML value into a configuration tree.
    pub fn from_yaml(value: Value) -> Self {
        match value {
            Value::Mapping(map) => ConfigValue::AssocList(
                map.into_iter()
                    .map(|(key, value)| Record::pair(key, ConfigValue::from_yaml(value)))
                    .collect(),
            ),
            Value::Tagged(tagged) if tagged.tag == RECORD_TAG => {
                match Record::from_tagged(*tagged) {
                    Ok(record) => ConfigValue::Record(record),
                    Err(tagged) => ConfigValue::Leaf(Value::Tagged(Box::new(tagged))),
                }
            }
            Value::Sequence(items) if !items.is_empty() && items.iter().all(is_record_form) => {
                ConfigValue::AssocList(
                    items
                        .into_iter()
                        .filter_map(|item| match ConfigValue::from_yaml(item) {
                            ConfigValue::Record(record) => Some(record),
                            _ => None,
                        })
                        .collect(),
                )
            }
            other => ConfigValue::Leaf(other),
        }
    }

    /// Convert back to YAML.
    ///
    /// Association lists of plain pairs with distinct keys come out as
    /// mappings; any other list is a sequence of `!record` items.
    pub fn into_yaml(self) -> Value {
        match self {
            ConfigValue::Leaf(term) => term,
            ConfigValue::Record(record) => record.into_yaml(),
            ConfigValue::AssocList(entries) => {
                let mut seen = HashSet::new();
                let as_mapping = entries
                    .iter()
                    .all(|entry| entry.meta.is_empty() && seen.insert(&entry.key));
                if as_mapping {
                    let mut map = Mapping::with_capacity(entries.len());
                    for entry in entries {
                        map.insert(entry.key, entry.value.into_yaml());
                    }
                    Value::Mapping(map)
                } else {
                    Value::Sequence(entries.into_iter().map(Record::into_yaml).collect())
                }
            }
        }
    }
}

fn is_record_form(value: &Value) -> bool {
    match value {
        Value::Tagged(tagged) => {
            tagged.tag == RECORD_TAG
                && matches!(&tagged.value, Value::Sequence(fields) if fields.len() >= 2)
        }
        _ => false,
    }
}

/// Flow-style rendering of a [`Term`] for log lines and error messages.
pub struct DisplayTerm<'a>(pub &'a Term);

impl fmt::Display for DisplayTerm<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_term(f, self.0)
    }
}

/// Render a key path as `[a, b, c]`.
pub struct DisplayPath<'a>(pub &'a [Term]);

impl fmt::Display for DisplayPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_seq(f, '[', ']', self.0.iter(), write_term)
    }
}

fn write_term(f: &mut fmt::Formatter<'_>, term: &Term) -> fmt::Result {
    match term {
        Value::Null => f.write_str("~"),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Number(n) => write!(f, "{}", n),
        Value::String(s) if is_plain(s) => f.write_str(s),
        Value::String(s) => write!(f, "{:?}", s),
        Value::Sequence(items) => write_seq(f, '[', ']', items.iter(), write_term),
        Value::Mapping(map) => write_seq(f, '{', '}', map.iter(), |f, (key, value)| {
            write_term(f, key)?;
            f.write_str(": ")?;
            write_term(f, value)
        }),
        Value::Tagged(tagged) => {
            write!(f, "{} ", tagged.tag)?;
            write_term(f, &tagged.value)
        }
    }
}

fn write_seq<I, T>(
    f: &mut fmt::Formatter<'_>,
    open: char,
    close: char,
    items: I,
    mut write_item: impl FnMut(&mut fmt::Formatter<'_>, T) -> fmt::Result,
) -> fmt::Result
where
    I: Iterator<Item = T>,
{
    write!(f, "{}", open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_item(f, item)?;
    }
    write!(f, "{}", close)
}

/// Strings that can be printed bare without reading as another scalar.
fn is_plain(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'))
        && s.parse::<f64>().is_err()
        && !matches!(s, "true" | "false" | "null" | "~")
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        write_term(f, &self.key)?;
        for field in &self.meta {
            write!(f, ", {}", field)?;
        }
        write!(f, ", {}}}", self.value)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Leaf(term) => write_term(f, term),
            ConfigValue::Record(record) => write!(f, "{}", record),
            ConfigValue::AssocList(entries) => {
                write_seq(f, '[', ']', entries.iter(), |f, entry| write!(f, "{}", entry))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(src: &str) -> Value {
        serde_yaml::from_str(src).unwrap()
    }

    #[test]
    fn test_mapping_becomes_assoc_list_in_order() {
        let value = ConfigValue::from_yaml(yaml("{b: 2, a: 1}"));
        assert_eq!(
            value,
            ConfigValue::AssocList(vec![
                Record::pair("b", ConfigValue::leaf(2)),
                Record::pair("a", ConfigValue::leaf(1)),
            ])
        );
    }

    #[test]
    fn test_tagged_record_with_meta() {
        let value = ConfigValue::from_yaml(yaml("!record [port, tcp, {x: 1}]"));
        let ConfigValue::Record(record) = value else {
            panic!("expected a record");
        };
        assert_eq!(record.arity(), 3);
        assert_eq!(record.key, Value::from("port"));
        assert_eq!(record.meta, vec![ConfigValue::leaf("tcp")]);
        assert!(record.value.is_assoc_list());
    }

    #[test]
    fn test_short_tagged_sequence_stays_leaf() {
        let value = ConfigValue::from_yaml(yaml("!record [lonely]"));
        assert!(matches!(value, ConfigValue::Leaf(Value::Tagged(_))));
    }

    #[test]
    fn test_sequence_of_records_is_assoc_list() {
        let value = ConfigValue::from_yaml(yaml("[!record [a, m, 1], !record [a, 2]]"));
        let ConfigValue::AssocList(entries) = value else {
            panic!("expected an assoc list");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].arity(), 3);
        assert_eq!(entries[1].arity(), 2);
    }

    #[test]
    fn test_plain_sequence_is_leaf() {
        let value = ConfigValue::from_yaml(yaml("[1, 2, 3]"));
        assert_eq!(value, ConfigValue::Leaf(yaml("[1, 2, 3]")));
    }

    #[test]
    fn test_empty_sequence_keeps_its_shape() {
        let value = ConfigValue::from_yaml(yaml("{hosts: [], tags: {}}"));
        assert_eq!(value.into_yaml(), yaml("{hosts: [], tags: {}}"));
        assert!(ConfigValue::from_yaml(yaml("[]")).is_empty_list());
    }

    #[test]
    fn test_into_yaml_prefers_mapping() {
        let value = ConfigValue::from_yaml(yaml("{x: 1, y: {z: true}}"));
        assert_eq!(value.into_yaml(), yaml("{x: 1, y: {z: true}}"));
    }

    #[test]
    fn test_into_yaml_keeps_duplicates_and_meta() {
        let list = ConfigValue::AssocList(vec![
            Record::pair("a", ConfigValue::leaf(1)),
            Record::pair("a", ConfigValue::leaf(2)),
        ]);
        assert_eq!(
            list.into_yaml(),
            yaml("[!record [a, 1], !record [a, 2]]")
        );

        let wide = ConfigValue::AssocList(vec![Record::with_meta(
            "k",
            vec![ConfigValue::leaf("m")],
            ConfigValue::leaf(3),
        )]);
        assert_eq!(wide.into_yaml(), yaml("[!record [k, m, 3]]"));
    }

    #[test]
    fn test_display_flow_style() {
        let value = ConfigValue::AssocList(vec![
            Record::pair(
                "c",
                ConfigValue::AssocList(vec![Record::pair("x", ConfigValue::leaf(33))]),
            ),
            Record::pair("name", ConfigValue::leaf("two words")),
            Record::pair("n", ConfigValue::leaf("1")),
        ]);
        assert_eq!(
            value.to_string(),
            r#"[{c, [{x, 33}]}, {name, "two words"}, {n, "1"}]"#
        );
    }

    #[test]
    fn test_display_path() {
        let path = vec![Value::from("y"), Value::from("y2")];
        assert_eq!(DisplayPath(&path).to_string(), "[y, y2]");
    }
}
