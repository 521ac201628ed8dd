//! Output formatting for patched configuration and failure reports.

use crate::batch::FailureReason;
use crate::command::RawRecord;
use crate::error::ErrorCode;
use crate::store::MemoryStore;
use crate::value::DisplayTerm;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Output format for the patched configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Invalid format '{}'. Valid options: yaml, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render the whole store as `app: { param: value }`.
pub fn render_store(store: &MemoryStore, format: OutputFormat) -> Result<String> {
    let document = store.to_yaml();
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(&document)?,
        OutputFormat::Json => serde_json::to_string_pretty(&string_keys(document))? + "\n",
    };
    Ok(rendered)
}

/// Rewrite non-string mapping keys in flow style, since JSON objects only
/// take string keys.
fn string_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(key, value)| {
                    let key = match key {
                        Value::String(_) => key,
                        other => Value::String(DisplayTerm(&other).to_string()),
                    };
                    (key, string_keys(value))
                })
                .collect::<Mapping>(),
        ),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(string_keys).collect()),
        Value::Tagged(mut tagged) => {
            tagged.value = string_keys(std::mem::replace(&mut tagged.value, Value::Null));
            Value::Tagged(tagged)
        }
        other => other,
    }
}

/// One failed record in a machine-readable report.
#[derive(Debug, Clone, Serialize)]
pub struct FailureEntry {
    /// Zero-based position of the record in its file.
    pub index: usize,
    pub code: ErrorCode,
    pub message: String,
    /// Flow-style rendering of the offending record.
    pub record: String,
}

impl FailureEntry {
    pub fn new(index: usize, reason: &FailureReason, record: &RawRecord) -> Self {
        Self {
            index,
            code: reason.code(),
            message: reason.to_string(),
            record: DisplayTerm(record).to_string(),
        }
    }
}

/// Format failures as one line each.
pub fn format_failures_text(entries: &[FailureEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "#{} [{}] {}: {}\n",
            entry.index, entry.code, entry.record, entry.message
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ParseError;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("YAML".parse::<OutputFormat>(), Ok(OutputFormat::Yaml));
        assert_eq!("yml".parse::<OutputFormat>(), Ok(OutputFormat::Yaml));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("toml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_store_json() {
        let store = MemoryStore::from_yaml_str("web: {port: 80}").unwrap();
        let json = render_store(&store, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, serde_json::json!({"web": {"port": 80}}));
    }

    #[test]
    fn test_render_store_json_with_scalar_keys() {
        let store = MemoryStore::from_yaml_str("app: {p: {~: 1, true: 2, 80: http, name: x}}").unwrap();
        let json = render_store(&store, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!({"app": {"p": {"~": 1, "true": 2, "80": "http", "name": "x"}}})
        );
    }

    #[test]
    fn test_render_store_yaml_round_trips() {
        let store = MemoryStore::from_yaml_str("web:\n  port: 80\n").unwrap();
        let yaml = render_store(&store, OutputFormat::Yaml).unwrap();
        let again = MemoryStore::from_yaml_str(&yaml).unwrap();
        assert_eq!(again.to_yaml(), store.to_yaml());
    }

    #[test]
    fn test_failure_entry_text() {
        let reason: FailureReason = ParseError::UnknownCommand("merge".into()).into();
        let record: RawRecord = serde_yaml::from_str("[merge, a, p]").unwrap();
        let entries = vec![FailureEntry::new(3, &reason, &record)];
        assert_eq!(
            format_failures_text(&entries),
            "#3 [UNKNOWN_COMMAND] [merge, a, p]: unknown patch command: merge\n"
        );
        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(json["code"], "UNKNOWN_COMMAND");
    }
}
