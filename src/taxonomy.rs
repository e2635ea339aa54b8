//! Hand-authored taxonomy input shapes.
//!
//! A taxonomy document is a JSON object of top-level group keys. Two authored
//! shapes occur in the wild: `group → category → [leaf, …]` and the collapsed
//! `group → [leaf, …]` where the group itself becomes a single category. Leaf
//! items are either bare string titles or structured records carrying one of
//! several title-bearing fields; anything else is malformed and gets skipped
//! upstream with a warning.
//!
//! Key order is authoring order (serde_json `preserve_order`), which is what
//! makes category and section ordering reproducible.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::TaxonomyError;

/// A parsed taxonomy document: ordered top-level group keys.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    groups: Map<String, Value>,
}

impl Taxonomy {
    /// Build from a JSON value. The top level must be a non-empty object.
    pub fn from_value(value: Value) -> Result<Self, TaxonomyError> {
        match value {
            Value::Object(groups) if !groups.is_empty() => Ok(Self { groups }),
            Value::Object(_) => Err(TaxonomyError::Empty),
            other => Err(TaxonomyError::Parse {
                message: format!("expected a JSON object of group keys, got {}", kind_of(&other)),
            }),
        }
    }

    /// Parse from JSON text.
    pub fn parse(text: &str) -> Result<Self, TaxonomyError> {
        let value: Value = serde_json::from_str(text).map_err(|e| TaxonomyError::Parse {
            message: e.to_string(),
        })?;
        Self::from_value(value)
    }

    /// Iterate the top-level groups in authoring order.
    pub fn groups(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.groups.iter()
    }

    /// Number of top-level groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the taxonomy has no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// How a group's value is shaped.
pub enum GroupShape<'a> {
    /// A plain sequence: the group collapses into a single category.
    Sequence(&'a Vec<Value>),
    /// A mapping of category key → category value.
    Mapping(&'a Map<String, Value>),
    /// Anything else; the normalizer skips it with a warning.
    Other(&'a Value),
}

/// Classify a group's value.
pub fn group_shape(value: &Value) -> GroupShape<'_> {
    match value {
        Value::Array(items) => GroupShape::Sequence(items),
        Value::Object(map) => GroupShape::Mapping(map),
        other => GroupShape::Other(other),
    }
}

/// A single leaf item after shape classification.
pub enum Leaf<'a> {
    /// Bare string, used (title-cased) as the section title.
    Title(&'a str),
    /// Structured record exposing a title-bearing field.
    Record(&'a Map<String, Value>),
    /// Neither string nor record; skipped with a warning.
    Malformed(&'a Value),
}

/// Classify a raw leaf value.
pub fn classify_leaf(value: &Value) -> Leaf<'_> {
    match value {
        Value::String(s) => Leaf::Title(s),
        Value::Object(map) => Leaf::Record(map),
        other => Leaf::Malformed(other),
    }
}

/// Flatten a category's value into leaf items, in authoring order.
///
/// A sequence is taken as-is. Authors sometimes nest one more mapping level
/// under a category (sub-groups whose values are sequences) or write
/// `key: "text"` pairs; both are folded into leaves so that extra nesting
/// never aborts a run.
pub fn collect_leaves(value: &Value) -> Vec<Value> {
    let mut out = Vec::new();
    collect_into(value, &mut out);
    out
}

fn collect_into(value: &Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => out.extend(items.iter().cloned()),
        Value::Object(map) => {
            for (key, val) in map {
                match val {
                    Value::Array(_) | Value::Object(_) => collect_into(val, out),
                    Value::String(text) => {
                        // `"key": "text"` entries become records titled by the key.
                        let mut record = Map::new();
                        record.insert("topic".into(), Value::String(key.clone()));
                        record.insert("practice".into(), Value::String(text.clone()));
                        out.push(Value::Object(record));
                    }
                    other => out.push(other.clone()),
                }
            }
        }
        other => out.push(other.clone()),
    }
}

// ── Title extraction ────────────────────────────────────────────────────

/// Fixed-precedence list of title-bearing record fields.
const TITLE_KEYS: &[&str] = &[
    "title",
    "name",
    "topic",
    "concept",
    "protocol",
    "technique",
    "operation",
    "feature",
    "service",
    "technology",
    "tool",
    "problem",
    "principle",
    "process",
    "step",
    "exercise",
];

/// Extract a title from a structured record.
///
/// Checks the fixed-precedence key list first, then falls back to the first
/// string value in authoring order. `None` means the caller should synthesize
/// a placeholder rather than fail.
pub fn extract_title(record: &Map<String, Value>) -> Option<String> {
    for key in TITLE_KEYS {
        if let Some(Value::String(s)) = record.get(*key) {
            if !s.trim().is_empty() {
                return Some(s.clone());
            }
        }
    }
    record.values().find_map(|v| match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    })
}

// ── Content composition ─────────────────────────────────────────────────

/// Record fields folded into the section body, with their display labels.
const CONTENT_KEYS: &[(&str, &str)] = &[
    ("practice", "Practical Exercise"),
    ("usage", "Common Usage"),
    ("tools", "Recommended Tools"),
    ("solution", "Solution Strategy"),
    ("mitigation", "Mitigation Strategy"),
    ("requirements", "Requirements"),
    ("skills", "Skills Gained"),
    ("focus", "Focus Area"),
    ("description", "Description"),
];

/// Compose the markdown body for a section from its leaf item.
pub fn compose_content(leaf: &Value, title: &str) -> String {
    let mut content = format!("## {title}\n\n");
    match leaf {
        Value::String(text) => content.push_str(text),
        Value::Object(record) => {
            for (key, label) in CONTENT_KEYS {
                if let Some(Value::String(text)) = record.get(*key) {
                    content.push_str(&format!("**{label}**: {text}\n\n"));
                }
            }
        }
        _ => {}
    }
    content.trim_end().to_string()
}

// ── Display-name formatting ─────────────────────────────────────────────

static ORDINAL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[_\s-]+").unwrap());

/// Format a group or category key as a display name.
///
/// `"01_python_basics"` → `"Python Basics"`. Strips the leading ordinal
/// prefix, splits on underscores and whitespace, and capitalizes each word.
pub fn format_display_name(key: &str) -> String {
    let stripped = ORDINAL_PREFIX.replace(key, "");
    capitalize_words(stripped.split(['_', ' ']).filter(|w| !w.is_empty()))
}

/// Title-case a bare leaf string: `"What is X"` → `"What Is X"`.
///
/// Splits on whitespace only, so punctuation and interior casing survive.
pub fn format_title(text: &str) -> String {
    capitalize_words(text.split_whitespace())
}

fn capitalize_words<'a>(words: impl Iterator<Item = &'a str>) -> String {
    words
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
