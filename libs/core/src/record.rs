//! A matched row and the rules for turning it into a reply message.

use serde_json::Value;

const REPLY_HEADER: &str = "查询结果：";
const TRUNCATION_MARKER: &str = "...后续字段已截断";

/// One matched row from either backend: column names to scalar values, in
/// column order. Ephemeral; discarded after formatting.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Bound on the fallback preview: the database path caps the number of
/// fields, the CSV path caps the cumulative character count.
#[derive(Debug, Clone, Copy)]
pub enum PreviewLimit {
    Fields(usize),
    Chars(usize),
}

/// Formats the reply for a matched record, in strict priority order: a
/// non-empty `remarks` value, else a non-null `account_byte_length` rendered
/// as text, else a bounded `field: value` preview.
pub fn format_reply(record: &Record, limit: PreviewLimit) -> String {
    if let Some(remarks) = non_empty_text(record.get("remarks")) {
        return remarks;
    }
    if let Some(length) = scalar_text(record.get("account_byte_length")) {
        return length;
    }
    preview(record, limit)
}

fn non_empty_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn preview(record: &Record, limit: PreviewLimit) -> String {
    let mut lines = Vec::new();
    match limit {
        PreviewLimit::Fields(max) => {
            for (i, (name, value)) in record.iter().enumerate() {
                if i >= max {
                    lines.push(TRUNCATION_MARKER.to_string());
                    break;
                }
                lines.push(preview_line(name, value));
            }
        }
        PreviewLimit::Chars(max) => {
            let mut used = 0;
            for (name, value) in record.iter() {
                let line = preview_line(name, value);
                if used + line.chars().count() + 1 > max {
                    lines.push(TRUNCATION_MARKER.to_string());
                    break;
                }
                used += line.chars().count() + 1;
                lines.push(line);
            }
        }
    }
    format!("{REPLY_HEADER}\n{}", lines.join("\n"))
}

fn preview_line(name: &str, value: &Value) -> String {
    match value {
        Value::String(s) => format!("{name}: {s}"),
        other => format!("{name}: {other}"),
    }
}
