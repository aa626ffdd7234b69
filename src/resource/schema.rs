use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Number, Value};

use crate::db::Row;
use crate::error::{Problem, ValidationError};

/// Raw form values as typed by the user, keyed by field name.
pub type FormInput = BTreeMap<String, String>;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Builds a `FormInput` from name/value pairs.
pub fn form_input<I, K, V>(pairs: I) -> FormInput
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Whole number, zero or more.
    Count,
    Decimal,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Used when the input is blank, before the required check.
    pub default: Option<&'static str>,
}

impl FieldSpec {
    pub const fn required(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { name, label, kind, required: true, default: None }
    }

    pub const fn optional(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { name, label, kind, required: false, default: None }
    }

    pub const fn with_default(self, default: &'static str) -> Self {
        Self { default: Some(default), ..self }
    }

    fn coerce(&self, raw: &str) -> Result<Value, Problem> {
        match self.kind {
            FieldKind::Text => Ok(Value::String(raw.to_string())),
            FieldKind::Count => raw
                .parse::<i64>()
                .ok()
                .filter(|n| *n >= 0)
                .map(Value::from)
                .ok_or_else(|| Problem::NotACount(raw.to_string())),
            FieldKind::Decimal => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| Problem::NotANumber(raw.to_string())),
            FieldKind::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map(|d| Value::String(d.format(DATE_FORMAT).to_string()))
                .map_err(|_| Problem::NotADate(raw.to_string())),
            FieldKind::Choice(allowed) => {
                if allowed.iter().any(|a| *a == raw) {
                    Ok(Value::String(raw.to_string()))
                } else {
                    Err(Problem::NotAllowed { value: raw.to_string(), allowed })
                }
            }
        }
    }
}

/// Everything the generic controllers need to know about one resource kind.
#[derive(Debug)]
pub struct ResourceDescriptor {
    pub table: &'static str,
    pub singular: &'static str,
    pub plural: &'static str,
    /// SQL `ORDER BY` clause that gives `list()` its order.
    pub order_by: &'static str,
    pub fields: &'static [FieldSpec],
}

impl ResourceDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Coerces every field of `input` according to its spec. Blank optional
    /// fields become null. All failing fields are reported together. Keys
    /// that are not fields of this resource are ignored.
    pub fn validate(&self, input: &FormInput) -> Result<Row, ValidationError> {
        let mut row = Row::new();
        let mut errors = ValidationError::default();

        for spec in self.fields {
            let raw = input.get(spec.name).map(|s| s.trim()).unwrap_or("");
            let raw = match (raw.is_empty(), spec.default) {
                (true, Some(default)) => default,
                _ => raw,
            };

            if raw.is_empty() {
                if spec.required {
                    errors.push(spec.name, Problem::Missing);
                } else {
                    row.insert(spec.name.to_string(), Value::Null);
                }
                continue;
            }

            match spec.coerce(raw) {
                Ok(value) => {
                    row.insert(spec.name.to_string(), value);
                }
                Err(problem) => errors.push(spec.name, problem),
            }
        }

        if errors.is_empty() {
            Ok(row)
        } else {
            Err(errors)
        }
    }

    /// Blank form with each field at its default.
    pub fn defaults(&self) -> FormInput {
        self.fields
            .iter()
            .map(|f| (f.name.to_string(), f.default.unwrap_or("").to_string()))
            .collect()
    }

    /// Form values pre-filled from an existing field set.
    pub fn to_input<F: Serialize>(&self, fields: &F) -> FormInput {
        let values = match serde_json::to_value(fields) {
            Ok(Value::Object(map)) => map,
            _ => Row::new(),
        };
        self.fields
            .iter()
            .map(|f| {
                let text = match values.get(f.name) {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                };
                (f.name.to_string(), text)
            })
            .collect()
    }

    pub fn created_message(&self) -> String {
        format!("{} created successfully", capitalize(self.singular))
    }

    pub fn updated_message(&self) -> String {
        format!("{} updated successfully", capitalize(self.singular))
    }

    pub fn deleted_message(&self) -> String {
        format!("{} deleted successfully", capitalize(self.singular))
    }

    pub fn save_failed_message(&self) -> String {
        format!("Failed to save {}", self.singular)
    }

    pub fn load_failed_message(&self) -> String {
        format!("Failed to load {}", self.plural)
    }

    pub fn delete_failed_message(&self) -> String {
        format!("Failed to delete {}", self.singular)
    }
}

/// Upper-cases the first character, for headings built from descriptor names.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
