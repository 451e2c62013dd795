//! Dynamic form field types and submission validation.
//!
//! Admins define forms as an ordered list of fields; public submissions are a
//! JSON object keyed by field `name`. Validation collects every problem so
//! the client can show them all at once.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::CoreError;

static FIELD_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]{0,63}$").expect("valid regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("valid regex"));

/// Supported input types for a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Textarea,
    Email,
    Number,
    Phone,
    Date,
    Select,
    Checkbox,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Email => "email",
            Self::Number => "number",
            Self::Phone => "phone",
            Self::Date => "date",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
        }
    }
}

impl FromStr for FieldType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "textarea" => Ok(Self::Textarea),
            "email" => Ok(Self::Email),
            "number" => Ok(Self::Number),
            "phone" => Ok(Self::Phone),
            "date" => Ok(Self::Date),
            "select" => Ok(Self::Select),
            "checkbox" => Ok(Self::Checkbox),
            other => Err(CoreError::Validation(format!(
                "Unknown field type '{other}'"
            ))),
        }
    }
}

/// The parts of a stored field that submission validation needs.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub is_required: bool,
    pub options: Vec<String>,
}

/// Validate a form definition: field names unique and well-formed, select
/// fields carry at least one option.
pub fn validate_definition(fields: &[FieldSpec]) -> Result<(), CoreError> {
    let mut names = HashSet::new();
    let mut problems = Vec::new();

    for field in fields {
        if !FIELD_NAME_RE.is_match(&field.name) {
            problems.push(format!(
                "field name '{}' must be lowercase snake_case",
                field.name
            ));
        }
        if !names.insert(field.name.as_str()) {
            problems.push(format!("duplicate field name '{}'", field.name));
        }
        if field.field_type == FieldType::Select && field.options.is_empty() {
            problems.push(format!("select field '{}' needs options", field.name));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(problems.join("; ")))
    }
}

/// Validate submitted values against the form's fields.
pub fn validate_submission(fields: &[FieldSpec], data: &Map<String, Value>) -> Result<(), CoreError> {
    let mut problems = Vec::new();

    let known: HashSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    let mut unknown: Vec<&str> = data
        .keys()
        .map(String::as_str)
        .filter(|k| !known.contains(k))
        .collect();
    unknown.sort_unstable();
    if !unknown.is_empty() {
        problems.push(format!("unknown fields: {}", unknown.join(", ")));
    }

    for field in fields {
        match data.get(&field.name) {
            None | Some(Value::Null) => {
                if field.is_required {
                    problems.push(format!("{} is required", field.label));
                }
            }
            Some(value) => {
                if let Err(msg) = check_value(field, value) {
                    problems.push(msg);
                }
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(problems.join("; ")))
    }
}

fn check_value(field: &FieldSpec, value: &Value) -> Result<(), String> {
    let label = &field.label;

    if field.field_type == FieldType::Checkbox {
        return match value {
            Value::Bool(true) => Ok(()),
            Value::Bool(false) if field.is_required => Err(format!("{label} must be checked")),
            Value::Bool(false) => Ok(()),
            _ => Err(format!("{label} must be true or false")),
        };
    }

    if field.field_type == FieldType::Number {
        return match value {
            Value::Number(_) => Ok(()),
            Value::String(s) if s.trim().parse::<f64>().is_ok() => Ok(()),
            _ => Err(format!("{label} must be a number")),
        };
    }

    let Value::String(text) = value else {
        return Err(format!("{label} must be a string"));
    };
    let text = text.trim();

    if text.is_empty() {
        return if field.is_required {
            Err(format!("{label} is required"))
        } else {
            Ok(())
        };
    }

    match field.field_type {
        FieldType::Email if !EMAIL_RE.is_match(text) => {
            Err(format!("{label} must be a valid email address"))
        }
        FieldType::Phone if !PHONE_RE.is_match(&text.replace([' ', '-'], "")) => {
            Err(format!("{label} must be a valid phone number"))
        }
        FieldType::Date if chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").is_err() => {
            Err(format!("{label} must be a date (YYYY-MM-DD)"))
        }
        FieldType::Select if !field.options.iter().any(|o| o == text) => {
            Err(format!("{label} must be one of: {}", field.options.join(", ")))
        }
        _ => Ok(()),
    }
}
