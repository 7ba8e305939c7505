use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::questions::QuestionType;

/// One choice of a checkbox question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckboxChoice {
    pub label: String,
    /// The choice carries a free-text sub-input when selected.
    #[serde(default)]
    pub has_input: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxOptions {
    #[serde(default = "default_multiple")]
    pub multiple: bool,
    #[serde(default)]
    pub checkboxes: Vec<CheckboxChoice>,
}

fn default_multiple() -> bool {
    true
}

impl CheckboxOptions {
    pub fn has_label(&self, label: &str) -> bool {
        self.checkboxes.iter().any(|c| c.label == label)
    }
}

/// One column of a repeatable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatableField {
    pub label: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    #[serde(default)]
    pub placeholder: String,
}

fn default_field_type() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatableOptions {
    #[serde(default)]
    pub fields: Vec<RepeatableField>,
}

/// Statements the respondent accepts as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementOptions {
    #[serde(default)]
    pub agreement_items: Vec<String>,
}

/// A question's options payload interpreted by its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionOptions {
    Checkbox(CheckboxOptions),
    Repeatable(RepeatableOptions),
    Agreement(AgreementOptions),
    /// Types whose payload carries nothing the server interprets.
    Untyped,
}

/// Payloads were historically written as a JSON string holding the object;
/// unwrap that layer when present.
fn unwrap_encoded(raw: &Value) -> Result<Value, String> {
    match raw {
        Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
        Value::String(s) => {
            serde_json::from_str(s).map_err(|e| format!("Options are not valid JSON: {e}"))
        }
        other => Ok(other.clone()),
    }
}

/// Interpret `raw` according to `question_type`.
pub fn parse_options(
    question_type: QuestionType,
    raw: Option<&Value>,
) -> Result<QuestionOptions, String> {
    let value = match raw {
        Some(raw) => unwrap_encoded(raw)?,
        None => Value::Null,
    };
    let value = if value.is_null() {
        Value::Object(Default::default())
    } else {
        value
    };

    match question_type {
        QuestionType::Checkbox => serde_json::from_value(value)
            .map(QuestionOptions::Checkbox)
            .map_err(|e| format!("Invalid checkbox options: {e}")),
        QuestionType::Repeatable => serde_json::from_value(value)
            .map(QuestionOptions::Repeatable)
            .map_err(|e| format!("Invalid repeatable options: {e}")),
        QuestionType::Agreement => serde_json::from_value(value)
            .map(QuestionOptions::Agreement)
            .map_err(|e| format!("Invalid agreement options: {e}")),
        _ => Ok(QuestionOptions::Untyped),
    }
}

/// Authoring-time check of a question definition.
///
/// Repeatable field labels and checkbox labels must be non-empty and unique:
/// an answer record is keyed by label, so a duplicate would silently overwrite
/// the earlier value.
pub fn validate_definition(
    question_type: QuestionType,
    options: Option<&Value>,
    min_length: i32,
    max_length: i32,
) -> Result<(), String> {
    if min_length < 0 || max_length < 0 {
        return Err("Length limits cannot be negative".to_string());
    }
    // maxLength 0 means unbounded.
    if max_length > 0 && min_length > max_length {
        return Err(format!(
            "minLength ({min_length}) cannot exceed maxLength ({max_length})"
        ));
    }

    match parse_options(question_type, options)? {
        QuestionOptions::Checkbox(opts) => {
            if opts.checkboxes.is_empty() {
                return Err("A checkbox question needs at least one choice".to_string());
            }
            ensure_unique_labels(opts.checkboxes.iter().map(|c| c.label.as_str()), "choice")
        }
        QuestionOptions::Repeatable(opts) => {
            if opts.fields.is_empty() {
                return Err("A repeatable question needs at least one field".to_string());
            }
            ensure_unique_labels(opts.fields.iter().map(|f| f.label.as_str()), "field")
        }
        QuestionOptions::Agreement(opts) => {
            if opts.agreement_items.iter().any(|item| item.trim().is_empty()) {
                return Err("Agreement items cannot be blank".to_string());
            }
            Ok(())
        }
        QuestionOptions::Untyped => Ok(()),
    }
}

fn ensure_unique_labels<'a>(
    labels: impl Iterator<Item = &'a str>,
    what: &str,
) -> Result<(), String> {
    let mut seen = HashSet::new();
    for label in labels {
        let label = label.trim();
        if label.is_empty() {
            return Err(format!("Every {what} needs a label"));
        }
        if !seen.insert(label) {
            return Err(format!("Duplicate {what} label: {label}"));
        }
    }
    Ok(())
}
