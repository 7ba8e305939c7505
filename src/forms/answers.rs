use serde_json::{Map, Value};

use crate::error::FieldError;
use crate::forms::schema::{CheckboxOptions, QuestionOptions, parse_options};
use crate::models::questions::{Model as Question, QuestionType};

/// Check a finalized submission's answers against its portfolio's questions.
///
/// Most answers sit under the question id; room, special and refund lists sit
/// under their shared record key. Keys no question reads are ignored. Returns
/// every failing question, not just the first.
pub fn validate_responses(questions: &[Question], responses: &Map<String, Value>) -> Vec<FieldError> {
    questions
        .iter()
        .filter_map(|q| {
            let answer = responses
                .get(&q.question_type.answer_key(q.id))
                .filter(|v| !v.is_null());
            validate_answer(q, answer)
                .err()
                .map(|message| FieldError::new(q.id.to_string(), message))
        })
        .collect()
}

/// Validate a single answer. `None` means unanswered.
pub fn validate_answer(question: &Question, answer: Option<&Value>) -> Result<(), String> {
    match question.question_type {
        QuestionType::Text | QuestionType::Textarea => validate_text(question, answer),
        QuestionType::File => {
            let present = matches!(answer, Some(Value::String(s)) if !s.trim().is_empty());
            if question.is_required && !present {
                return Err("Please upload a file".to_string());
            }
            Ok(())
        }
        QuestionType::Checkbox => {
            let options = match parse_options(question.question_type, question.options.as_ref()) {
                Ok(QuestionOptions::Checkbox(opts)) => opts,
                _ => CheckboxOptions {
                    multiple: true,
                    checkboxes: Vec::new(),
                },
            };
            validate_checkbox(question.is_required, &options, answer)
        }
        QuestionType::Repeatable => match answer {
            None => required_or_ok(question.is_required, "Please add at least one entry"),
            Some(Value::Array(records)) => {
                if question.is_required && records.is_empty() {
                    return Err("Please add at least one entry".to_string());
                }
                if records.iter().any(|r| !r.is_object()) {
                    return Err("Each entry must be a set of fields".to_string());
                }
                Ok(())
            }
            Some(_) => Err("Expected a list of entries".to_string()),
        },
        QuestionType::Parlor | QuestionType::Special | QuestionType::Refund => {
            validate_record_list(question, answer)
        }
        QuestionType::Agreement => {
            let agreed = answer
                .and_then(|v| v.get("agreed"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if question.is_required && !agreed {
                return Err("Please accept the terms".to_string());
            }
            Ok(())
        }
    }
}

fn required_or_ok(is_required: bool, message: &str) -> Result<(), String> {
    if is_required {
        Err(message.to_string())
    } else {
        Ok(())
    }
}

/// Room fields that must all be filled in. Matches the `rooms` export columns.
const ROOM_FIELDS: [&str; 4] = ["name", "desc", "type", "price"];

/// Shortest accepted special-offer description, trimmed.
pub const SPECIAL_DESC_MIN: usize = 20;

/// A required list must hold at least one record and every record must be
/// complete. An optional list only has to be well formed.
fn validate_record_list(question: &Question, answer: Option<&Value>) -> Result<(), String> {
    let empty_message = "Please add at least one entry";
    let records = match answer {
        None => return required_or_ok(question.is_required, empty_message),
        Some(Value::Array(records)) => records,
        Some(_) => return Err("Expected a list of entries".to_string()),
    };
    let records = records
        .iter()
        .map(Value::as_object)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| "Each entry must be a set of fields".to_string())?;

    if !question.is_required {
        return Ok(());
    }
    if records.is_empty() {
        return Err(empty_message.to_string());
    }
    records
        .iter()
        .enumerate()
        .try_for_each(|(index, record)| check_record(question.question_type, index, record))
        .map_err(|(index, message)| format!("Entry {}: {message}", index + 1))
}

fn check_record(
    question_type: QuestionType,
    index: usize,
    record: &Map<String, Value>,
) -> Result<(), (usize, String)> {
    let missing = |field: &str| Err((index, format!("{field} is required")));
    match question_type {
        QuestionType::Parlor => match ROOM_FIELDS.iter().find(|f| is_blank(record.get(**f))) {
            Some(field) => missing(*field),
            None => Ok(()),
        },
        QuestionType::Special => {
            if is_blank(record.get("name")) {
                return missing("name");
            }
            let desc_len = record
                .get("desc")
                .and_then(Value::as_str)
                .map_or(0, |d| d.trim().chars().count());
            if desc_len < SPECIAL_DESC_MIN {
                return Err((index, format!("desc needs at least {SPECIAL_DESC_MIN} characters")));
            }
            Ok(())
        }
        // The first refund row is the visit day itself and has no day count.
        QuestionType::Refund => {
            if is_blank(record.get("percent")) {
                return missing("percent");
            }
            if index > 0 && is_blank(record.get("day")) {
                return missing("day");
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn validate_text(question: &Question, answer: Option<&Value>) -> Result<(), String> {
    let text = match answer {
        None => "",
        Some(Value::String(s)) => s.as_str(),
        Some(_) => return Err("Expected a text answer".to_string()),
    };
    let trimmed_len = text.trim().chars().count();

    if trimmed_len == 0 {
        return required_or_ok(question.is_required, "This field is required");
    }
    if question.require_min_length && trimmed_len < question.min_length.max(0) as usize {
        return Err(format!(
            "Please enter at least {} characters",
            question.min_length
        ));
    }
    if question.max_length > 0 && text.chars().count() > question.max_length as usize {
        return Err(format!(
            "Please enter at most {} characters",
            question.max_length
        ));
    }
    Ok(())
}

/// Selected labels of a checkbox answer, in whichever shape it arrived:
/// a label list, a single label, `{checked, inputs}` or `{selected, inputs}`.
pub fn selected_labels(answer: &Value) -> Option<Vec<String>> {
    match answer {
        Value::String(s) if s.is_empty() => Some(Vec::new()),
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect(),
        Value::Object(map) => {
            if let Some(checked) = map.get("checked") {
                return selected_labels(checked);
            }
            match map.get("selected") {
                Some(Value::String(s)) if !s.is_empty() => Some(vec![s.clone()]),
                Some(Value::String(_)) | Some(Value::Null) | None => Some(Vec::new()),
                Some(_) => None,
            }
        }
        _ => None,
    }
}

fn validate_checkbox(
    is_required: bool,
    options: &CheckboxOptions,
    answer: Option<&Value>,
) -> Result<(), String> {
    let empty_message = if options.multiple {
        "Please select at least one option"
    } else {
        "Please select an option"
    };

    let Some(answer) = answer else {
        return required_or_ok(is_required, empty_message);
    };
    let labels = selected_labels(answer).ok_or_else(|| "Unrecognised selection".to_string())?;

    if labels.is_empty() {
        return required_or_ok(is_required, empty_message);
    }
    if !options.multiple && labels.len() > 1 {
        return Err("Only one option may be selected".to_string());
    }
    if !options.checkboxes.is_empty() {
        if let Some(unknown) = labels.iter().find(|l| !options.has_label(l)) {
            return Err(format!("Unknown option: {unknown}"));
        }
    }
    Ok(())
}
