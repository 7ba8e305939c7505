//! Flattening of finalized submissions into a fixed-width table.
//!
//! Columns are: sequence number, company name, one column per non-file
//! question in display order, then the synthesized columns of every
//! [`ExportConvention`] with at least one record in the input.

pub mod xlsx;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::questions::{self, QuestionType};
use crate::models::submissions;

/// Widest column, in characters.
pub const MAX_COLUMN_WIDTH: usize = 50;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("There are no submissions to export for this portfolio")]
    NoData,
    #[error("Failed to render spreadsheet: {0}")]
    Render(#[from] rust_xlsxwriter::XlsxError),
}

/// A response key holding an array of records, spread over numbered columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConvention {
    /// Key in the responses mapping.
    pub key: String,
    /// Header prefix; also used to find where the columns are inserted.
    pub header_prefix: String,
    /// `(record field, header label)` pairs, one column each per record.
    pub fields: Vec<(String, String)>,
}

impl ExportConvention {
    pub fn new(key: &str, header_prefix: &str, fields: &[(&str, &str)]) -> Self {
        Self {
            key: key.to_string(),
            header_prefix: header_prefix.to_string(),
            fields: fields
                .iter()
                .map(|(k, l)| (k.to_string(), l.to_string()))
                .collect(),
        }
    }

    fn header(&self, index: usize, label: &str) -> String {
        format!("{}{} {}", self.header_prefix, index + 1, label)
    }
}

/// The room and special-offer conventions used by the lodging questionnaires.
///
/// Refund schedules have no block: their rows are rendered as sentences in the
/// refund question's own column.
pub fn default_conventions() -> Vec<ExportConvention> {
    vec![
        ExportConvention::new(
            "rooms",
            "Room",
            &[
                ("name", "Name"),
                ("desc", "Description"),
                ("type", "Type"),
                ("price", "Rate"),
            ],
        ),
        ExportConvention::new("specials", "Special", &[("name", "Name"), ("desc", "Description")]),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(u32),
    Text(String),
}

impl Cell {
    fn char_len(&self) -> usize {
        match self {
            Cell::Number(n) => n.to_string().len(),
            Cell::Text(s) => s.chars().count(),
        }
    }
}

/// A header row plus data rows of equal width.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// `min(50, longest header or value + 2)` per column.
    pub fn column_widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(col, header)| {
                let longest = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(Cell::char_len)
                    .fold(header.chars().count(), usize::max);
                (longest + 2).min(MAX_COLUMN_WIDTH)
            })
            .collect()
    }
}

enum Column<'a> {
    Sequence,
    Company,
    Question(&'a questions::Model),
    Convention {
        convention: &'a ExportConvention,
        index: usize,
        field: &'a str,
    },
}

/// Build the export table. `questions` may be in any order.
pub fn build_sheet(
    questions: &[questions::Model],
    submissions: &[submissions::Model],
    conventions: &[ExportConvention],
) -> Result<Sheet, ExportError> {
    if submissions.is_empty() {
        return Err(ExportError::NoData);
    }

    let mut ordered: Vec<&questions::Model> = questions
        .iter()
        .filter(|q| q.question_type != QuestionType::File)
        .collect();
    ordered.sort_by_key(|q| (q.step, q.sort_order));

    let mut columns: Vec<(String, Column)> = vec![
        ("No.".to_string(), Column::Sequence),
        ("Company Name".to_string(), Column::Company),
    ];
    columns.extend(ordered.into_iter().map(|q| (q.title.clone(), Column::Question(q))));

    let responses: Vec<Map<String, Value>> = submissions
        .iter()
        .map(|s| match &s.responses {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        })
        .collect();

    for convention in conventions {
        let max_records = responses
            .iter()
            .map(|r| records(r, &convention.key).len())
            .max()
            .unwrap_or(0);
        if max_records == 0 {
            continue;
        }

        let block: Vec<(String, Column)> = (0..max_records)
            .flat_map(move |index| {
                convention.fields.iter().map(move |(field, label)| {
                    (
                        convention.header(index, label),
                        Column::Convention {
                            convention,
                            index,
                            field: field.as_str(),
                        },
                    )
                })
            })
            .collect();

        let at = columns
            .iter()
            .rposition(|(header, _)| header.starts_with(&convention.header_prefix))
            .map_or(columns.len(), |i| i + 1);
        columns.splice(at..at, block);
    }

    let rows = submissions
        .iter()
        .zip(&responses)
        .enumerate()
        .map(|(i, (submission, answers))| {
            columns
                .iter()
                .map(|(_, column)| match column {
                    Column::Sequence => Cell::Number(i as u32 + 1),
                    Column::Company => Cell::Text(submission.company_name.clone()),
                    Column::Question(q) => Cell::Text(
                        answers
                            .get(&q.question_type.answer_key(q.id))
                            .map(|v| flatten_answer(q.question_type, v))
                            .unwrap_or_default(),
                    ),
                    Column::Convention {
                        convention,
                        index,
                        field,
                    } => Cell::Text(
                        records(answers, &convention.key)
                            .get(*index)
                            .and_then(|record| record.get(*field))
                            .map(scalar_text)
                            .unwrap_or_default(),
                    ),
                })
                .collect()
        })
        .collect();

    Ok(Sheet {
        headers: columns.into_iter().map(|(header, _)| header).collect(),
        rows,
    })
}

fn records<'a>(answers: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    match answers.get(key) {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

/// Text of a scalar without JSON quoting; null is empty.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn join_texts(items: &[Value], sep: &str) -> String {
    items.iter().map(scalar_text).collect::<Vec<_>>().join(sep)
}

/// Render one answer as a single cell.
pub fn flatten_answer(question_type: QuestionType, answer: &Value) -> String {
    match answer {
        Value::Null => String::new(),
        Value::Array(items) if question_type == QuestionType::Checkbox => join_texts(items, ", "),
        Value::Array(items) if question_type == QuestionType::Refund => items
            .iter()
            .enumerate()
            .map(|(index, item)| refund_text(index, item))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map)
            if map.get("checked").is_some_and(Value::is_array)
                || map.contains_key("selected")
                || map.contains_key("inputs") =>
        {
            let checked = match (map.get("checked"), map.get("selected")) {
                (Some(Value::Array(items)), _) => join_texts(items, ", "),
                (_, Some(selected)) => scalar_text(selected),
                _ => String::new(),
            };
            let inputs = match map.get("inputs") {
                Some(Value::Object(inputs)) => inputs
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", scalar_text(v)))
                    .collect::<Vec<_>>()
                    .join(", "),
                _ => String::new(),
            };
            [checked, inputs]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" / ")
        }
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(record) => record
                    .values()
                    .map(scalar_text)
                    .collect::<Vec<_>>()
                    .join(" "),
                other => scalar_text(other),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => answer.to_string(),
        scalar => scalar_text(scalar),
    }
}

/// The first refund row applies on the visit day; later rows count days before it.
fn refund_text(index: usize, row: &Value) -> String {
    let percent = row.get("percent").map(scalar_text).unwrap_or_default();
    if index == 0 {
        format!("Visit day: {percent}% refund")
    } else {
        let day = row.get("day").map(scalar_text).unwrap_or_default();
        format!("{day} days before: {percent}% refund")
    }
}

/// `{title}_submissions_{date}.xlsx`, percent-encoded for `filename*`.
pub fn download_filename(title: &str, date: chrono::NaiveDate) -> String {
    let name = format!("{title}_submissions_{}.xlsx", date.format("%Y-%m-%d"));
    urlencoding::encode(&name).into_owned()
}
