use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The answer shape a question expects. Stored as its lower-case tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[sea_orm(string_value = "text")]
    Text,
    #[sea_orm(string_value = "textarea")]
    Textarea,
    #[sea_orm(string_value = "checkbox")]
    Checkbox,
    #[sea_orm(string_value = "file")]
    File,
    #[sea_orm(string_value = "repeatable")]
    Repeatable,
    #[sea_orm(string_value = "agreement")]
    Agreement,
    /// Room list, answered under the `rooms` response key.
    #[sea_orm(string_value = "parlor")]
    Parlor,
    /// Special offers, answered under `specials`.
    #[sea_orm(string_value = "special")]
    Special,
    /// Refund schedule, answered under `refunds`.
    #[sea_orm(string_value = "refund")]
    Refund,
}

impl QuestionType {
    /// Shared response key for types answered as a list of records outside
    /// the per-question entries. `None` means the answer sits under the
    /// question id.
    pub fn record_key(self) -> Option<&'static str> {
        match self {
            QuestionType::Parlor => Some("rooms"),
            QuestionType::Special => Some("specials"),
            QuestionType::Refund => Some("refunds"),
            _ => None,
        }
    }

    /// Key of this question's answer inside `responses`.
    pub fn answer_key(self, question_id: Uuid) -> String {
        self.record_key()
            .map_or_else(|| question_id.to_string(), str::to_string)
    }
}

/// SeaORM entity for the `questions` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "questions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub portfolio_id: Uuid,
    /// Page grouping within the multi-step form.
    pub step: i32,
    /// Position within the step.
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub thumbnail: Option<String>,
    pub question_type: QuestionType,
    /// Type-dependent payload, see `forms::schema`.
    pub options: Option<Json>,
    pub min_length: i32,
    pub max_length: i32,
    pub require_min_length: bool,
    pub is_required: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::portfolio::Entity",
        from = "Column::PortfolioId",
        to = "super::portfolio::Column::Id"
    )]
    Portfolio,
}

impl Related<super::portfolio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Portfolio.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestion {
    pub portfolio_id: Option<Uuid>,
    pub step: Option<i32>,
    pub order: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub question_type: Option<QuestionType>,
    pub options: Option<Json>,
    pub min_length: Option<i32>,
    pub max_length: Option<i32>,
    pub require_min_length: Option<bool>,
    pub is_required: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestion {
    pub step: Option<i32>,
    pub order: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub question_type: Option<QuestionType>,
    pub options: Option<Json>,
    pub min_length: Option<i32>,
    pub max_length: Option<i32>,
    pub require_min_length: Option<bool>,
    pub is_required: Option<bool>,
}

impl UpdateQuestion {
    /// Overlay the present fields onto `question`.
    pub fn apply_to(self, question: &mut Model) {
        if let Some(step) = self.step {
            question.step = step;
        }
        if let Some(order) = self.order {
            question.sort_order = order;
        }
        if let Some(title) = self.title {
            question.title = title;
        }
        if let Some(description) = self.description {
            question.description = description;
        }
        if let Some(thumbnail) = self.thumbnail {
            question.thumbnail = Some(thumbnail);
        }
        if let Some(question_type) = self.question_type {
            question.question_type = question_type;
        }
        if let Some(options) = self.options {
            question.options = Some(options);
        }
        if let Some(min_length) = self.min_length {
            question.min_length = min_length;
        }
        if let Some(max_length) = self.max_length {
            question.max_length = max_length;
        }
        if let Some(require_min_length) = self.require_min_length {
            question.require_min_length = require_min_length;
        }
        if let Some(is_required) = self.is_required {
            question.is_required = is_required;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionListQuery {
    pub portfolio_id: Option<Uuid>,
}
