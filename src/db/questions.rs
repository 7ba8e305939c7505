use sea_orm::*;
use sea_orm::prelude::Json;
use uuid::Uuid;

use crate::models::questions::{self, QuestionType};

/// Validated input for inserting a question.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub portfolio_id: Uuid,
    pub step: i32,
    pub order: i32,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub question_type: QuestionType,
    pub options: Option<Json>,
    pub min_length: i32,
    pub max_length: i32,
    pub require_min_length: bool,
    pub is_required: bool,
}

/// Insert a new question.
pub async fn insert_question(
    db: &DatabaseConnection,
    input: NewQuestion,
) -> Result<questions::Model, DbErr> {
    let new_question = questions::ActiveModel {
        id: Set(Uuid::new_v4()),
        portfolio_id: Set(input.portfolio_id),
        step: Set(input.step),
        sort_order: Set(input.order),
        title: Set(input.title),
        description: Set(input.description),
        thumbnail: Set(input.thumbnail),
        question_type: Set(input.question_type),
        options: Set(input.options),
        min_length: Set(input.min_length),
        max_length: Set(input.max_length),
        require_min_length: Set(input.require_min_length),
        is_required: Set(input.is_required),
        created_at: Set(chrono::Utc::now()),
    };

    new_question.insert(db).await
}

/// Fetch questions in display order (step, then order), optionally for one portfolio.
pub async fn get_questions(
    db: &DatabaseConnection,
    portfolio_id: Option<Uuid>,
) -> Result<Vec<questions::Model>, DbErr> {
    let mut select = questions::Entity::find();
    if let Some(portfolio_id) = portfolio_id {
        select = select.filter(questions::Column::PortfolioId.eq(portfolio_id));
    }

    select
        .order_by_asc(questions::Column::Step)
        .order_by_asc(questions::Column::SortOrder)
        .all(db)
        .await
}

pub async fn get_question_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<questions::Model>, DbErr> {
    questions::Entity::find_by_id(id).one(db).await
}

/// Persist an already-merged question.
pub async fn save_question(
    db: &DatabaseConnection,
    question: questions::Model,
) -> Result<questions::Model, DbErr> {
    let mut active: questions::ActiveModel = question.into();
    // `into()` marks every column unchanged; force them to be written.
    active = active.reset_all();
    active.update(db).await
}

/// Delete a question by ID.
pub async fn delete_question(db: &DatabaseConnection, id: Uuid) -> Result<DeleteResult, DbErr> {
    questions::Entity::delete_by_id(id).exec(db).await
}
