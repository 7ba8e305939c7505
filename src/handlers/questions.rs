use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use serde_json::json;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::db::portfolio as portfolio_db;
use crate::db::questions::{self as question_db, NewQuestion};
use crate::error::{ApiError, required};
use crate::forms;
use crate::models::questions::{CreateQuestion, QuestionListQuery, QuestionType, UpdateQuestion};

const DEFAULT_MAX_LENGTH: i32 = 500;

/// GET /api/questions?portfolioId=: ordered by step, then order.
pub async fn get_questions(
    db: web::Data<DatabaseConnection>,
    query: web::Query<QuestionListQuery>,
) -> Result<HttpResponse, ApiError> {
    let questions = question_db::get_questions(db.get_ref(), query.portfolio_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "questions": questions })))
}

/// GET /api/questions/{id}
pub async fn get_question(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let question = question_db::get_question_by_id(db.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Question {id} not found")))?;

    Ok(HttpResponse::Ok().json(json!({ "question": question })))
}

/// POST /api/questions
pub async fn create_question(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateQuestion>,
) -> Result<HttpResponse, ApiError> {
    user.require_super_admin()?;
    let body = body.into_inner();

    let portfolio_id = body.portfolio_id.ok_or_else(|| ApiError::missing("portfolioId"))?;
    let title = required(body.title, "title")?;
    if portfolio_db::get_portfolio_by_id(db.get_ref(), portfolio_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(format!("Portfolio {portfolio_id} not found")));
    }

    let input = NewQuestion {
        portfolio_id,
        step: body.step.unwrap_or(1),
        order: body.order.unwrap_or(0),
        title,
        description: body.description.unwrap_or_default(),
        thumbnail: body.thumbnail,
        question_type: body.question_type.unwrap_or(QuestionType::Text),
        options: body.options,
        min_length: body.min_length.unwrap_or(0),
        max_length: body.max_length.unwrap_or(DEFAULT_MAX_LENGTH),
        require_min_length: body.require_min_length.unwrap_or(false),
        is_required: body.is_required.unwrap_or(true),
    };
    forms::validate_definition(
        input.question_type,
        input.options.as_ref(),
        input.min_length,
        input.max_length,
    )
    .map_err(ApiError::BadRequest)?;

    let question = question_db::insert_question(db.get_ref(), input)
        .await
        .map_err(|e| ApiError::from_write(e, "Question already exists"))?;

    Ok(HttpResponse::Created().json(json!({ "question": question })))
}

/// PUT /api/questions/{id}: the merged definition is re-validated as a whole.
pub async fn update_question(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateQuestion>,
) -> Result<HttpResponse, ApiError> {
    user.require_super_admin()?;
    let id = path.into_inner();

    let mut question = question_db::get_question_by_id(db.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Question {id} not found")))?;
    body.into_inner().apply_to(&mut question);

    forms::validate_definition(
        question.question_type,
        question.options.as_ref(),
        question.min_length,
        question.max_length,
    )
    .map_err(ApiError::BadRequest)?;

    let question = question_db::save_question(db.get_ref(), question).await?;
    Ok(HttpResponse::Ok().json(json!({ "question": question })))
}

/// DELETE /api/questions/{id}
pub async fn delete_question(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    user.require_super_admin()?;
    let id = path.into_inner();

    let result = question_db::delete_question(db.get_ref(), id).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound(format!("Question {id} not found")));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": format!("Question {id} deleted") })))
}
