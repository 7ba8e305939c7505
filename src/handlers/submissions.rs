use actix_web::{HttpRequest, HttpResponse, web};
use sea_orm::{DatabaseConnection, prelude::Json};
use serde_json::{Map, Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::auth::password;
use crate::db::portfolio as portfolio_db;
use crate::db::questions as question_db;
use crate::db::submissions as submission_db;
use crate::error::{ApiError, required};
use crate::forms;
use crate::handlers::client_ip;
use crate::models::page::PageQuery;
use crate::models::portfolio;
use crate::models::submissions::{
    self, CheckSubmissionRequest, CreateSubmissionRequest, MyListRequest, NewSubmission,
    SubmissionListQuery, SubmissionResponse, UpdateSubmissionRequest,
};
use crate::sheets::{SheetRow, SheetsClient};

fn pin(value: Option<String>) -> Result<String, ApiError> {
    let pin = required(value, "password")?;
    if !password::is_valid_pin(&pin) {
        return Err(ApiError::BadRequest(
            "The PIN must be exactly 4 digits".to_string(),
        ));
    }
    Ok(pin)
}

fn responses_object(value: Option<Json>) -> Result<Map<String, Value>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(ApiError::BadRequest(
            "responses must be an object keyed by question id".to_string(),
        )),
    }
}

/// Finalized answers must satisfy the portfolio's questions; drafts are
/// stored as they are.
async fn check_answers(
    db: &DatabaseConnection,
    portfolio_id: Uuid,
    responses: &Map<String, Value>,
    is_draft: bool,
) -> Result<(), ApiError> {
    if is_draft {
        return Ok(());
    }
    let questions = question_db::get_questions(db, Some(portfolio_id)).await?;
    let errors = forms::validate_responses(&questions, responses);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

/// Best-effort copy of a finalized submission into the Sheets mirror.
fn mirror(
    sheets: Option<web::Data<SheetsClient>>,
    submission: &submissions::Model,
    portfolio: Option<&portfolio::Model>,
) {
    let Some(sheets) = sheets else {
        return;
    };
    if submission.is_draft {
        return;
    }

    let title = portfolio.map(|p| p.title.as_str()).unwrap_or_default();
    let row = SheetRow::from_submission(submission, title, sheets.utc_offset_hours());
    let id = submission.id;
    actix_web::rt::spawn(async move {
        match sheets.append(&row).await {
            Ok(()) => info!("Mirrored submission {} to Sheets", id),
            Err(e) => warn!("Failed to mirror submission {} to Sheets: {}", id, e),
        }
    });
}

/// GET /api/submissions?portfolioId=&page=&size=: rows with a company name,
/// latest first.
pub async fn get_submissions(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    query: web::Query<SubmissionListQuery>,
    page: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    user.require_admin()?;

    let submissions =
        submission_db::get_submissions_page(db.get_ref(), query.portfolio_id, page.into_inner())
            .await?
            .map(|(s, p)| SubmissionResponse::with_portfolio(s, p));

    Ok(HttpResponse::Ok().json(submissions))
}

/// GET /api/submissions/{id}
pub async fn get_submission(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    user.require_admin()?;
    let id = path.into_inner();

    let submission = submission_db::get_submission_by_id(db.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Submission {id} not found")))?;
    let portfolio = portfolio_db::get_portfolio_by_id(db.get_ref(), submission.portfolio_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "submission": SubmissionResponse::with_portfolio(submission, portfolio),
    })))
}

/// POST /api/submissions: a draft or a finalized submission.
pub async fn create_submission(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    sheets: Option<web::Data<SheetsClient>>,
    body: web::Json<CreateSubmissionRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let portfolio_id = body.portfolio_id.ok_or_else(|| ApiError::missing("portfolioId"))?;
    let company_name = required(body.company_name, "companyName")?.trim().to_string();
    let pin = pin(body.password)?;
    let responses = responses_object(body.responses)?;
    let is_draft = body.is_draft.unwrap_or(false);

    let portfolio = portfolio_db::get_portfolio_by_id(db.get_ref(), portfolio_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Portfolio {portfolio_id} not found")))?;
    check_answers(db.get_ref(), portfolio_id, &responses, is_draft).await?;

    let pin_hash = password::hash_blocking(pin)
        .await
        .map_err(ApiError::Internal)?;
    let submission = submission_db::insert_submission(
        db.get_ref(),
        NewSubmission {
            portfolio_id,
            company_name,
            pin_hash,
            responses: Value::Object(responses),
            is_draft,
            ip_address: Some(client_ip(&req)),
        },
    )
    .await?;

    info!(
        "Submission {} created for portfolio {} (draft: {})",
        submission.id, portfolio.slug, is_draft
    );
    mirror(sheets, &submission, Some(&portfolio));

    Ok(HttpResponse::Created().json(json!({
        "submission": SubmissionResponse::from(submission),
    })))
}

/// PUT /api/submissions/{id}: update in place. The caller must present the
/// company name and PIN the submission was created with.
pub async fn update_submission(
    db: web::Data<DatabaseConnection>,
    sheets: Option<web::Data<SheetsClient>>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateSubmissionRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let company_name = required(body.company_name, "companyName")?.trim().to_string();
    let pin = required(body.password, "password")?;

    let existing = submission_db::get_submission_by_id(db.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Submission {id} not found")))?;
    let credentials_match = existing.company_name == company_name
        && password::verify_blocking(pin, existing.pin_hash.clone())
            .await
            .map_err(ApiError::Internal)?;
    if !credentials_match {
        warn!("Credential mismatch updating submission {}", id);
        return Err(ApiError::Forbidden(
            "Company name or PIN does not match this submission".to_string(),
        ));
    }

    let responses = match body.responses {
        Some(value) => responses_object(Some(value))?,
        None => responses_object(Some(existing.responses.clone()))?,
    };
    let is_draft = body.is_draft.unwrap_or(existing.is_draft);
    check_answers(db.get_ref(), existing.portfolio_id, &responses, is_draft).await?;

    let was_draft = existing.is_draft;
    let updated = submission_db::update_submission(
        db.get_ref(),
        existing,
        Value::Object(responses),
        body.is_draft,
    )
    .await?;

    if was_draft && !updated.is_draft {
        let portfolio = portfolio_db::get_portfolio_by_id(db.get_ref(), updated.portfolio_id).await?;
        mirror(sheets, &updated, portfolio.as_ref());
    }

    Ok(HttpResponse::Ok().json(json!({
        "submission": SubmissionResponse::from(updated),
    })))
}

/// DELETE /api/submissions/{id}
pub async fn delete_submission(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let ctx = user.require_admin()?;
    let id = path.into_inner();

    let result = submission_db::delete_submission(db.get_ref(), id).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound(format!("Submission {id} not found")));
    }

    info!("Submission {} deleted by {}", id, ctx.user_id);
    Ok(HttpResponse::Ok().json(json!({ "message": format!("Submission {id} deleted") })))
}

/// POST /api/submissions/check: the latest submission to one portfolio whose
/// PIN matches, or `null`. Unknown company and wrong PIN look the same.
pub async fn check_submission(
    db: web::Data<DatabaseConnection>,
    body: web::Json<CheckSubmissionRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let portfolio_id = body.portfolio_id.ok_or_else(|| ApiError::missing("portfolioId"))?;
    let company_name = required(body.company_name, "companyName")?.trim().to_string();
    let pin = required(body.password, "password")?;

    let candidates = submission_db::get_submissions_for_company(
        db.get_ref(),
        &company_name,
        Some(portfolio_id),
    )
    .await?;
    let hashes = candidates.iter().map(|(s, _)| s.pin_hash.clone()).collect();
    let matched = password::first_match_blocking(pin, hashes)
        .await
        .map_err(ApiError::Internal)?;

    let submission = matched
        .and_then(|index| candidates.into_iter().nth(index))
        .map(|(s, p)| SubmissionResponse::with_portfolio(s, p));

    Ok(HttpResponse::Ok().json(json!({ "submission": submission })))
}

/// POST /api/submissions/my-list: every submission across portfolios whose
/// PIN matches, latest first.
pub async fn my_list(
    db: web::Data<DatabaseConnection>,
    body: web::Json<MyListRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let company_name = required(body.company_name, "companyName")?.trim().to_string();
    let pin = required(body.password, "password")?;

    let candidates =
        submission_db::get_submissions_for_company(db.get_ref(), &company_name, None).await?;
    let hashes = candidates.iter().map(|(s, _)| s.pin_hash.clone()).collect();
    let matches = password::verify_each_blocking(pin, hashes)
        .await
        .map_err(ApiError::Internal)?;

    let submissions: Vec<SubmissionResponse> = candidates
        .into_iter()
        .zip(matches)
        .filter(|(_, matched)| *matched)
        .map(|((s, p), _)| SubmissionResponse::with_portfolio(s, p))
        .collect();

    Ok(HttpResponse::Ok().json(json!({ "submissions": submissions })))
}
