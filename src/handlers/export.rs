use actix_web::http::header;
use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::db::portfolio as portfolio_db;
use crate::db::questions as question_db;
use crate::db::submissions as submission_db;
use crate::error::ApiError;
use crate::export::{self, ExportConvention, ExportError, xlsx};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub portfolio_id: Option<Uuid>,
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::NoData => ApiError::NotFound(err.to_string()),
            ExportError::Render(e) => ApiError::Internal(format!("Failed to render export: {e}")),
        }
    }
}

/// GET /api/submissions/export?portfolioId=: finalized submissions as xlsx.
pub async fn export_submissions(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    conventions: web::Data<Vec<ExportConvention>>,
    query: web::Query<ExportQuery>,
) -> Result<HttpResponse, ApiError> {
    let ctx = user.require_admin()?;
    let portfolio_id = query.portfolio_id.ok_or_else(|| ApiError::missing("portfolioId"))?;

    let portfolio = portfolio_db::get_portfolio_by_id(db.get_ref(), portfolio_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Portfolio {portfolio_id} not found")))?;
    let submissions = submission_db::get_submissions_for_export(db.get_ref(), portfolio_id).await?;
    let questions = question_db::get_questions(db.get_ref(), Some(portfolio_id)).await?;

    let sheet = export::build_sheet(&questions, &submissions, &conventions)?;
    let bytes = xlsx::render(&sheet)?;
    let filename = export::download_filename(&portfolio.title, chrono::Utc::now().date_naive());

    info!(
        "Exported {} submissions of {} for {}",
        sheet.rows.len(),
        portfolio.slug,
        ctx.user_id
    );

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, xlsx::CONTENT_TYPE))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename*=UTF-8''{filename}"),
        ))
        .body(bytes))
}
