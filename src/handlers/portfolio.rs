use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::db::portfolio::{self as portfolio_db, NewPortfolio};
use crate::db::questions as question_db;
use crate::error::{ApiError, required};
use crate::models::portfolio::{
    self, CreatePortfolio, PortfolioDetail, PortfolioListQuery, UpdatePortfolio,
};

const DUPLICATE_SLUG: &str = "A portfolio with this slug already exists";

async fn detail(
    db: &DatabaseConnection,
    portfolio: portfolio::Model,
) -> Result<PortfolioDetail, ApiError> {
    let questions = question_db::get_questions(db, Some(portfolio.id)).await?;
    Ok(PortfolioDetail {
        portfolio,
        questions,
    })
}

/// GET /api/portfolios?active=&categoryId=
pub async fn get_portfolios(
    db: web::Data<DatabaseConnection>,
    query: web::Query<PortfolioListQuery>,
) -> Result<HttpResponse, ApiError> {
    let portfolios = portfolio_db::get_portfolio_summaries(db.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(json!({ "portfolios": portfolios })))
}

/// GET /api/portfolios/{id}: the portfolio with its questions in display order.
pub async fn get_portfolio(
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let portfolio = portfolio_db::get_portfolio_by_id(db.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Portfolio {id} not found")))?;

    let detail = detail(db.get_ref(), portfolio).await?;
    Ok(HttpResponse::Ok().json(json!({ "portfolio": detail })))
}

/// GET /api/portfolios/slug/{slug}
pub async fn get_portfolio_by_slug(
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let slug = path.into_inner();
    let portfolio = portfolio_db::get_portfolio_by_slug(db.get_ref(), &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Portfolio '{slug}' not found")))?;

    let detail = detail(db.get_ref(), portfolio).await?;
    Ok(HttpResponse::Ok().json(json!({ "portfolio": detail })))
}

/// POST /api/portfolios
pub async fn create_portfolio(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreatePortfolio>,
) -> Result<HttpResponse, ApiError> {
    let ctx = user.require_admin()?;
    let body = body.into_inner();

    let input = NewPortfolio {
        title: required(body.title, "title")?.trim().to_string(),
        slug: required(body.slug, "slug")?.trim().to_string(),
        description: body.description,
        thumbnail: body.thumbnail,
        domain: body.domain,
        category_id: body.category_id,
        is_active: body.is_active.unwrap_or(true),
        order: body.order.unwrap_or(0),
    };

    let created = portfolio_db::insert_portfolio(db.get_ref(), input)
        .await
        .map_err(|e| ApiError::from_write(e, DUPLICATE_SLUG))?;

    info!("Portfolio {} created by {}", created.slug, ctx.user_id);
    Ok(HttpResponse::Created().json(json!({ "portfolio": created })))
}

/// PUT /api/portfolios/{id}
pub async fn update_portfolio(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePortfolio>,
) -> Result<HttpResponse, ApiError> {
    user.require_admin()?;

    let updated = portfolio_db::update_portfolio(db.get_ref(), path.into_inner(), body.into_inner())
        .await
        .map_err(|e| ApiError::from_write(e, DUPLICATE_SLUG))?;

    Ok(HttpResponse::Ok().json(json!({ "portfolio": updated })))
}

/// DELETE /api/portfolios/{id}: its questions and submissions go with it.
pub async fn delete_portfolio(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let ctx = user.require_admin()?;
    let id = path.into_inner();

    let result = portfolio_db::delete_portfolio(db.get_ref(), id).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound(format!("Portfolio {id} not found")));
    }

    info!("Portfolio {} deleted by {}", id, ctx.user_id);
    Ok(HttpResponse::Ok().json(json!({ "message": format!("Portfolio {id} deleted") })))
}
