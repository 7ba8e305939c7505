use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use serde_json::json;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::db::categories as category_db;
use crate::error::{ApiError, required};
use crate::models::categories::{CreateCategory, UpdateCategory};

const DUPLICATE_SLUG: &str = "A category with this slug already exists";

/// GET /api/categories: display order, each with its portfolio count.
pub async fn get_categories(
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let categories = category_db::get_categories_with_counts(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "categories": categories })))
}

/// POST /api/categories
pub async fn create_category(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateCategory>,
) -> Result<HttpResponse, ApiError> {
    user.require_admin()?;
    let body = body.into_inner();

    let name = required(body.name, "name")?.trim().to_string();
    let slug = required(body.slug, "slug")?.trim().to_string();

    let category = category_db::insert_category(db.get_ref(), name, slug, body.order.unwrap_or(0))
        .await
        .map_err(|e| ApiError::from_write(e, DUPLICATE_SLUG))?;

    Ok(HttpResponse::Created().json(json!({ "category": category })))
}

/// PUT /api/categories/{id}
pub async fn update_category(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCategory>,
) -> Result<HttpResponse, ApiError> {
    user.require_admin()?;

    let category = category_db::update_category(db.get_ref(), path.into_inner(), body.into_inner())
        .await
        .map_err(|e| ApiError::from_write(e, DUPLICATE_SLUG))?;

    Ok(HttpResponse::Ok().json(json!({ "category": category })))
}

/// DELETE /api/categories/{id}: portfolios filed under it are detached.
pub async fn delete_category(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    user.require_admin()?;
    let id = path.into_inner();

    let result = category_db::delete_category(db.get_ref(), id).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound(format!("Category {id} not found")));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": format!("Category {id} deleted") })))
}
