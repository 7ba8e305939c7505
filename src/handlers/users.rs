use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::info;

use crate::auth::middleware::AuthenticatedUser;
use crate::auth::password;
use crate::db::users as user_db;
use crate::error::{ApiError, required};
use crate::models::page::PageQuery;
use crate::models::users::{CreateUserRequest, NewUser, Role, UserResponse};

/// GET /api/users?page=&size=: admin accounts, newest first.
pub async fn get_users(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    page: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    user.require_super_admin()?;

    let users = user_db::get_users_page(db.get_ref(), page.into_inner())
        .await?
        .map(UserResponse::from);

    Ok(HttpResponse::Ok().json(users))
}

/// POST /api/users: create an admin. The role is fixed at creation.
pub async fn create_user(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let ctx = user.require_super_admin()?;
    let body = body.into_inner();

    let email = required(body.email, "email")?.trim().to_string();
    let secret = required(body.password, "password")?;
    let name = required(body.name, "name")?.trim().to_string();
    let password_hash = password::hash_blocking(secret)
        .await
        .map_err(ApiError::Internal)?;

    let created = user_db::insert_user(
        db.get_ref(),
        NewUser {
            email,
            password_hash,
            name,
            role: body.role.unwrap_or(Role::Admin),
            created_by: Some(ctx.user_id),
        },
    )
    .await
    .map_err(|e| ApiError::from_write(e, "A user with this email already exists"))?;

    info!("User {} created by {}", created.id, ctx.user_id);
    Ok(HttpResponse::Created().json(json!({ "user": UserResponse::from(created) })))
}
