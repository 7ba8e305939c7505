use actix_web::{HttpRequest, HttpResponse, web};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::auth::password;
use crate::db::members as member_db;
use crate::error::{ApiError, required};
use crate::handlers::client_ip;
use crate::models::members::{LoginOutcome, MemberLoginRequest, MemberResponse};
use crate::models::page::PageQuery;

/// POST /api/members: company name + 4-digit PIN. Registers the company the
/// first time it is seen.
pub async fn login(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    body: web::Json<MemberLoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let company_name = required(body.company_name, "companyName")?.trim().to_string();
    let pin = required(body.password, "password")?;
    if !password::is_valid_pin(&pin) {
        return Err(ApiError::BadRequest(
            "The PIN must be exactly 4 digits".to_string(),
        ));
    }

    let outcome =
        member_db::login_or_register(db.get_ref(), &company_name, &pin, Some(client_ip(&req)))
            .await
            .map_err(|e| ApiError::from_write(e, "This company is already registered"))?;

    let (member, is_new_member, message) = match outcome {
        LoginOutcome::Registered(member) => (member, true, "Registered and logged in"),
        LoginOutcome::LoggedIn(member) => (member, false, "Logged in"),
        LoginOutcome::WrongPin => {
            warn!("Wrong PIN for company {}", company_name);
            return Err(ApiError::Unauthorized("Incorrect PIN".to_string()));
        }
    };

    info!("Member {} logged in (new: {})", member.id, is_new_member);
    Ok(HttpResponse::Ok().json(json!({
        "member": MemberResponse::from(member),
        "isNewMember": is_new_member,
        "message": message,
    })))
}

/// GET /api/members?page=&size=
pub async fn get_members(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    page: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    user.require_super_admin()?;

    let members = member_db::get_members_page(db.get_ref(), page.into_inner())
        .await?
        .map(MemberResponse::from);

    Ok(HttpResponse::Ok().json(members))
}

/// GET /api/members/{id}
pub async fn get_member(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    user.require_super_admin()?;
    let id = path.into_inner();

    let member = member_db::get_member_by_id(db.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Member {id} not found")))?;

    Ok(HttpResponse::Ok().json(json!({ "member": MemberResponse::from(member) })))
}

/// DELETE /api/members/{id}
pub async fn delete_member(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    user.require_super_admin()?;
    let id = path.into_inner();

    let result = member_db::delete_member(db.get_ref(), id).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound(format!("Member {id} not found")));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": format!("Member {id} deleted") })))
}
