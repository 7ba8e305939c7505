use actix_web::cookie::{Cookie, SameSite, time};
use actix_web::{HttpRequest, HttpResponse, web};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::{info, warn};

use crate::auth::jwt::JwtKeys;
use crate::auth::middleware::AuthenticatedUser;
use crate::auth::password;
use crate::db::users as user_db;
use crate::error::{ApiError, required};
use crate::models::users::{self, LoginRequest, UserResponse};
use crate::sessions::RefreshStore;

pub const REFRESH_COOKIE: &str = "refresh_token";
const COOKIE_PATH: &str = "/api/auth";

/// Cookie attributes that depend on deployment.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
}

fn refresh_cookie(token: String, store: &RefreshStore, settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, token)
        .path(COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(settings.secure)
        .max_age(time::Duration::seconds(store.ttl().as_secs() as i64))
        .finish()
}

fn cleared_cookie(settings: &CookieSettings) -> Cookie<'static> {
    let mut cookie = Cookie::build(REFRESH_COOKIE, "")
        .path(COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(settings.secure)
        .finish();
    cookie.make_removal();
    cookie
}

fn session_error(e: redis::RedisError) -> ApiError {
    ApiError::Internal(format!("Session store error: {e}"))
}

/// Issue a fresh access/refresh pair for `user`.
async fn start_session(
    user: users::Model,
    keys: &JwtKeys,
    store: &RefreshStore,
    settings: &CookieSettings,
) -> Result<HttpResponse, ApiError> {
    let access_token = keys.issue(user.id, user.role).map_err(ApiError::Internal)?;
    let refresh_token = store.issue(user.id).await.map_err(session_error)?;

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(refresh_token, store, settings))
        .json(json!({
            "accessToken": access_token,
            "expiresIn": keys.ttl().as_secs(),
            "user": UserResponse::from(user),
        })))
}

/// POST /api/auth/login: email + password for an admin account.
pub async fn login(
    db: web::Data<DatabaseConnection>,
    keys: web::Data<JwtKeys>,
    store: web::Data<RefreshStore>,
    settings: web::Data<CookieSettings>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let email = required(body.email, "email")?;
    let secret = required(body.password, "password")?;

    let user = user_db::get_user_by_email(db.get_ref(), email.trim()).await?;
    let verified = match &user {
        Some(u) => password::verify_blocking(secret, u.password_hash.clone())
            .await
            .map_err(ApiError::Internal)?,
        None => false,
    };
    let Some(user) = user.filter(|_| verified) else {
        warn!("Failed admin login for {}", email);
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    };

    info!("Admin {} logged in", user.id);
    start_session(user, &keys, &store, &settings).await
}

/// POST /api/auth/refresh: rotate the refresh cookie and mint a new access token.
pub async fn refresh(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    keys: web::Data<JwtKeys>,
    store: web::Data<RefreshStore>,
    settings: web::Data<CookieSettings>,
) -> Result<HttpResponse, ApiError> {
    let token = req
        .cookie(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Refresh token missing".to_string()))?;

    let user_id = store
        .consume(&token)
        .await
        .map_err(session_error)?
        .ok_or_else(|| ApiError::Unauthorized("Refresh token is invalid or expired".to_string()))?;

    let user = user_db::get_user_by_id(db.get_ref(), user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    start_session(user, &keys, &store, &settings).await
}

/// POST /api/auth/logout
pub async fn logout(
    req: HttpRequest,
    store: web::Data<RefreshStore>,
    settings: web::Data<CookieSettings>,
) -> HttpResponse {
    if let Some(cookie) = req.cookie(REFRESH_COOKIE) {
        if let Err(e) = store.revoke(cookie.value()).await {
            warn!("Failed to revoke refresh token: {}", e);
        }
    }

    HttpResponse::Ok()
        .cookie(cleared_cookie(&settings))
        .json(json!({ "message": "Logged out" }))
}

/// GET /api/auth/me
pub async fn me(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let ctx = user.require_admin()?;
    let user = user_db::get_user_by_id(db.get_ref(), ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    Ok(HttpResponse::Ok().json(json!({ "user": UserResponse::from(user) })))
}
