use std::future::{Ready, ready};

use actix_web::http::header::Header;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use uuid::Uuid;

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::models::users::Role;

/// Request-scoped identity of an authenticated admin, built from the access
/// token before the handler body runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
}

pub struct AuthenticatedUser(pub AuthContext);

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map(AuthenticatedUser))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthContext, ApiError> {
    // 1. Extract the Bearer token from the Authorization header.
    let bearer = Authorization::<Bearer>::parse(req)
        .map_err(|_| {
            ApiError::Unauthorized("Authorization header must be: Bearer <token>".to_string())
        })?
        .into_scheme();

    // 2. Get the signing keys from app data.
    let keys = req
        .app_data::<web::Data<JwtKeys>>()
        .ok_or_else(|| ApiError::Internal("JWT keys not configured".to_string()))?;

    // 3. Validate the token and lift the claims into a context.
    let claims = keys
        .validate(bearer.token())
        .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {e}")))?;
    let user_id = claims.user_id().map_err(ApiError::Unauthorized)?;

    Ok(AuthContext {
        user_id,
        role: claims.role,
    })
}
