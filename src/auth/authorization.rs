use crate::auth::middleware::{AuthContext, AuthenticatedUser};
use crate::error::ApiError;
use crate::models::users::Role;

impl AuthContext {
    /// ADMIN or SUPER_ADMIN.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        match self.role {
            Role::Admin | Role::SuperAdmin => Ok(()),
        }
    }

    pub fn require_super_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::SuperAdmin {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "Super admin privileges are required".to_string(),
            ))
        }
    }
}

impl AuthenticatedUser {
    pub fn require_admin(&self) -> Result<&AuthContext, ApiError> {
        self.0.require_admin().map(|_| &self.0)
    }

    pub fn require_super_admin(&self) -> Result<&AuthContext, ApiError> {
        self.0.require_super_admin().map(|_| &self.0)
    }
}
