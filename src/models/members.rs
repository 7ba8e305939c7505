use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// SeaORM entity for the `members` table: PIN-authenticated submitting companies.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub company_name: String,
    pub pin_hash: String,
    pub last_login_at: Option<DateTimeUtc>,
    pub login_count: i32,
    pub ip_address: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLoginRequest {
    pub company_name: Option<String>,
    pub password: Option<String>,
}

/// Result of a company-name + PIN login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Unseen company name: a member was created and logged in.
    Registered(Model),
    /// Existing member with a matching PIN; login bookkeeping updated.
    LoggedIn(Model),
    /// Existing member, wrong PIN. Nothing was written.
    WrongPin,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: Uuid,
    pub company_name: String,
    pub last_login_at: Option<DateTimeUtc>,
    pub login_count: i32,
    pub ip_address: Option<String>,
    pub created_at: DateTimeUtc,
}

impl From<Model> for MemberResponse {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            company_name: m.company_name,
            last_login_at: m.last_login_at,
            login_count: m.login_count,
            ip_address: m.ip_address,
            created_at: m.created_at,
        }
    }
}
