use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// SeaORM entity for the `form_submissions` table.
///
/// `responses` is a JSON object keyed by question id (plus conventional keys
/// such as `rooms`). Keys are not checked against the portfolio's questions.
/// `pin_hash` is only ever verified through `auth::password`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "form_submissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub company_name: String,
    pub pin_hash: String,
    pub responses: Json,
    pub is_draft: bool,
    pub ip_address: Option<String>,
    pub completed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::portfolio::Entity",
        from = "Column::PortfolioId",
        to = "super::portfolio::Column::Id"
    )]
    Portfolio,
}

impl Related<super::portfolio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Portfolio.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    pub portfolio_id: Option<Uuid>,
    pub company_name: Option<String>,
    pub password: Option<String>,
    pub responses: Option<Json>,
    pub is_draft: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubmissionRequest {
    pub company_name: Option<String>,
    pub password: Option<String>,
    pub responses: Option<Json>,
    pub is_draft: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSubmissionRequest {
    pub portfolio_id: Option<Uuid>,
    pub company_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyListRequest {
    pub company_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionListQuery {
    pub portfolio_id: Option<Uuid>,
}

/// Validated input for inserting a submission.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub portfolio_id: Uuid,
    pub company_name: String,
    pub pin_hash: String,
    pub responses: Json,
    pub is_draft: bool,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioRef {
    pub title: String,
    pub slug: String,
}

/// A submission as returned by the API (never includes the PIN hash).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub company_name: String,
    pub responses: Json,
    pub is_draft: bool,
    pub ip_address: Option<String>,
    pub completed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<PortfolioRef>,
}

impl From<Model> for SubmissionResponse {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            portfolio_id: m.portfolio_id,
            company_name: m.company_name,
            responses: m.responses,
            is_draft: m.is_draft,
            ip_address: m.ip_address,
            completed_at: m.completed_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
            portfolio: None,
        }
    }
}

impl SubmissionResponse {
    pub fn with_portfolio(m: Model, portfolio: Option<super::portfolio::Model>) -> Self {
        let mut response = Self::from(m);
        response.portfolio = portfolio.map(|p| PortfolioRef {
            title: p.title,
            slug: p.slug,
        });
        response
    }
}
