use sea_orm::*;
use sea_orm::prelude::Json;
use uuid::Uuid;

use crate::models::page::{Page, PageQuery};
use crate::models::portfolio;
use crate::models::submissions::{self, NewSubmission};

/// Insert a new submission. A non-draft row is stamped as completed.
pub async fn insert_submission(
    db: &DatabaseConnection,
    input: NewSubmission,
) -> Result<submissions::Model, DbErr> {
    let now = chrono::Utc::now();
    let new_submission = submissions::ActiveModel {
        id: Set(Uuid::new_v4()),
        portfolio_id: Set(input.portfolio_id),
        company_name: Set(input.company_name),
        pin_hash: Set(input.pin_hash),
        responses: Set(input.responses),
        is_draft: Set(input.is_draft),
        ip_address: Set(input.ip_address),
        completed_at: Set((!input.is_draft).then_some(now)),
        created_at: Set(now),
        updated_at: Set(now),
    };

    new_submission.insert(db).await
}

pub async fn get_submission_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<submissions::Model>, DbErr> {
    submissions::Entity::find_by_id(id).one(db).await
}

/// Admin listing: rows with a company name, most recently updated first,
/// each with its portfolio.
pub async fn get_submissions_page(
    db: &DatabaseConnection,
    portfolio_id: Option<Uuid>,
    query: PageQuery,
) -> Result<Page<(submissions::Model, Option<portfolio::Model>)>, DbErr> {
    let mut select =
        submissions::Entity::find().filter(submissions::Column::CompanyName.ne(""));
    if let Some(portfolio_id) = portfolio_id {
        select = select.filter(submissions::Column::PortfolioId.eq(portfolio_id));
    }

    let paginator = select
        .order_by_desc(submissions::Column::UpdatedAt)
        .order_by_desc(submissions::Column::Id)
        .find_also_related(portfolio::Entity)
        .paginate(db, query.size());
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(query.page()).await?;

    Ok(Page {
        items,
        total,
        page: query.page(),
        size: query.size(),
    })
}

/// Candidate rows for a PIN check: every submission under `company_name`
/// (optionally within one portfolio), most recently updated first.
pub async fn get_submissions_for_company(
    db: &DatabaseConnection,
    company_name: &str,
    portfolio_id: Option<Uuid>,
) -> Result<Vec<(submissions::Model, Option<portfolio::Model>)>, DbErr> {
    let mut select =
        submissions::Entity::find().filter(submissions::Column::CompanyName.eq(company_name));
    if let Some(portfolio_id) = portfolio_id {
        select = select.filter(submissions::Column::PortfolioId.eq(portfolio_id));
    }

    select
        .order_by_desc(submissions::Column::UpdatedAt)
        .find_also_related(portfolio::Entity)
        .all(db)
        .await
}

/// Export input: finalized rows with a company name, newest completion first.
pub async fn get_submissions_for_export(
    db: &DatabaseConnection,
    portfolio_id: Uuid,
) -> Result<Vec<submissions::Model>, DbErr> {
    submissions::Entity::find()
        .filter(submissions::Column::PortfolioId.eq(portfolio_id))
        .filter(submissions::Column::IsDraft.eq(false))
        .filter(submissions::Column::CompanyName.ne(""))
        .order_by_desc(submissions::Column::CompletedAt)
        .all(db)
        .await
}

/// Replace the responses of an existing submission in place.
///
/// `is_draft` of `None` keeps the current state. `completed_at` is set the
/// first time the row becomes final.
pub async fn update_submission(
    db: &DatabaseConnection,
    existing: submissions::Model,
    responses: Json,
    is_draft: Option<bool>,
) -> Result<submissions::Model, DbErr> {
    let now = chrono::Utc::now();
    let is_draft = is_draft.unwrap_or(existing.is_draft);
    let completed_at = match existing.completed_at {
        Some(at) => Some(at),
        None if !is_draft => Some(now),
        None => None,
    };

    let mut active: submissions::ActiveModel = existing.into();
    active.responses = Set(responses);
    active.is_draft = Set(is_draft);
    active.completed_at = Set(completed_at);
    active.updated_at = Set(now);

    active.update(db).await
}

/// Delete a submission by ID.
pub async fn delete_submission(db: &DatabaseConnection, id: Uuid) -> Result<DeleteResult, DbErr> {
    submissions::Entity::delete_by_id(id).exec(db).await
}
