use sea_orm::*;
use uuid::Uuid;

use crate::models::portfolio::{self, PortfolioListQuery, PortfolioSummary, UpdatePortfolio};
use crate::models::{categories, questions, submissions};

/// Validated input for inserting a portfolio.
#[derive(Debug, Clone)]
pub struct NewPortfolio {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub domain: Option<String>,
    pub category_id: Option<Uuid>,
    pub is_active: bool,
    pub order: i32,
}

/// Insert a new portfolio.
pub async fn insert_portfolio(
    db: &DatabaseConnection,
    input: NewPortfolio,
) -> Result<portfolio::Model, DbErr> {
    let now = chrono::Utc::now();
    let new_portfolio = portfolio::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(input.title),
        slug: Set(input.slug),
        description: Set(input.description),
        thumbnail: Set(input.thumbnail),
        domain: Set(input.domain),
        category_id: Set(input.category_id),
        is_active: Set(input.is_active),
        sort_order: Set(input.order),
        created_at: Set(now),
        updated_at: Set(now),
    };

    new_portfolio.insert(db).await
}

/// Fetch portfolios in display order with their category and counts.
/// Only submissions with a company name count.
pub async fn get_portfolio_summaries(
    db: &DatabaseConnection,
    query: &PortfolioListQuery,
) -> Result<Vec<PortfolioSummary>, DbErr> {
    let mut select = portfolio::Entity::find();
    if query.active == Some(true) {
        select = select.filter(portfolio::Column::IsActive.eq(true));
    }
    if let Some(category_id) = query.category_id {
        select = select.filter(portfolio::Column::CategoryId.eq(category_id));
    }

    let rows = select
        .order_by_asc(portfolio::Column::SortOrder)
        .find_also_related(categories::Entity)
        .all(db)
        .await?;

    let mut result = Vec::with_capacity(rows.len());
    for (portfolio, category) in rows {
        let question_count = questions::Entity::find()
            .filter(questions::Column::PortfolioId.eq(portfolio.id))
            .count(db)
            .await?;
        let submission_count = submissions::Entity::find()
            .filter(submissions::Column::PortfolioId.eq(portfolio.id))
            .filter(submissions::Column::CompanyName.ne(""))
            .count(db)
            .await?;
        result.push(PortfolioSummary {
            portfolio,
            category,
            question_count,
            submission_count,
        });
    }

    Ok(result)
}

/// Fetch a single portfolio by ID.
pub async fn get_portfolio_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<portfolio::Model>, DbErr> {
    portfolio::Entity::find_by_id(id).one(db).await
}

pub async fn get_portfolio_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<Option<portfolio::Model>, DbErr> {
    portfolio::Entity::find()
        .filter(portfolio::Column::Slug.eq(slug))
        .one(db)
        .await
}

/// Update an existing portfolio.
pub async fn update_portfolio(
    db: &DatabaseConnection,
    id: Uuid,
    input: UpdatePortfolio,
) -> Result<portfolio::Model, DbErr> {
    let item = portfolio::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(DbErr::RecordNotFound("Portfolio not found".to_string()))?;

    let mut active: portfolio::ActiveModel = item.into();

    if let Some(title) = input.title {
        active.title = Set(title);
    }
    if let Some(slug) = input.slug {
        active.slug = Set(slug);
    }
    if let Some(description) = input.description {
        active.description = Set(Some(description));
    }
    if let Some(thumbnail) = input.thumbnail {
        active.thumbnail = Set(Some(thumbnail));
    }
    if let Some(domain) = input.domain {
        active.domain = Set(Some(domain));
    }
    if let Some(category_id) = input.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(is_active) = input.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(order) = input.order {
        active.sort_order = Set(order);
    }
    active.updated_at = Set(chrono::Utc::now());

    active.update(db).await
}

/// Delete a portfolio by ID.
pub async fn delete_portfolio(db: &DatabaseConnection, id: Uuid) -> Result<DeleteResult, DbErr> {
    portfolio::Entity::delete_by_id(id).exec(db).await
}
