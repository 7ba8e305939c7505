use sea_orm::*;
use uuid::Uuid;

use crate::models::categories::{self, CategoryWithCount, UpdateCategory};
use crate::models::portfolio;

/// Insert a new category.
pub async fn insert_category(
    db: &DatabaseConnection,
    name: String,
    slug: String,
    order: i32,
) -> Result<categories::Model, DbErr> {
    let new_category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        slug: Set(slug),
        sort_order: Set(order),
        created_at: Set(chrono::Utc::now()),
    };

    new_category.insert(db).await
}

/// Fetch all categories in display order with their portfolio counts.
pub async fn get_categories_with_counts(
    db: &DatabaseConnection,
) -> Result<Vec<CategoryWithCount>, DbErr> {
    let categories = categories::Entity::find()
        .order_by_asc(categories::Column::SortOrder)
        .all(db)
        .await?;

    let mut result = Vec::with_capacity(categories.len());
    for category in categories {
        let portfolio_count = portfolio::Entity::find()
            .filter(portfolio::Column::CategoryId.eq(category.id))
            .count(db)
            .await?;
        result.push(CategoryWithCount {
            category,
            portfolio_count,
        });
    }

    Ok(result)
}

/// Update an existing category.
pub async fn update_category(
    db: &DatabaseConnection,
    id: Uuid,
    input: UpdateCategory,
) -> Result<categories::Model, DbErr> {
    let category = categories::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(DbErr::RecordNotFound("Category not found".to_string()))?;

    let mut active: categories::ActiveModel = category.into();

    if let Some(name) = input.name {
        active.name = Set(name);
    }
    if let Some(slug) = input.slug {
        active.slug = Set(slug);
    }
    if let Some(order) = input.order {
        active.sort_order = Set(order);
    }

    active.update(db).await
}

/// Delete a category by ID. Portfolios filed under it are not checked.
pub async fn delete_category(db: &DatabaseConnection, id: Uuid) -> Result<DeleteResult, DbErr> {
    categories::Entity::delete_by_id(id).exec(db).await
}
