use sea_orm::*;
use uuid::Uuid;

use crate::models::page::{Page, PageQuery};
use crate::models::users::{self, NewUser, Role};

/// Insert a new admin user.
pub async fn insert_user(db: &DatabaseConnection, input: NewUser) -> Result<users::Model, DbErr> {
    let new_user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(input.email),
        password_hash: Set(input.password_hash),
        name: Set(input.name),
        role: Set(input.role),
        created_by: Set(input.created_by),
        created_at: Set(chrono::Utc::now()),
    };

    new_user.insert(db).await
}

/// One page of users, newest first.
pub async fn get_users_page(
    db: &DatabaseConnection,
    query: PageQuery,
) -> Result<Page<users::Model>, DbErr> {
    let paginator = users::Entity::find()
        .order_by_desc(users::Column::CreatedAt)
        .order_by_desc(users::Column::Id)
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

/// Fetch a single user by ID.
pub async fn get_user_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find_by_id(id).one(db).await
}

pub async fn get_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await
}

/// Create the bootstrap super-admin unless a user with that email exists.
/// Returns `true` when a user was created.
pub async fn ensure_super_admin(
    db: &DatabaseConnection,
    email: &str,
    password_hash: String,
    name: &str,
) -> Result<bool, DbErr> {
    if get_user_by_email(db, email).await?.is_some() {
        return Ok(false);
    }

    insert_user(
        db,
        NewUser {
            email: email.to_string(),
            password_hash,
            name: name.to_string(),
            role: Role::SuperAdmin,
            created_by: None,
        },
    )
    .await?;

    Ok(true)
}
