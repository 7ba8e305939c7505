use sea_orm::prelude::Expr;
use sea_orm::sea_query::ExprTrait;
use sea_orm::*;
use uuid::Uuid;

use crate::auth::password;
use crate::models::members::{self, LoginOutcome};
use crate::models::page::{Page, PageQuery};

/// Log a company in by name + PIN, registering it on first sight.
///
/// An unseen company name creates exactly one member. A known name with the
/// right PIN bumps `login_count` by one in a single UPDATE, so concurrent
/// logins are all counted. A wrong PIN writes nothing.
pub async fn login_or_register(
    db: &DatabaseConnection,
    company_name: &str,
    pin: &str,
    ip_address: Option<String>,
) -> Result<LoginOutcome, DbErr> {
    let now = chrono::Utc::now();

    if let Some(existing) = get_member_by_company(db, company_name).await? {
        let verified = password::verify_blocking(pin.to_string(), existing.pin_hash.clone())
            .await
            .map_err(DbErr::Custom)?;
        if !verified {
            return Ok(LoginOutcome::WrongPin);
        }

        members::Entity::update_many()
            .col_expr(
                members::Column::LoginCount,
                Expr::col(members::Column::LoginCount).add(1),
            )
            .col_expr(members::Column::LastLoginAt, Expr::value(now))
            .filter(members::Column::Id.eq(existing.id))
            .exec(db)
            .await?;

        return get_member_by_id(db, existing.id)
            .await?
            .map(LoginOutcome::LoggedIn)
            .ok_or_else(|| DbErr::RecordNotFound(format!("Member {} not found", existing.id)));
    }

    let pin_hash = password::hash_blocking(pin.to_string())
        .await
        .map_err(DbErr::Custom)?;
    let new_member = members::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_name: Set(company_name.to_string()),
        pin_hash: Set(pin_hash),
        last_login_at: Set(Some(now)),
        login_count: Set(1),
        ip_address: Set(ip_address),
        created_at: Set(now),
    };

    new_member.insert(db).await.map(LoginOutcome::Registered)
}

pub async fn get_member_by_company(
    db: &DatabaseConnection,
    company_name: &str,
) -> Result<Option<members::Model>, DbErr> {
    members::Entity::find()
        .filter(members::Column::CompanyName.eq(company_name))
        .one(db)
        .await
}

/// One page of members, newest first.
pub async fn get_members_page(
    db: &DatabaseConnection,
    query: PageQuery,
) -> Result<Page<members::Model>, DbErr> {
    let paginator = members::Entity::find()
        .order_by_desc(members::Column::CreatedAt)
        .order_by_desc(members::Column::Id)
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

pub async fn get_member_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<members::Model>, DbErr> {
    members::Entity::find_by_id(id).one(db).await
}

pub async fn delete_member(db: &DatabaseConnection, id: Uuid) -> Result<DeleteResult, DbErr> {
    members::Entity::delete_by_id(id).exec(db).await
}
