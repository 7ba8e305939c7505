//! Persistence against an in-memory SQLite database with the real migrations.
//!
//! Run with: `cargo test --test store_test`
use futures_util::future::join_all;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::json;

use formfolio_backend::auth::password;
use formfolio_backend::db::portfolio::NewPortfolio;
use formfolio_backend::db::questions::NewQuestion;
use formfolio_backend::db::{categories, members, portfolio, questions, submissions, users};
use formfolio_backend::error::ApiError;
use formfolio_backend::models::members::{self as member_model, LoginOutcome};
use formfolio_backend::models::page::{MAX_PAGE_SIZE, PageQuery};
use formfolio_backend::models::portfolio::PortfolioListQuery;
use formfolio_backend::models::questions::QuestionType;
use formfolio_backend::models::submissions::NewSubmission;

async fn setup() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // One connection, so every query sees the same in-memory database.
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

fn new_portfolio(slug: &str) -> NewPortfolio {
    NewPortfolio {
        title: "Seaside Inn".to_string(),
        slug: slug.to_string(),
        description: None,
        thumbnail: None,
        domain: Some("http://seaside.example.com".to_string()),
        category_id: None,
        is_active: true,
        order: 0,
    }
}

fn new_question(portfolio_id: uuid::Uuid, title: &str, step: i32, order: i32) -> NewQuestion {
    NewQuestion {
        portfolio_id,
        step,
        order,
        title: title.to_string(),
        description: String::new(),
        thumbnail: None,
        question_type: QuestionType::Text,
        options: None,
        min_length: 0,
        max_length: 500,
        require_min_length: false,
        is_required: true,
    }
}

fn new_submission(portfolio_id: uuid::Uuid, pin: &str, is_draft: bool) -> NewSubmission {
    NewSubmission {
        portfolio_id,
        company_name: "ACME".to_string(),
        pin_hash: password::hash_secret(pin).unwrap(),
        responses: json!({ "q1": "hello" }),
        is_draft,
        ip_address: Some("10.0.0.1".to_string()),
    }
}

#[tokio::test]
async fn test_member_registers_once_then_logs_in() {
    let db = setup().await;

    let first = members::login_or_register(&db, "ACME", "1234", Some("10.0.0.1".to_string()))
        .await
        .unwrap();
    let LoginOutcome::Registered(member) = first else {
        panic!("expected a new member, got {first:?}");
    };
    assert_eq!(member.login_count, 1);
    assert_ne!(member.pin_hash, "1234");

    let second = members::login_or_register(&db, "ACME", "1234", None).await.unwrap();
    let LoginOutcome::LoggedIn(member) = second else {
        panic!("expected a login, got {second:?}");
    };
    assert_eq!(member.login_count, 2);
    assert_eq!(member.ip_address.as_deref(), Some("10.0.0.1"));

    let wrong = members::login_or_register(&db, "ACME", "9999", None).await.unwrap();
    assert_eq!(wrong, LoginOutcome::WrongPin);

    let all = members::get_members_page(&db, PageQuery::default()).await.unwrap();
    assert_eq!(all.total, 1);
    assert_eq!(all.items[0].login_count, 2);
}

#[tokio::test]
async fn test_wrong_pin_leaves_member_untouched() {
    let db = setup().await;
    members::login_or_register(&db, "ACME", "1234", None).await.unwrap();
    let before = members::get_member_by_company(&db, "ACME").await.unwrap().unwrap();

    let outcome = members::login_or_register(&db, "ACME", "0000", None).await.unwrap();
    assert_eq!(outcome, LoginOutcome::WrongPin);

    let after = members::get_member_by_company(&db, "ACME").await.unwrap().unwrap();
    assert_eq!(after.login_count, before.login_count);
    assert_eq!(after.last_login_at, before.last_login_at);
}

#[tokio::test]
async fn test_concurrent_logins_are_all_counted() {
    let db = setup().await;
    members::login_or_register(&db, "ACME", "1234", None).await.unwrap();

    let logins = (0..5).map(|_| members::login_or_register(&db, "ACME", "1234", None));
    for outcome in join_all(logins).await {
        assert!(matches!(outcome.unwrap(), LoginOutcome::LoggedIn(_)));
    }

    let member = members::get_member_by_company(&db, "ACME").await.unwrap().unwrap();
    assert_eq!(member.login_count, 6);
}

#[tokio::test]
async fn test_legacy_bcrypt_member_can_log_in() {
    let db = setup().await;
    let now = chrono::Utc::now();
    member_model::ActiveModel {
        id: Set(uuid::Uuid::new_v4()),
        company_name: Set("ACME".to_string()),
        pin_hash: Set(bcrypt::hash("1234", 4).unwrap()),
        last_login_at: Set(None),
        login_count: Set(0),
        ip_address: Set(None),
        created_at: Set(now),
    }
    .insert(&db)
    .await
    .unwrap();

    let outcome = members::login_or_register(&db, "ACME", "1234", None).await.unwrap();
    let LoginOutcome::LoggedIn(member) = outcome else {
        panic!("expected a login, got {outcome:?}");
    };
    assert_eq!(member.login_count, 1);
    assert!(member.last_login_at.is_some());
}

#[tokio::test]
async fn test_submission_updated_in_place() {
    let db = setup().await;
    let portfolio = portfolio::insert_portfolio(&db, new_portfolio("seaside")).await.unwrap();

    let draft = submissions::insert_submission(&db, new_submission(portfolio.id, "1234", true))
        .await
        .unwrap();
    assert!(draft.completed_at.is_none());

    let found: Vec<_> =
        submissions::get_submissions_for_company(&db, "ACME", Some(portfolio.id))
            .await
            .unwrap()
            .into_iter()
            .filter(|(s, _)| password::verify_secret("1234", &s.pin_hash))
            .collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].1.as_ref().map(|p| p.slug.as_str()), Some("seaside"));

    let final_row = submissions::update_submission(
        &db,
        found[0].0.clone(),
        json!({ "q1": "world" }),
        Some(false),
    )
    .await
    .unwrap();
    assert_eq!(final_row.id, draft.id);
    assert_eq!(final_row.responses, json!({ "q1": "world" }));
    let completed_at = final_row.completed_at.expect("finalizing stamps completion");

    // A later edit keeps the original completion time and draft state.
    let edited = submissions::update_submission(&db, final_row, json!({ "q1": "again" }), None)
        .await
        .unwrap();
    assert!(!edited.is_draft);
    assert_eq!(edited.completed_at, Some(completed_at));

    let all = submissions::get_submissions_page(&db, Some(portfolio.id), PageQuery::default())
        .await
        .unwrap();
    assert_eq!(all.total, 1);
    assert_eq!(all.items.len(), 1);
}

#[tokio::test]
async fn test_admin_lists_are_paged() {
    let db = setup().await;
    let portfolio = portfolio::insert_portfolio(&db, new_portfolio("seaside")).await.unwrap();
    for _ in 0..12 {
        submissions::insert_submission(&db, new_submission(portfolio.id, "1234", false))
            .await
            .unwrap();
    }

    let first = submissions::get_submissions_page(&db, None, PageQuery::new(0, 5))
        .await
        .unwrap();
    assert_eq!(first.total, 12);
    assert_eq!((first.page, first.size), (0, 5));
    assert_eq!(first.items.len(), 5);

    let last = submissions::get_submissions_page(&db, None, PageQuery::new(2, 5))
        .await
        .unwrap();
    assert_eq!(last.items.len(), 2);

    let beyond = submissions::get_submissions_page(&db, None, PageQuery::new(3, 5))
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 12);

    // Pages never overlap.
    let mut seen: Vec<_> = first.items.iter().map(|(s, _)| s.id).collect();
    let second = submissions::get_submissions_page(&db, None, PageQuery::new(1, 5))
        .await
        .unwrap();
    seen.extend(second.items.iter().map(|(s, _)| s.id));
    seen.extend(last.items.iter().map(|(s, _)| s.id));
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 12);

    for company in ["A", "B", "C"] {
        members::login_or_register(&db, company, "1234", None).await.unwrap();
    }
    let members_page = members::get_members_page(&db, PageQuery::new(0, 2)).await.unwrap();
    assert_eq!(members_page.total, 3);
    assert_eq!(members_page.items.len(), 2);
}

#[test]
fn test_page_query_defaults_and_clamps() {
    let defaults = PageQuery::default();
    assert_eq!((defaults.page(), defaults.size()), (0, 10));
    assert_eq!(PageQuery::new(0, 0).size(), 1);
    assert_eq!(PageQuery::new(0, 10_000).size(), MAX_PAGE_SIZE);
}

#[tokio::test]
async fn test_wrong_pin_finds_nothing() {
    let db = setup().await;
    let portfolio = portfolio::insert_portfolio(&db, new_portfolio("seaside")).await.unwrap();
    submissions::insert_submission(&db, new_submission(portfolio.id, "1234", false))
        .await
        .unwrap();

    let rows = submissions::get_submissions_for_company(&db, "ACME", None).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(!password::verify_secret("4321", &rows[0].0.pin_hash));

    let other = submissions::get_submissions_for_company(&db, "Globex", None).await.unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn test_export_reads_only_final_rows() {
    let db = setup().await;
    let portfolio = portfolio::insert_portfolio(&db, new_portfolio("seaside")).await.unwrap();
    submissions::insert_submission(&db, new_submission(portfolio.id, "1111", true))
        .await
        .unwrap();
    let done = submissions::insert_submission(&db, new_submission(portfolio.id, "2222", false))
        .await
        .unwrap();

    let rows = submissions::get_submissions_for_export(&db, portfolio.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, done.id);
}

#[tokio::test]
async fn test_questions_come_back_in_display_order() {
    let db = setup().await;
    let portfolio = portfolio::insert_portfolio(&db, new_portfolio("seaside")).await.unwrap();
    for (title, step, order) in [("C", 2, 0), ("B", 1, 2), ("A", 1, 1)] {
        questions::insert_question(&db, new_question(portfolio.id, title, step, order))
            .await
            .unwrap();
    }

    let titles: Vec<String> = questions::get_questions(&db, Some(portfolio.id))
        .await
        .unwrap()
        .into_iter()
        .map(|q| q.title)
        .collect();
    assert_eq!(titles, ["A", "B", "C"]);
}

#[tokio::test]
async fn test_deleting_portfolio_cascades() {
    let db = setup().await;
    let portfolio = portfolio::insert_portfolio(&db, new_portfolio("seaside")).await.unwrap();
    questions::insert_question(&db, new_question(portfolio.id, "Name", 1, 0))
        .await
        .unwrap();
    submissions::insert_submission(&db, new_submission(portfolio.id, "1234", false))
        .await
        .unwrap();

    let result = portfolio::delete_portfolio(&db, portfolio.id).await.unwrap();
    assert_eq!(result.rows_affected, 1);

    assert!(questions::get_questions(&db, Some(portfolio.id)).await.unwrap().is_empty());
    assert!(
        submissions::get_submissions_for_company(&db, "ACME", None)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_summaries_count_questions_and_submissions() {
    let db = setup().await;
    let category = categories::insert_category(&db, "Hotels".to_string(), "hotels".to_string(), 0)
        .await
        .unwrap();
    let portfolio = portfolio::insert_portfolio(
        &db,
        NewPortfolio {
            category_id: Some(category.id),
            ..new_portfolio("seaside")
        },
    )
    .await
    .unwrap();
    questions::insert_question(&db, new_question(portfolio.id, "Name", 1, 0))
        .await
        .unwrap();
    submissions::insert_submission(&db, new_submission(portfolio.id, "1234", false))
        .await
        .unwrap();

    let summaries = portfolio::get_portfolio_summaries(
        &db,
        &PortfolioListQuery {
            active: Some(true),
            category_id: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].question_count, 1);
    assert_eq!(summaries[0].submission_count, 1);
    assert_eq!(
        summaries[0].category.as_ref().map(|c| c.slug.as_str()),
        Some("hotels")
    );

    let counts = categories::get_categories_with_counts(&db).await.unwrap();
    assert_eq!(counts[0].portfolio_count, 1);
}

#[tokio::test]
async fn test_duplicate_slug_is_reported() {
    let db = setup().await;
    portfolio::insert_portfolio(&db, new_portfolio("seaside")).await.unwrap();

    let err = portfolio::insert_portfolio(&db, new_portfolio("seaside"))
        .await
        .unwrap_err();
    let mapped = ApiError::from_write(err, "A portfolio with this slug already exists");
    assert!(matches!(mapped, ApiError::Duplicate(_)));
}

#[tokio::test]
async fn test_super_admin_seed_is_idempotent() {
    let db = setup().await;
    let hash = password::hash_secret("secret").unwrap();

    assert!(users::ensure_super_admin(&db, "root@example.com", hash.clone(), "Root").await.unwrap());
    assert!(!users::ensure_super_admin(&db, "root@example.com", hash, "Root").await.unwrap());

    let all = users::get_users_page(&db, PageQuery::default()).await.unwrap();
    assert_eq!(all.total, 1);
    assert!(password::verify_secret("secret", &all.items[0].password_hash));
}
