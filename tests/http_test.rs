//! Request-level checks through the real route table, backed by an in-memory
//! SQLite database with the real migrations.
//!
//! Run with: `cargo test --test http_test`
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{Value, json};
use uuid::Uuid;

use formfolio_backend::auth::jwt::JwtKeys;
use formfolio_backend::auth::password;
use formfolio_backend::db::portfolio::NewPortfolio;
use formfolio_backend::db::{members, portfolio, submissions};
use formfolio_backend::handlers;
use formfolio_backend::models::submissions::NewSubmission;
use formfolio_backend::models::users::Role;

/// A fake secret for testing, never the deployed one.
const TEST_SECRET: &str = "test-secret-at-least-256-bits-long-for-hs256-xxxxxxx";

async fn setup() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

fn keys() -> JwtKeys {
    JwtKeys::new(TEST_SECRET, Duration::from_secs(900))
}

fn bearer(role: Role) -> (&'static str, String) {
    let token = keys().issue(Uuid::new_v4(), role).unwrap();
    ("Authorization", format!("Bearer {token}"))
}

macro_rules! api {
    ($db:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($db.clone()))
                .app_data(web::Data::new(keys()))
                .service(web::scope("/api").configure(handlers::init_routes)),
        )
        .await
    };
}

async fn seed_submission(db: &DatabaseConnection, pin: &str) -> Uuid {
    let portfolio = portfolio::insert_portfolio(
        db,
        NewPortfolio {
            title: "Seaside Inn".to_string(),
            slug: "seaside".to_string(),
            description: None,
            thumbnail: None,
            domain: None,
            category_id: None,
            is_active: true,
            order: 0,
        },
    )
    .await
    .unwrap();

    submissions::insert_submission(
        db,
        NewSubmission {
            portfolio_id: portfolio.id,
            company_name: "ACME".to_string(),
            pin_hash: password::hash_secret(pin).unwrap(),
            responses: json!({ "note": "first" }),
            is_draft: true,
            ip_address: None,
        },
    )
    .await
    .unwrap()
    .id
}

#[actix_web::test]
async fn test_update_with_wrong_pin_is_forbidden() {
    let db = setup().await;
    let id = seed_submission(&db, "1234").await;
    let app = api!(db);

    let req = test::TestRequest::put()
        .uri(&format!("/api/submissions/{id}"))
        .set_json(json!({
            "companyName": "ACME",
            "password": "9999",
            "responses": { "note": "overwritten" },
            "isDraft": true,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&format!("/api/submissions/{id}"))
        .set_json(json!({
            "companyName": "Globex",
            "password": "1234",
            "isDraft": true,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let stored = submissions::get_submission_by_id(&db, id).await.unwrap().unwrap();
    assert_eq!(stored.responses, json!({ "note": "first" }));
}

#[actix_web::test]
async fn test_update_with_matching_pin_succeeds() {
    let db = setup().await;
    let id = seed_submission(&db, "1234").await;
    let app = api!(db);

    let req = test::TestRequest::put()
        .uri(&format!("/api/submissions/{id}"))
        .set_json(json!({
            "companyName": "ACME",
            "password": "1234",
            "responses": { "note": "second" },
            "isDraft": true,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = submissions::get_submission_by_id(&db, id).await.unwrap().unwrap();
    assert_eq!(stored.responses, json!({ "note": "second" }));
}

#[actix_web::test]
async fn test_admin_routes_reject_missing_token() {
    let db = setup().await;
    let app = api!(db);

    for uri in ["/api/users", "/api/members", "/api/submissions"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[actix_web::test]
async fn test_admin_token_cannot_reach_super_admin_routes() {
    let db = setup().await;
    let app = api!(db);

    for uri in ["/api/users", "/api/members"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer(Role::Admin))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
    }

    // Plain admins may still list submissions.
    let req = test::TestRequest::get()
        .uri("/api/submissions")
        .insert_header(bearer(Role::Admin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_member_wrong_pin_is_unauthorized_and_not_counted() {
    let db = setup().await;
    let app = api!(db);

    let register = test::TestRequest::post()
        .uri("/api/members")
        .set_json(json!({ "companyName": "ACME", "password": "1234" }))
        .to_request();
    let resp = test::call_service(&app, register).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["isNewMember"], json!(true));

    let wrong = test::TestRequest::post()
        .uri("/api/members")
        .set_json(json!({ "companyName": "ACME", "password": "9999" }))
        .to_request();
    let resp = test::call_service(&app, wrong).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let member = members::get_member_by_company(&db, "ACME").await.unwrap().unwrap();
    assert_eq!(member.login_count, 1);
}

#[actix_web::test]
async fn test_member_list_is_paged() {
    let db = setup().await;
    for company in ["A", "B", "C"] {
        members::login_or_register(&db, company, "1234", None).await.unwrap();
    }
    let app = api!(db);

    let req = test::TestRequest::get()
        .uri("/api/members?page=1&size=2")
        .insert_header(bearer(Role::SuperAdmin))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], json!(3));
    assert_eq!(body["page"], json!(1));
    assert_eq!(body["size"], json!(2));
    assert_eq!(body["items"].as_array().map(Vec::len), Some(1));
}
