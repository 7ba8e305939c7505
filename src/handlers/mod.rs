pub mod auth;
pub mod categories;
pub mod export;
pub mod members;
pub mod portfolio;
pub mod proxy;
pub mod questions;
pub mod sheets;
pub mod submissions;
pub mod upload;
pub mod users;

use actix_web::{HttpRequest, web};

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // ── Admin session ──
    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(auth::login))
            .route("/refresh", web::post().to(auth::refresh))
            .route("/logout", web::post().to(auth::logout))
            .route("/me", web::get().to(auth::me)),
    );

    // ── Admin users (super admin only) ──
    cfg.service(
        web::resource("/users")
            .route(web::get().to(users::get_users))
            .route(web::post().to(users::create_user)),
    );

    // ── Members: PIN login is public, management is super admin only ──
    cfg.service(
        web::resource("/members")
            .route(web::post().to(members::login))
            .route(web::get().to(members::get_members)),
    );
    cfg.service(
        web::resource("/members/{id}")
            .route(web::get().to(members::get_member))
            .route(web::delete().to(members::delete_member)),
    );

    // ── Categories ──
    cfg.service(
        web::resource("/categories")
            .route(web::get().to(categories::get_categories))
            .route(web::post().to(categories::create_category)),
    );
    cfg.service(
        web::resource("/categories/{id}")
            .route(web::put().to(categories::update_category))
            .route(web::delete().to(categories::delete_category)),
    );

    // ── Portfolios ──
    cfg.service(
        web::resource("/portfolios")
            .route(web::get().to(portfolio::get_portfolios))
            .route(web::post().to(portfolio::create_portfolio)),
    );
    cfg.service(
        web::resource("/portfolios/slug/{slug}")
            .route(web::get().to(portfolio::get_portfolio_by_slug)),
    );
    cfg.service(
        web::resource("/portfolios/{id}")
            .route(web::get().to(portfolio::get_portfolio))
            .route(web::put().to(portfolio::update_portfolio))
            .route(web::delete().to(portfolio::delete_portfolio)),
    );

    // ── Questions ──
    cfg.service(
        web::resource("/questions")
            .route(web::get().to(questions::get_questions))
            .route(web::post().to(questions::create_question)),
    );
    cfg.service(
        web::resource("/questions/{id}")
            .route(web::get().to(questions::get_question))
            .route(web::put().to(questions::update_question))
            .route(web::delete().to(questions::delete_question)),
    );

    // ── Submissions (fixed paths before /{id}) ──
    cfg.service(
        web::scope("/submissions")
            .route("", web::get().to(submissions::get_submissions))
            .route("", web::post().to(submissions::create_submission))
            .route("/check", web::post().to(submissions::check_submission))
            .route("/my-list", web::post().to(submissions::my_list))
            .route("/export", web::get().to(export::export_submissions))
            .route("/{id}", web::get().to(submissions::get_submission))
            .route("/{id}", web::put().to(submissions::update_submission))
            .route("/{id}", web::delete().to(submissions::delete_submission)),
    );

    // ── Relay, uploads, Sheets mirror ──
    cfg.service(web::resource("/proxy").route(web::get().to(proxy::relay)));
    cfg.service(web::resource("/upload").route(web::post().to(upload::upload_file)));
    cfg.service(
        web::resource("/sheets")
            .route(web::post().to(sheets::append_row))
            .route(web::get().to(sheets::get_rows)),
    );
}

/// Caller address: first `X-Forwarded-For` entry, then `X-Real-IP`.
pub fn client_ip(req: &HttpRequest) -> String {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|xff| xff.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| header("x-real-ip"))
        .unwrap_or("unknown")
        .to_string()
}
