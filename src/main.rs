use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use formfolio_backend::auth::jwt::JwtKeys;
use formfolio_backend::auth::password;
use formfolio_backend::config::AppConfig;
use formfolio_backend::db::{self, users};
use formfolio_backend::error::ApiError;
use formfolio_backend::export::default_conventions;
use formfolio_backend::handlers::{self, auth::CookieSettings};
use formfolio_backend::proxy::ProxyClient;
use formfolio_backend::sessions::RefreshStore;
use formfolio_backend::sheets::SheetsClient;
use formfolio_backend::uploads::{self, UploadStore};
use formfolio_backend::create_pool;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let db = create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    db::run_migrations(&db)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    if let Some(seed) = &config.seed_admin {
        let hash = password::hash_secret(&seed.password).expect("Failed to hash seed password");
        let created = users::ensure_super_admin(&db, &seed.email, hash, &seed.name)
            .await
            .expect("Failed to seed super admin");
        if created {
            tracing::info!("Seeded super admin {}", seed.email);
        }
    }
    let db_data = web::Data::new(db);

    // Refresh tokens live in Redis.
    let refresh_store = RefreshStore::new(&config.redis_url, config.refresh_token_ttl)
        .await
        .expect("Failed to connect to Redis");
    let refresh_data = web::Data::new(refresh_store);
    tracing::info!("Connected to Redis");

    let jwt_keys = web::Data::new(JwtKeys::new(&config.jwt_secret, config.access_token_ttl));
    let cookie_settings = web::Data::new(CookieSettings {
        secure: config.cookie_secure,
    });

    let proxy_client =
        web::Data::new(ProxyClient::new(config.proxy_timeout).expect("Failed to build HTTP client"));

    let upload_store = UploadStore::new(config.upload_dir.clone(), config.max_upload_bytes);
    upload_store
        .ensure_dir()
        .await
        .expect("Failed to create upload directory");
    let upload_data = web::Data::new(upload_store);

    let sheets_data = config
        .sheets
        .clone()
        .map(|sheets| web::Data::new(SheetsClient::new(sheets)));
    let conventions = web::Data::new(default_conventions());

    let cors_origins = config.cors_origins.clone();
    let upload_dir = config.upload_dir.clone();

    let bind_addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Server running at http://{bind_addr}");

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .max_age(3600);
        // Credentialed requests (the refresh cookie) need explicit origins.
        if cors_origins.is_empty() {
            cors = cors.allow_any_origin();
        } else {
            for origin in &cors_origins {
                cors = cors.allowed_origin(origin);
            }
            cors = cors.supports_credentials();
        }

        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            ApiError::BadRequest(format!("Invalid JSON body: {err}")).into()
        });
        let query_config = web::QueryConfig::default().error_handler(|err, _req| {
            ApiError::BadRequest(format!("Invalid query string: {err}")).into()
        });

        let mut app = App::new()
            .wrap(cors)
            .app_data(json_config)
            .app_data(query_config)
            .app_data(db_data.clone())
            .app_data(refresh_data.clone())
            .app_data(jwt_keys.clone())
            .app_data(cookie_settings.clone())
            .app_data(proxy_client.clone())
            .app_data(upload_data.clone())
            .app_data(conventions.clone());
        if let Some(sheets) = &sheets_data {
            app = app.app_data(sheets.clone());
        }

        app.service(web::scope("/api").configure(handlers::init_routes))
            .service(Files::new(uploads::PUBLIC_PATH, upload_dir.clone()))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
