mod api;
mod config;
mod database;
mod middleware;
mod models;
mod repositories;
mod services;
mod state;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    log::info!("🚀 Starting SwapKnowledge Service...");
    log::info!(
        "👥 Follower capacity: {} base, {} per approved batch",
        config.capacity.base_capacity,
        config.capacity.batch_size
    );

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&config.database_url).await.map_err(|e| {
        log::error!("❌ Failed to connect to MongoDB: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    log::info!("✅ MongoDB connected successfully");

    let state = web::Data::new(AppState::with_mongo(&db, config.clone()));
    let db_data = web::Data::new(db);

    let bind = (config.host.clone(), config.port);
    log::info!("🌐 Server starting on {}:{}", bind.0, bind.1);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", bind.0, bind.1);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", bind.0, bind.1);

    let cors_origins = config.cors_origins.clone();

    // Start HTTP server
    HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(state.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // ==================== ACCOUNTS ====================
            .configure(api::auth::configure)
            // ==================== FOLLOWER CAPACITY ====================
            .configure(api::follow::configure)
            .configure(api::permissions::configure)
            // ==================== PLATFORM ====================
            .configure(api::posts::configure)
            .configure(api::messages::configure)
            .configure(api::meetings::configure)
            .configure(api::feedback::configure)
            .configure(api::doubts::configure)
    })
    .bind(bind)?
    .run()
    .await
}
