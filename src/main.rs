use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use taskboard::config::{AppConfig, GatewayBackend};
use taskboard::docs::ApiDoc;
use taskboard::gateway::storage::DiskStorage;
use taskboard::gateway::token::TokenIssuer;
use taskboard::gateway::{MemoryGateway, PgGateway, RemoteGateway, RestGateway};
use taskboard::handlers;
use taskboard::services::files::UploadPolicy;
use taskboard::{AppState, Database};

async fn build_gateway(config: &AppConfig) -> anyhow::Result<Arc<dyn RemoteGateway>> {
    let gateway: Arc<dyn RemoteGateway> = match &config.backend {
        GatewayBackend::Postgres {
            database_url,
            jwt_secret,
            token_ttl_hours,
            run_migrations,
        } => {
            let db = Database::new(database_url).await?;
            if *run_migrations {
                db.migrate().await?;
            }
            db.check_tables().await?;
            match db.get_stats().await {
                Ok(stats) => stats.log_stats(),
                Err(e) => log::warn!("⚠️  Could not read database statistics: {}", e),
            }

            let storage = DiskStorage::new(&config.storage_dir, &config.public_base_url);
            let tokens = TokenIssuer::new(jwt_secret.clone(), *token_ttl_hours);
            Arc::new(PgGateway::new(db, storage, tokens))
        }
        GatewayBackend::Rest { base_url, service_key } => {
            log::info!("🌐 Using REST backend at {}", base_url);
            Arc::new(RestGateway::new(base_url.clone(), service_key.clone()))
        }
        GatewayBackend::Memory => {
            log::warn!("⚠️  Using in-memory backend: data is lost on restart");
            Arc::new(MemoryGateway::new(config.public_base_url.clone()))
        }
    };
    gateway
        .ping()
        .await
        .with_context(|| format!("{} backend is not reachable", config.backend.name()))?;
    Ok(gateway)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    log::info!("🚀 Starting Taskboard API on port {}", config.port);
    log::info!("📋 Allowed frontend URLs: {:?}", config.frontend_urls);
    log::info!("🗄  Backend: {}", config.backend.name());

    let gateway = build_gateway(&config).await?;
    let state = web::Data::new(AppState::new(
        gateway,
        UploadPolicy::new(config.max_upload_bytes),
    ));
    let openapi = ApiDoc::openapi();
    let allowed_origins = config.frontend_urls.clone();
    if config.is_development() {
        log::info!("📖 API docs at http://localhost:{}/swagger-ui/", config.port);
    }

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                "Authorization",
                "Content-Type",
                "Accept",
                "Origin",
                "X-Requested-With",
            ])
            .supports_credentials();

        // Add allowed origins
        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .app_data(state.clone())
            .configure(handlers::configure)
            .route("/", web::get().to(|| async {
                HttpResponse::Ok().json(serde_json::json!({
                    "name": "Taskboard API",
                    "version": env!("CARGO_PKG_VERSION"),
                    "description": "Projects, Kanban tasks, calendar and attachments"
                }))
            }))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await?;

    Ok(())
}
