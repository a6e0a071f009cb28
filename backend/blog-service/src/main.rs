/// Blog Service - HTTP Server
///
/// Serves the `/api/v1` REST API plus health, metrics and OpenAPI endpoints.
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use blog_service::config::{Config, LogFormat};
use blog_service::db;
use blog_service::openapi::ApiDoc;
use blog_service::storage::LocalPhotoStorage;
use blog_service::{handlers, jobs, metrics, AppState};
use crypto_core::{JwtKeys, TokenTtl};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to load configuration")?;

    init_tracing(config.app.log_format);

    tracing::info!(
        "Starting blog-service v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.app.env
    );

    let jwt = JwtKeys::from_rsa_pem(&config.jwt.private_key_pem, &config.jwt.public_key_pem)
        .context("Failed to initialize JWT keys")?
        .with_ttl(TokenTtl {
            access_secs: config.jwt.access_token_ttl_secs,
            refresh_secs: config.jwt.refresh_token_ttl_secs,
        });

    let pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool initialized");

    if !config.is_production() {
        db::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database migrations applied");
    }

    let photos = Arc::new(LocalPhotoStorage::new(&config.media.root));
    let state = web::Data::new(AppState::postgres(
        pool.clone(),
        jwt,
        photos,
        config.media.url.clone(),
    ));
    let (jobs_shutdown, _) = tokio::sync::broadcast::channel::<()>(1);
    let purge_handle = tokio::spawn(jobs::run_blacklist_purge(
        state.token_blacklist.clone(),
        Duration::from_secs(config.jwt.blacklist_purge_interval_secs),
        jobs_shutdown.subscribe(),
    ));

    let pool_data = web::Data::new(pool);
    let openapi_doc = web::Data::new(ApiDoc::openapi());

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("HTTP server listening on {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        let cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(state.clone())
            .app_data(pool_data.clone())
            .app_data(openapi_doc.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            // Registered ahead of the /api/v1 scope so they bypass its middleware
            .route("/api/v1/health", web::get().to(health_check))
            .route("/api/v1/health/ready", web::get().to(readiness_check))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .route(ApiDoc::openapi_json_path(), web::get().to(openapi_json))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url(ApiDoc::openapi_json_path(), ApiDoc::openapi()),
            )
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .shutdown_timeout(30)
    .disable_signals()
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, stopping HTTP server");
        handle.stop(true).await;
    });

    server.await?;

    let _ = jobs_shutdown.send(());
    if let Err(e) = purge_handle.await {
        tracing::warn!(error = %e, "blacklist purge task ended abnormally");
    }
    tracing::info!("blog-service shut down");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "blog-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn readiness_check(pool: web::Data<PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({"ready": true})),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "ready": false,
                "reason": "database unavailable",
            }))
        }
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn openapi_json(doc: web::Data<utoipa::openapi::OpenApi>) -> actix_web::Result<HttpResponse> {
    let body = serde_json::to_string(&*doc).map_err(|e| {
        tracing::error!("OpenAPI serialization failed: {}", e);
        actix_web::error::ErrorInternalServerError("OpenAPI serialization error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
