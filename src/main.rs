use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use solara_api::config::{self, AppConfig};
use solara_api::db;
use solara_api::events;
use solara_api::services::gateway::StripeGateway;
use solara_api::services::storage::LocalDocumentStore;
use solara_api::services::subscriptions::seed_default_plans;
use solara_api::services::AppServices;
use solara_api::{app_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(&cfg.log_level, cfg.log_json);
    info!(environment = %cfg.environment, "starting solara-api");

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    let pool = Arc::new(pool);

    if cfg.auto_migrate {
        db::run_migrations(&pool)
            .await
            .context("database migration failed")?;
    }
    seed_default_plans(&pool)
        .await
        .context("failed to seed maintenance plans")?;

    let (event_sender, event_rx) = events::event_channel(cfg.event_channel_capacity);
    let event_sender = Arc::new(event_sender);
    tokio::spawn(events::process_events(event_rx));

    let secret_key = cfg
        .payment_provider_secret_key
        .clone()
        .unwrap_or_default();
    if secret_key.is_empty() {
        warn!("no payment provider key configured; payment calls will be rejected upstream");
    }
    let gateway = Arc::new(StripeGateway::new(
        cfg.payment_provider_base_url.clone(),
        secret_key,
    ));
    let store = Arc::new(LocalDocumentStore::new(cfg.upload_dir.clone()));

    let config = Arc::new(cfg);
    let services = AppServices::new(
        pool.clone(),
        &config,
        event_sender.clone(),
        gateway,
        store,
    );
    let state = AppState {
        db: pool,
        config: config.clone(),
        event_sender,
        services,
    };

    let app = app_router(state)
        .layer(build_cors_layer(&config)?)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

fn build_cors_layer(cfg: &AppConfig) -> anyhow::Result<CorsLayer> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if cfg.has_cors_allowed_origins() {
        let origins = cfg
            .cors_allowed_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| {
                o.parse::<HeaderValue>()
                    .with_context(|| format!("invalid CORS origin {}", o))
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any));
    }

    if cfg.should_allow_permissive_cors() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any));
    }

    warn!("no CORS origins configured in production; cross-origin requests will fail");
    Ok(CorsLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
