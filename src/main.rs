use std::sync::Arc;

use anyhow::Context;
use http::HeaderValue;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use quest_board as app;
use quest_board::config::{AppConfig, StoreBackend};
use quest_board::repositories::{InMemoryWorkOrderStore, WorkOrderRepository, WorkOrderStore};
use quest_board::services::work_orders::WorkOrderService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = app::config::load_config().context("failed to load configuration")?;
    app::config::init_tracing(cfg.log_level(), cfg.log_json);

    let store = build_store(&cfg).await?;
    let service = WorkOrderService::new(store).with_timeout(cfg.store_timeout());
    let state = app::AppState::new(service);

    let cors_layer = build_cors_layer(&cfg)?;

    let router = app::app_router(state, app::HttpLimits::from(&cfg)).layer(cors_layer);

    let listener = tokio::net::TcpListener::bind((cfg.host.as_str(), cfg.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", cfg.host, cfg.port))?;
    let addr = listener.local_addr().context("failed to read bound address")?;
    info!(%addr, environment = %cfg.environment, "quest-board listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("quest-board stopped");
    Ok(())
}

async fn build_store(cfg: &AppConfig) -> anyhow::Result<Arc<dyn WorkOrderStore>> {
    match cfg.store_backend {
        StoreBackend::InMemory => {
            warn!("Using the in-memory store; work orders are lost on restart");
            Ok(Arc::new(InMemoryWorkOrderStore::new()))
        }
        StoreBackend::Database => {
            let pool = app::db::establish_connection_from_app_config(cfg)
                .await
                .context("failed to connect to database")?;
            if cfg.auto_migrate {
                app::db::run_migrations(&pool).await.map_err(|e| {
                    error!("Failed running migrations: {}", e);
                    e
                })?;
            }
            Ok(Arc::new(WorkOrderRepository::new(Arc::new(pool))))
        }
    }
}

fn build_cors_layer(cfg: &AppConfig) -> anyhow::Result<CorsLayer> {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if !origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    if cfg.should_allow_permissive_cors() {
        info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        return Ok(CorsLayer::permissive());
    }

    error!("Missing CORS configuration detected; set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true");
    anyhow::bail!(
        "Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true"
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
