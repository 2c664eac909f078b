//! Quest Board library
//!
//! Work-order tracking over HTTP: CRUD, filtering, lifecycle transitions and
//! status counts, backed by a relational store or an in-memory one.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod queries;
pub mod repositories;
pub mod services;
pub mod tracing;
pub mod validation;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{error_handling::HandleErrorLayer, extract::DefaultBodyLimit, Router};
use tower::{timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::compression::CompressionLayer;

use crate::errors::ServiceError;
use crate::repositories::WorkOrderStore;
use crate::services::work_orders::WorkOrderService;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub work_orders: WorkOrderService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(work_orders: WorkOrderService) -> Self {
        Self {
            work_orders,
            started_at: Instant::now(),
        }
    }

    /// Wraps a store with the default store timeout
    pub fn from_store(store: Arc<dyn WorkOrderStore>) -> Self {
        Self::new(WorkOrderService::new(store))
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Per-request limits applied to every route
#[derive(Debug, Clone, Copy)]
pub struct HttpLimits {
    pub request_timeout: Duration,
    pub max_body_size: usize,
}

impl Default for HttpLimits {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024,
        }
    }
}

impl From<&config::AppConfig> for HttpLimits {
    fn from(cfg: &config::AppConfig) -> Self {
        Self {
            request_timeout: cfg.request_timeout(),
            max_body_size: cfg.max_body_size,
        }
    }
}

async fn route_not_found() -> ServiceError {
    ServiceError::NotFound("Route not found".to_string())
}

async fn handle_middleware_error(err: BoxError) -> ServiceError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ServiceError::RequestTimeout
    } else {
        ServiceError::InternalError(err.to_string())
    }
}

/// Full application router: API, health, docs and the shared middleware stack
pub fn app_router(state: AppState, limits: HttpLimits) -> Router {
    Router::new()
        .merge(handlers::work_orders::work_orders_router())
        .merge(handlers::stats::stats_router())
        .merge(handlers::health::health_router())
        .fallback(route_not_found)
        .with_state(state)
        .merge(openapi::swagger_ui())
        .layer(DefaultBodyLimit::max(limits.max_body_size))
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .layer(TimeoutLayer::new(limits.request_timeout)),
        )
        // Outermost, so every response carries a request id
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}
