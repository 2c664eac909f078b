#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use quest_board::{
    app_router,
    db::{self, DbConfig},
    repositories::{InMemoryWorkOrderStore, WorkOrderRepository, WorkOrderStore},
    services::work_orders::WorkOrderService,
    AppState, HttpLimits,
};

/// Decoded response: status, headers and JSON body (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Helper harness wrapping the full router, backed by either store.
pub struct TestApp {
    router: Router,
    memory: Option<Arc<InMemoryWorkOrderStore>>,
}

impl TestApp {
    /// Application over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::with_memory_store(InMemoryWorkOrderStore::new(), None, HttpLimits::default())
    }

    /// In-memory store with an injected delay and a short store timeout.
    pub fn slow(latency: Duration, timeout: Duration) -> Self {
        Self::with_memory_store(
            InMemoryWorkOrderStore::new().with_latency(latency),
            Some(timeout),
            HttpLimits::default(),
        )
    }

    /// Slow in-memory store behind a request deadline shorter than the store delay.
    pub fn with_request_timeout(latency: Duration, request_timeout: Duration) -> Self {
        Self::with_memory_store(
            InMemoryWorkOrderStore::new().with_latency(latency),
            Some(latency * 4),
            HttpLimits {
                request_timeout,
                ..HttpLimits::default()
            },
        )
    }

    fn with_memory_store(
        store: InMemoryWorkOrderStore,
        timeout: Option<Duration>,
        limits: HttpLimits,
    ) -> Self {
        let store = Arc::new(store);
        let mut service = WorkOrderService::new(store.clone() as Arc<dyn WorkOrderStore>);
        if let Some(timeout) = timeout {
            service = service.with_timeout(timeout);
        }
        Self {
            router: app_router(AppState::new(service), limits),
            memory: Some(store),
        }
    }

    /// Application over a migrated in-memory SQLite database.
    pub async fn sqlite() -> Self {
        Self::sqlite_at("sqlite::memory:").await
    }

    /// Application over a migrated SQLite file, using the production pool sizing.
    pub async fn sqlite_file(path: &Path) -> Self {
        Self::sqlite_at(&format!("sqlite://{}?mode=rwc", path.display())).await
    }

    async fn sqlite_at(url: &str) -> Self {
        let pool = db::establish_connection_with_config(&DbConfig {
            url: url.to_string(),
            max_connections: 16,
            min_connections: 2,
            ..Default::default()
        })
        .await
        .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let store: Arc<dyn WorkOrderStore> = Arc::new(WorkOrderRepository::new(Arc::new(pool)));
        Self {
            router: app_router(AppState::from_store(store), HttpLimits::default()),
            memory: None,
        }
    }

    /// Take the in-memory store offline (or back online).
    pub fn set_store_unavailable(&self, unavailable: bool) {
        self.memory
            .as_ref()
            .expect("only in-memory apps can be taken offline")
            .set_unavailable(unavailable);
    }

    /// Send a request with a raw body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<String>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = match body {
            Some(raw) => {
                builder = builder.header("content-type", "application/json");
                Body::from(raw)
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let raw = body.map(|json| serde_json::to_string(&json).expect("serialize request body"));
        self.send(method, uri, raw, &[]).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn post(&self, uri: &str) -> TestResponse {
        self.request(Method::POST, uri, None).await
    }

    pub async fn put_json(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Create a work order and return its id.
    pub async fn create(&self, payload: Value) -> i64 {
        let response = self.post_json("/api/work-orders", payload).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_i64().expect("created work order has an id")
    }
}

/// A complete, valid creation payload.
pub fn quest_payload(title: &str) -> Value {
    json!({
        "title": title,
        "description": format!("{title} needs doing"),
        "assignedTo": "Aria",
        "location": "North Tower",
        "dueDate": "2025-12-01T12:00:00Z"
    })
}
