use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quest Board API",
        description = r#"
# Quest Board

A small work-order tracker. Work orders ("quests") are created, listed,
filtered, updated, deleted and moved through a fixed lifecycle:

```
pending -> in_progress -> completed
pending | in_progress -> cancelled
```

## Error Handling

Failing requests return a JSON body with `error`, `message`, optional
`details` and the request id. Validation failures list one entry per field.
Every response carries an `X-Request-Id` header.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development")
    ),
    tags(
        (name = "work-orders", description = "Work-order management endpoints"),
        (name = "stats", description = "Status counts"),
        (name = "health", description = "Service health")
    ),
    paths(
        crate::handlers::work_orders::list_work_orders,
        crate::handlers::work_orders::get_work_order,
        crate::handlers::work_orders::create_work_order,
        crate::handlers::work_orders::update_work_order,
        crate::handlers::work_orders::delete_work_order,
        crate::handlers::work_orders::accept_work_order,
        crate::handlers::work_orders::complete_work_order,
        crate::handlers::work_orders::cancel_work_order,
        crate::handlers::stats::get_stats,
        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::models::work_order::WorkOrder,
            crate::models::work_order::WorkOrderStatus,
            crate::models::work_order::WorkOrderPriority,
            crate::validation::CreateWorkOrderRequest,
            crate::validation::UpdateWorkOrderRequest,
            crate::validation::FieldError,
            crate::services::lifecycle::LifecycleAction,
            crate::services::stats::StatusCounts,
            crate::handlers::work_orders::DeleteWorkOrderResponse,
            crate::handlers::health::HealthInfo,
            crate::handlers::health::HealthStatus,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url(OPENAPI_JSON_PATH, ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from(OPENAPI_JSON_PATH).try_it_out_enabled(true))
}
