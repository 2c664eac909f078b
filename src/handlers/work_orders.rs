use crate::{
    errors::ServiceError,
    handlers::common::{created_response, json_body, parse_id, query_params, success_response},
    models::work_order::WorkOrder,
    queries::work_order_queries::WorkOrderListParams,
    services::lifecycle::LifecycleAction,
    validation::{CreateWorkOrderRequest, UpdateWorkOrderRequest},
    AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Path, Query, State,
    },
    response::Response,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of a successful delete
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteWorkOrderResponse {
    pub success: bool,
    /// The record as it was before removal
    pub deleted: WorkOrder,
}

/// Create the work orders router
pub fn work_orders_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/work-orders",
            get(list_work_orders).post(create_work_order),
        )
        .route(
            "/api/work-orders/:id",
            get(get_work_order)
                .put(update_work_order)
                .delete(delete_work_order),
        )
        .route("/api/work-orders/:id/accept", post(accept_work_order))
        .route("/api/work-orders/:id/complete", post(complete_work_order))
        .route("/api/work-orders/:id/cancel", post(cancel_work_order))
}

/// List work orders with optional filtering
#[utoipa::path(
    get,
    path = "/api/work-orders",
    params(WorkOrderListParams),
    responses(
        (status = 200, description = "Matching work orders, newest first", body = [WorkOrder],
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Unknown status or priority filter", body = crate::errors::ErrorResponse),
        (status = 500, description = "Store error", body = crate::errors::ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn list_work_orders(
    State(state): State<AppState>,
    query: Result<Query<WorkOrderListParams>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let params = query_params(query)?;
    let work_orders = state.work_orders.list_work_orders(params).await?;
    Ok(success_response(work_orders))
}

/// Get a work order by ID
#[utoipa::path(
    get,
    path = "/api/work-orders/{id}",
    params(("id" = i32, Path, description = "Work order ID")),
    responses(
        (status = 200, description = "Work order", body = WorkOrder),
        (status = 404, description = "Work order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn get_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id = parse_id(&id)?;
    let work_order = state.work_orders.get_work_order(id).await?;
    Ok(success_response(work_order))
}

/// Create a new work order
#[utoipa::path(
    post,
    path = "/api/work-orders",
    request_body = CreateWorkOrderRequest,
    responses(
        (status = 201, description = "Work order created", body = WorkOrder),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse),
        (status = 500, description = "Store error", body = crate::errors::ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn create_work_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateWorkOrderRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let request = json_body(payload)?;
    let work_order = state.work_orders.create_work_order(request).await?;
    Ok(created_response(work_order))
}

/// Update a work order; omitted fields keep their values
#[utoipa::path(
    put,
    path = "/api/work-orders/{id}",
    params(("id" = i32, Path, description = "Work order ID")),
    request_body = UpdateWorkOrderRequest,
    responses(
        (status = 200, description = "Work order updated", body = WorkOrder),
        (status = 400, description = "Invalid fields", body = crate::errors::ErrorResponse),
        (status = 404, description = "Work order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn update_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateWorkOrderRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let id = parse_id(&id)?;
    let request = json_body(payload)?;
    let work_order = state.work_orders.update_work_order(id, request).await?;
    Ok(success_response(work_order))
}

/// Delete a work order
#[utoipa::path(
    delete,
    path = "/api/work-orders/{id}",
    params(("id" = i32, Path, description = "Work order ID")),
    responses(
        (status = 200, description = "Work order deleted", body = DeleteWorkOrderResponse),
        (status = 404, description = "Work order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn delete_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id = parse_id(&id)?;
    let deleted = state.work_orders.delete_work_order(id).await?;
    Ok(success_response(DeleteWorkOrderResponse {
        success: true,
        deleted,
    }))
}

async fn transition(
    state: AppState,
    raw_id: &str,
    action: LifecycleAction,
) -> Result<Response, ServiceError> {
    let id = parse_id(raw_id)?;
    let work_order = state.work_orders.transition_work_order(id, action).await?;
    Ok(success_response(work_order))
}

/// Accept a pending work order (pending -> in_progress)
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/accept",
    params(("id" = i32, Path, description = "Work order ID")),
    responses(
        (status = 200, description = "Work order accepted", body = WorkOrder),
        (status = 404, description = "Work order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Work order is not pending", body = crate::errors::ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn accept_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    transition(state, &id, LifecycleAction::Accept).await
}

/// Complete a work order in progress (in_progress -> completed)
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/complete",
    params(("id" = i32, Path, description = "Work order ID")),
    responses(
        (status = 200, description = "Work order completed", body = WorkOrder),
        (status = 404, description = "Work order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Work order is not in progress", body = crate::errors::ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn complete_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    transition(state, &id, LifecycleAction::Complete).await
}

/// Cancel an unfinished work order (pending | in_progress -> cancelled)
#[utoipa::path(
    post,
    path = "/api/work-orders/{id}/cancel",
    params(("id" = i32, Path, description = "Work order ID")),
    responses(
        (status = 200, description = "Work order cancelled", body = WorkOrder),
        (status = 404, description = "Work order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Work order already finished", body = crate::errors::ErrorResponse)
    ),
    tag = "work-orders"
)]
pub async fn cancel_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    transition(state, &id, LifecycleAction::Cancel).await
}
