use crate::{
    errors::ServiceError, handlers::common::success_response, services::stats::StatusCounts,
    AppState,
};
use axum::{extract::State, response::Response, routing::get, Router};

pub fn stats_router() -> Router<AppState> {
    Router::new().route("/api/stats", get(get_stats))
}

/// Work-order counts per tracked status
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Counts of pending, in-progress and completed work orders", body = StatusCounts),
        (status = 500, description = "Store error", body = crate::errors::ErrorResponse)
    ),
    tag = "stats"
)]
pub async fn get_stats(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let counts = state.work_orders.stats().await?;
    Ok(success_response(counts))
}
