use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::models::work_order::WorkOrderStatus;
use crate::validation::ValidationFailure;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Bad Request",
    "message": "Validation error: title: Title is required",
    "details": [{"field": "title", "message": "Title is required"}],
    "request_id": "req-abc123xyz",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request", "Conflict")
    #[schema(example = "Not Found")]
    pub error: String,
    /// Human-readable error description
    #[schema(example = "Not found: Work order 42 not found")]
    pub message: String,
    /// Field errors for validation failures, `{from, to}` for rejected transitions
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// RFC 3339 timestamp when the error occurred
    #[schema(example = "2024-12-09T10:30:00.000Z")]
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(ValidationFailure),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition for work order {id}: {from} -> {to}")]
    InvalidTransition {
        id: i32,
        from: WorkOrderStatus,
        to: WorkOrderStatus,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Store did not answer within {0:?}")]
    StoreTimeout(Duration),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Request timed out")]
    RequestTimeout,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<ValidationFailure> for ServiceError {
    fn from(failure: ValidationFailure) -> Self {
        ServiceError::ValidationError(failure)
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.into())
    }
}

impl ServiceError {
    pub fn work_order_not_found(id: i32) -> Self {
        ServiceError::NotFound(format!("Work order {} not found", id))
    }

    /// Timeouts, connection failures and query failures.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError(_) | Self::StoreTimeout(_) | Self::StoreUnavailable(_)
        )
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            Self::DatabaseError(_)
            | Self::StoreTimeout(_)
            | Self::StoreUnavailable(_)
            | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Store errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::StoreTimeout(_) => "Store timed out".to_string(),
            Self::StoreUnavailable(_) => "Store unavailable".to_string(),
            Self::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::ValidationError(failure) => serde_json::to_value(failure).ok(),
            Self::InvalidTransition { from, to, .. } => Some(json!({ "from": from, "to": to })),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.details(),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use rstest::rstest;

    async fn render(error: ServiceError) -> (StatusCode, ErrorResponse) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn service_error_response_includes_request_id() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("req-123"), async {
                ServiceError::work_order_not_found(9).into_response()
            })
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.request_id.as_deref(), Some("req-123"));
        assert_eq!(payload.message, "Not found: Work order 9 not found");
    }

    #[rstest]
    #[case(ServiceError::ValidationError(ValidationFailure::single("title", "Title is required")), StatusCode::BAD_REQUEST)]
    #[case(ServiceError::BadRequest("bad json".into()), StatusCode::BAD_REQUEST)]
    #[case(ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND)]
    #[case(
        ServiceError::InvalidTransition { id: 1, from: WorkOrderStatus::Completed, to: WorkOrderStatus::InProgress },
        StatusCode::CONFLICT
    )]
    #[case(ServiceError::DatabaseError(sea_orm::DbErr::Custom("boom".into())), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(ServiceError::StoreTimeout(Duration::from_secs(5)), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(ServiceError::StoreUnavailable("down".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(ServiceError::RequestTimeout, StatusCode::REQUEST_TIMEOUT)]
    #[case(ServiceError::InternalError("layer".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn status_code_mapping(#[case] error: ServiceError, #[case] expected: StatusCode) {
        assert_eq!(error.status_code(), expected);
    }

    #[test]
    fn store_errors_hide_internal_details() {
        let err = ServiceError::DatabaseError(sea_orm::DbErr::Custom("password=hunter2".into()));
        assert!(err.is_store_error());
        assert_eq!(err.response_message(), "Database error");
        assert!(!ServiceError::NotFound("x".into()).is_store_error());
    }

    #[tokio::test]
    async fn validation_details_list_field_errors() {
        let (status, body) = render(ServiceError::ValidationError(ValidationFailure::single(
            "dueDate",
            "Due Date is required",
        )))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Bad Request");
        assert_eq!(
            body.details,
            Some(json!([{"field": "dueDate", "message": "Due Date is required"}]))
        );
    }

    #[tokio::test]
    async fn transition_details_carry_both_states() {
        let (status, body) = render(ServiceError::InvalidTransition {
            id: 3,
            from: WorkOrderStatus::Cancelled,
            to: WorkOrderStatus::Completed,
        })
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.details, Some(json!({"from": "cancelled", "to": "completed"})));
    }
}
