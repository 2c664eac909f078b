use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{error, info, instrument};

use crate::errors::ServiceError;
use crate::models::work_order::WorkOrder;
use crate::queries::work_order_queries::{WorkOrderFilter, WorkOrderListParams};
use crate::repositories::{TransitionOutcome, WorkOrderStore};
use crate::services::lifecycle::LifecycleAction;
use crate::services::stats::StatusCounts;
use crate::validation::{validate_create, validate_update, CreateWorkOrderRequest, UpdateWorkOrderRequest};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Service for managing work orders
#[derive(Clone)]
pub struct WorkOrderService {
    store: Arc<dyn WorkOrderStore>,
    timeout: Duration,
}

impl WorkOrderService {
    pub fn new(store: Arc<dyn WorkOrderStore>) -> Self {
        Self {
            store,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Bounds every store call; expiry surfaces as `StoreTimeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn call<T, F>(&self, operation: &'static str, fut: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                error!(operation, timeout = ?self.timeout, "Store call timed out");
                counter!("quest_board.store.timeouts", 1);
                Err(ServiceError::StoreTimeout(self.timeout))
            }
        }
    }

    /// Lists work orders, newest first
    #[instrument(skip(self), err)]
    pub async fn list_work_orders(
        &self,
        params: WorkOrderListParams,
    ) -> Result<Vec<WorkOrder>, ServiceError> {
        let filter = WorkOrderFilter::from_params(params)?;
        self.list_filtered(&filter).await
    }

    #[instrument(skip(self), err)]
    pub async fn list_filtered(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, ServiceError> {
        self.call("list", self.store.list(filter)).await
    }

    /// Gets a work order by ID
    #[instrument(skip(self), err)]
    pub async fn get_work_order(&self, id: i32) -> Result<WorkOrder, ServiceError> {
        self.call("get", self.store.get(id))
            .await?
            .ok_or_else(|| ServiceError::work_order_not_found(id))
    }

    /// Creates a new work order
    #[instrument(skip(self, request), err)]
    pub async fn create_work_order(
        &self,
        request: CreateWorkOrderRequest,
    ) -> Result<WorkOrder, ServiceError> {
        let new = validate_create(request)?;
        let created = self.call("insert", self.store.insert(new)).await?;

        counter!("quest_board.work_orders.created", 1);
        info!(work_order_id = created.id, status = %created.status, "Work order created");
        Ok(created)
    }

    /// Applies a partial update
    #[instrument(skip(self, request), err)]
    pub async fn update_work_order(
        &self,
        id: i32,
        request: UpdateWorkOrderRequest,
    ) -> Result<WorkOrder, ServiceError> {
        let changes = validate_update(request)?;
        let updated = self
            .call("update", self.store.update(id, changes))
            .await?
            .ok_or_else(|| ServiceError::work_order_not_found(id))?;

        counter!("quest_board.work_orders.updated", 1);
        info!(work_order_id = id, status = %updated.status, "Work order updated");
        Ok(updated)
    }

    /// Deletes a work order and returns the removed record
    #[instrument(skip(self), err)]
    pub async fn delete_work_order(&self, id: i32) -> Result<WorkOrder, ServiceError> {
        let deleted = self
            .call("delete", self.store.delete(id))
            .await?
            .ok_or_else(|| ServiceError::work_order_not_found(id))?;

        counter!("quest_board.work_orders.deleted", 1);
        info!(work_order_id = id, "Work order deleted");
        Ok(deleted)
    }

    /// Applies a lifecycle action if the current status allows it
    #[instrument(skip(self), err)]
    pub async fn transition_work_order(
        &self,
        id: i32,
        action: LifecycleAction,
    ) -> Result<WorkOrder, ServiceError> {
        match self.call("transition", self.store.transition(id, action)).await? {
            TransitionOutcome::Applied(record) => {
                counter!("quest_board.work_orders.transitions", 1, "action" => action.to_string());
                info!(work_order_id = id, %action, status = %record.status, "Work order transitioned");
                Ok(record)
            }
            TransitionOutcome::NotFound => Err(ServiceError::work_order_not_found(id)),
            TransitionOutcome::Rejected(from) => {
                counter!("quest_board.work_orders.transitions_rejected", 1, "action" => action.to_string());
                Err(ServiceError::InvalidTransition {
                    id,
                    from,
                    to: action.target(),
                })
            }
        }
    }

    /// Dashboard counts for pending, in-progress and completed work orders
    #[instrument(skip(self), err)]
    pub async fn stats(&self) -> Result<StatusCounts, ServiceError> {
        let tally = self.call("status_counts", self.store.status_counts()).await?;
        Ok(tally.into())
    }

    /// Store liveness for the health endpoint
    pub async fn ping(&self) -> Result<(), ServiceError> {
        self.call("ping", self.store.ping()).await
    }
}
