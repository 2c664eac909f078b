use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::models::work_order::{NewWorkOrder, WorkOrder, WorkOrderChanges, WorkOrderStatus};
use crate::queries::work_order_queries::WorkOrderFilter;
use crate::services::lifecycle::LifecycleAction;
use crate::services::stats::StatusTally;

pub mod in_memory;
pub mod work_order_repository;

pub use in_memory::InMemoryWorkOrderStore;
pub use work_order_repository::WorkOrderRepository;

/// Result of a conditional lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied(WorkOrder),
    NotFound,
    /// The record exists but its current status does not allow the action.
    Rejected(WorkOrderStatus),
}

/// Persistence seam for work orders.
///
/// Every write is atomic: a caller never observes a partially applied update,
/// and a transition either lands on a status the action allows or not at all.
#[async_trait]
pub trait WorkOrderStore: Send + Sync {
    /// Matching records, newest first.
    async fn list(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, ServiceError>;

    async fn get(&self, id: i32) -> Result<Option<WorkOrder>, ServiceError>;

    /// Persists a new record with a fresh id and `created_at == updated_at`.
    async fn insert(&self, new: NewWorkOrder) -> Result<WorkOrder, ServiceError>;

    /// Applies a partial update. `Ok(None)` when no record has that id.
    async fn update(
        &self,
        id: i32,
        changes: WorkOrderChanges,
    ) -> Result<Option<WorkOrder>, ServiceError>;

    /// Moves the record to `action.target()` only if its current status allows it.
    async fn transition(
        &self,
        id: i32,
        action: LifecycleAction,
    ) -> Result<TransitionOutcome, ServiceError>;

    /// Removes the record and returns it as it was. `Ok(None)` when absent.
    async fn delete(&self, id: i32) -> Result<Option<WorkOrder>, ServiceError>;

    /// Per-status totals over a single consistent snapshot.
    async fn status_counts(&self) -> Result<StatusTally, ServiceError>;

    /// Cheap liveness check.
    async fn ping(&self) -> Result<(), ServiceError>;
}
