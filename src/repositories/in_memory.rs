use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::errors::ServiceError;
use crate::models::work_order::{NewWorkOrder, WorkOrder, WorkOrderChanges};
use crate::queries::work_order_queries::{filter_and_sort, WorkOrderFilter};
use crate::repositories::{TransitionOutcome, WorkOrderStore};
use crate::services::lifecycle::LifecycleAction;
use crate::services::stats::StatusTally;

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<i32, WorkOrder>,
    last_id: i32,
}

/// Process-local store. Every operation holds the lock for its whole duration,
/// so reads see a consistent snapshot and writes are atomic.
///
/// Ids are never reused, even after a delete.
#[derive(Debug, Default)]
pub struct InMemoryWorkOrderStore {
    state: RwLock<State>,
    unavailable: AtomicBool,
    latency: Option<Duration>,
}

impl InMemoryWorkOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every operation, for exercising store timeouts.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes every subsequent operation fail with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    async fn ready(&self) -> Result<(), ServiceError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::StoreUnavailable(
                "in-memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkOrderStore for InMemoryWorkOrderStore {
    async fn list(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, ServiceError> {
        self.ready().await?;
        let state = self.state.read().await;
        Ok(filter_and_sort(state.records.values(), filter))
    }

    async fn get(&self, id: i32) -> Result<Option<WorkOrder>, ServiceError> {
        self.ready().await?;
        Ok(self.state.read().await.records.get(&id).cloned())
    }

    async fn insert(&self, new: NewWorkOrder) -> Result<WorkOrder, ServiceError> {
        self.ready().await?;
        let mut state = self.state.write().await;
        state.last_id += 1;
        let record = new.into_model(state.last_id, Utc::now());
        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: i32,
        changes: WorkOrderChanges,
    ) -> Result<Option<WorkOrder>, ServiceError> {
        self.ready().await?;
        let mut state = self.state.write().await;
        Ok(state.records.get_mut(&id).map(|record| {
            changes.apply_to(record, Utc::now());
            record.clone()
        }))
    }

    async fn transition(
        &self,
        id: i32,
        action: LifecycleAction,
    ) -> Result<TransitionOutcome, ServiceError> {
        self.ready().await?;
        let mut state = self.state.write().await;
        let Some(record) = state.records.get_mut(&id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        if !action.is_allowed_from(record.status) {
            return Ok(TransitionOutcome::Rejected(record.status));
        }
        WorkOrderChanges::with_status(action.target()).apply_to(record, Utc::now());
        Ok(TransitionOutcome::Applied(record.clone()))
    }

    async fn delete(&self, id: i32) -> Result<Option<WorkOrder>, ServiceError> {
        self.ready().await?;
        Ok(self.state.write().await.records.remove(&id))
    }

    async fn status_counts(&self) -> Result<StatusTally, ServiceError> {
        self.ready().await?;
        let state = self.state.read().await;
        Ok(StatusTally::from_statuses(
            state.records.values().map(|record| record.status),
        ))
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        self.ready().await
    }
}
