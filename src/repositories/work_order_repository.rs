use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, NotSet,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use tracing::error;

use crate::errors::ServiceError;
use crate::models::work_order::{
    ActiveModel as WorkOrderActiveModel, Column, Entity as WorkOrderEntity, NewWorkOrder,
    WorkOrder, WorkOrderChanges, WorkOrderStatus,
};
use crate::queries::work_order_queries::{search_in_sql, WorkOrderFilter};
use crate::repositories::{TransitionOutcome, WorkOrderStore};
use crate::services::lifecycle::LifecycleAction;
use crate::services::stats::StatusTally;

/// sea-orm backed work-order store.
#[derive(Debug, Clone)]
pub struct WorkOrderRepository {
    db: Arc<DatabaseConnection>,
}

impl WorkOrderRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn db_error(context: &str, e: sea_orm::DbErr) -> ServiceError {
    error!(error = %e, "{}", context);
    ServiceError::DatabaseError(e)
}

async fn find<C: ConnectionTrait>(conn: &C, id: i32) -> Result<Option<WorkOrder>, ServiceError> {
    WorkOrderEntity::find_by_id(id)
        .one(conn)
        .await
        .map_err(|e| db_error("Failed to fetch work order", e))
}

#[async_trait]
impl WorkOrderStore for WorkOrderRepository {
    async fn list(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, ServiceError> {
        let backend = self.db().get_database_backend();
        let mut records = filter
            .select_for(backend)
            .all(self.db())
            .await
            .map_err(|e| db_error("Failed to list work orders", e))?;

        if !search_in_sql(backend) {
            records.retain(|record| filter.matches(record));
        }
        Ok(records)
    }

    async fn get(&self, id: i32) -> Result<Option<WorkOrder>, ServiceError> {
        find(self.db(), id).await
    }

    async fn insert(&self, new: NewWorkOrder) -> Result<WorkOrder, ServiceError> {
        let now = Utc::now();
        let active = WorkOrderActiveModel {
            id: NotSet,
            title: Set(new.title),
            description: Set(new.description),
            status: Set(new.status),
            priority: Set(new.priority),
            assigned_to: Set(new.assigned_to),
            location: Set(new.location),
            created_at: Set(now),
            updated_at: Set(now),
            due_date: Set(new.due_date),
        };

        active
            .insert(self.db())
            .await
            .map_err(|e| db_error("Failed to insert work order", e))
    }

    async fn update(
        &self,
        id: i32,
        changes: WorkOrderChanges,
    ) -> Result<Option<WorkOrder>, ServiceError> {
        let txn = self
            .db()
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let Some(existing) = find(&txn, id).await? else {
            return Ok(None);
        };

        let created_at = existing.created_at;
        let mut active: WorkOrderActiveModel = existing.into();
        changes.apply_to_active(&mut active, created_at, Utc::now());

        // A concurrent delete between the read and the write leaves nothing to update
        let updated = match active.update(&txn).await {
            Ok(updated) => updated,
            Err(DbErr::RecordNotUpdated) => return Ok(None),
            Err(e) => return Err(db_error("Failed to update work order", e)),
        };

        txn.commit()
            .await
            .map_err(|e| db_error("Failed to commit work order update", e))?;

        Ok(Some(updated))
    }

    async fn transition(
        &self,
        id: i32,
        action: LifecycleAction,
    ) -> Result<TransitionOutcome, ServiceError> {
        let txn = self
            .db()
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let Some(existing) = find(&txn, id).await? else {
            return Ok(TransitionOutcome::NotFound);
        };
        if !action.is_allowed_from(existing.status) {
            return Ok(TransitionOutcome::Rejected(existing.status));
        }

        // The status guard makes the write a compare-and-set against concurrent transitions.
        let result = WorkOrderEntity::update_many()
            .col_expr(Column::Status, Expr::value(action.target()))
            .col_expr(
                Column::UpdatedAt,
                Expr::value(Utc::now().max(existing.created_at)),
            )
            .filter(Column::Id.eq(id))
            .filter(Column::Status.is_in(action.allowed_from().iter().copied()))
            .exec(&txn)
            .await
            .map_err(|e| db_error("Failed to transition work order", e))?;

        let outcome = match find(&txn, id).await? {
            Some(record) if result.rows_affected == 1 => TransitionOutcome::Applied(record),
            Some(record) => TransitionOutcome::Rejected(record.status),
            None => TransitionOutcome::NotFound,
        };

        txn.commit()
            .await
            .map_err(|e| db_error("Failed to commit work order transition", e))?;

        Ok(outcome)
    }

    async fn delete(&self, id: i32) -> Result<Option<WorkOrder>, ServiceError> {
        let txn = self
            .db()
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let Some(existing) = find(&txn, id).await? else {
            return Ok(None);
        };

        let result = WorkOrderEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| db_error("Failed to delete work order", e))?;
        if result.rows_affected == 0 {
            // Removed by a concurrent delete after our read
            return Ok(None);
        }

        txn.commit()
            .await
            .map_err(|e| db_error("Failed to commit work order delete", e))?;

        Ok(Some(existing))
    }

    async fn status_counts(&self) -> Result<StatusTally, ServiceError> {
        let rows = WorkOrderEntity::find()
            .select_only()
            .column(Column::Status)
            .column_as(Expr::col((WorkOrderEntity, Column::Id)).count(), "count")
            .group_by(Column::Status)
            .into_tuple::<(WorkOrderStatus, i64)>()
            .all(self.db())
            .await
            .map_err(|e| db_error("Failed to count work orders", e))?;

        Ok(StatusTally::from_grouped_rows(rows))
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        self.db()
            .ping()
            .await
            .map_err(|e| ServiceError::StoreUnavailable(e.to_string()))
    }
}
