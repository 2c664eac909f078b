use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Iterable;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

/// Lifecycle stage of a work order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkOrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl Default for WorkOrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl WorkOrderStatus {
    /// Wire/storage names in lifecycle order, used for the schema CHECK constraint and error messages.
    pub fn names() -> Vec<&'static str> {
        Self::iter().map(<&'static str>::from).collect()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Urgency classification of a work order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkOrderPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

impl Default for WorkOrderPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl WorkOrderPriority {
    pub fn names() -> Vec<&'static str> {
        Self::iter().map(<&'static str>::from).collect()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// A persisted work order ("quest").
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "work_orders")]
#[serde(rename_all = "camelCase")]
#[schema(as = WorkOrder)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: String,
    pub status: WorkOrderStatus,
    pub priority: WorkOrderPriority,
    pub assigned_to: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Public name for a stored record.
pub type WorkOrder = Model;

/// A fully validated record that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkOrder {
    pub title: String,
    pub description: String,
    pub status: WorkOrderStatus,
    pub priority: WorkOrderPriority,
    pub assigned_to: String,
    pub location: String,
    pub due_date: DateTime<Utc>,
}

impl NewWorkOrder {
    /// Materializes the record a store would persist, stamping both timestamps with `now`.
    pub fn into_model(self, id: i32, now: DateTime<Utc>) -> Model {
        Model {
            id,
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            assigned_to: self.assigned_to,
            location: self.location,
            created_at: now,
            updated_at: now,
            due_date: self.due_date,
        }
    }
}

/// Validated partial update. `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkOrderChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkOrderStatus>,
    pub priority: Option<WorkOrderPriority>,
    pub assigned_to: Option<String>,
    pub location: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

impl WorkOrderChanges {
    pub fn with_status(status: WorkOrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Applies the changes to an in-memory record and bumps `updated_at`.
    ///
    /// `updated_at` never moves behind `created_at`, even if the wall clock did.
    pub fn apply_to(self, record: &mut Model, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(priority) = self.priority {
            record.priority = priority;
        }
        if let Some(assigned_to) = self.assigned_to {
            record.assigned_to = assigned_to;
        }
        if let Some(location) = self.location {
            record.location = location;
        }
        if let Some(due_date) = self.due_date {
            record.due_date = due_date;
        }
        record.updated_at = now.max(record.created_at);
    }

    /// Copies the supplied fields onto an active model for a sea-orm update.
    pub fn apply_to_active(self, active: &mut ActiveModel, created_at: DateTime<Utc>, now: DateTime<Utc>) {
        use sea_orm::Set;

        if let Some(title) = self.title {
            active.title = Set(title);
        }
        if let Some(description) = self.description {
            active.description = Set(description);
        }
        if let Some(status) = self.status {
            active.status = Set(status);
        }
        if let Some(priority) = self.priority {
            active.priority = Set(priority);
        }
        if let Some(assigned_to) = self.assigned_to {
            active.assigned_to = Set(assigned_to);
        }
        if let Some(location) = self.location {
            active.location = Set(location);
        }
        if let Some(due_date) = self.due_date {
            active.due_date = Set(due_date);
        }
        active.updated_at = Set(now.max(created_at));
    }
}
