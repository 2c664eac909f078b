//! Work-order state machine.
//!
//! ```text
//! pending ──accept──▶ in_progress ──complete──▶ completed
//!    │                    │
//!    └──────cancel────────┴──────────────────▶ cancelled
//! ```
//!
//! These rules bind the named actions only. A generic update may still set any
//! enumerated status directly.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::models::work_order::WorkOrderStatus;

impl WorkOrderStatus {
    /// `completed` and `cancelled` admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: WorkOrderStatus) -> bool {
        use WorkOrderStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress) | (InProgress, Completed) | (Pending | InProgress, Cancelled)
        )
    }
}

/// Client-facing lifecycle actions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleAction {
    /// Take on a pending quest
    Accept,
    /// Finish a quest in progress
    Complete,
    /// Abandon a quest that is not finished
    Cancel,
}

impl LifecycleAction {
    pub fn target(self) -> WorkOrderStatus {
        match self {
            Self::Accept => WorkOrderStatus::InProgress,
            Self::Complete => WorkOrderStatus::Completed,
            Self::Cancel => WorkOrderStatus::Cancelled,
        }
    }

    /// Statuses from which the action is legal.
    pub fn allowed_from(self) -> &'static [WorkOrderStatus] {
        match self {
            Self::Accept => &[WorkOrderStatus::Pending],
            Self::Complete => &[WorkOrderStatus::InProgress],
            Self::Cancel => &[WorkOrderStatus::Pending, WorkOrderStatus::InProgress],
        }
    }

    pub fn is_allowed_from(self, current: WorkOrderStatus) -> bool {
        self.allowed_from().contains(&current)
    }
}
