use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::work_order::WorkOrderStatus;

/// Per-status totals over one snapshot of the store.
///
/// `cancelled` is tallied here but is not part of the public response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusTally {
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub cancelled: u64,
}

impl StatusTally {
    pub fn add(&mut self, status: WorkOrderStatus, count: u64) {
        match status {
            WorkOrderStatus::Pending => self.pending += count,
            WorkOrderStatus::InProgress => self.in_progress += count,
            WorkOrderStatus::Completed => self.completed += count,
            WorkOrderStatus::Cancelled => self.cancelled += count,
        }
    }

    /// Counts one record per status.
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = WorkOrderStatus>,
    {
        let mut tally = Self::default();
        for status in statuses {
            tally.add(status, 1);
        }
        tally
    }

    /// Folds `(status, count)` rows as returned by a grouped COUNT query.
    pub fn from_grouped_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (WorkOrderStatus, i64)>,
    {
        let mut tally = Self::default();
        for (status, count) in rows {
            tally.add(status, u64::try_from(count).unwrap_or(0));
        }
        tally
    }

    pub fn total(&self) -> u64 {
        self.pending + self.in_progress + self.completed + self.cancelled
    }
}

/// Dashboard statistics payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
}

impl From<StatusTally> for StatusCounts {
    fn from(tally: StatusTally) -> Self {
        Self {
            pending: tally.pending,
            in_progress: tally.in_progress,
            completed: tally.completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_is_tallied_but_not_reported() {
        let tally = StatusTally::from_statuses([
            WorkOrderStatus::Pending,
            WorkOrderStatus::Pending,
            WorkOrderStatus::InProgress,
            WorkOrderStatus::Cancelled,
        ]);
        assert_eq!(tally.total(), 4);
        assert_eq!(tally.cancelled, 1);

        let counts = StatusCounts::from(tally);
        assert_eq!(
            counts,
            StatusCounts {
                pending: 2,
                in_progress: 1,
                completed: 0
            }
        );
    }

    #[test]
    fn grouped_rows_fold_into_the_same_shape() {
        let from_rows = StatusTally::from_grouped_rows([
            (WorkOrderStatus::Completed, 3),
            (WorkOrderStatus::Pending, 1),
        ]);
        let from_records = StatusTally::from_statuses([
            WorkOrderStatus::Completed,
            WorkOrderStatus::Pending,
            WorkOrderStatus::Completed,
            WorkOrderStatus::Completed,
        ]);
        assert_eq!(from_rows, from_records);
    }

    #[test]
    fn response_uses_in_progress_camel_case() {
        let json = serde_json::to_value(StatusCounts {
            pending: 0,
            in_progress: 1,
            completed: 0,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"pending": 0, "inProgress": 1, "completed": 0}));
    }
}
