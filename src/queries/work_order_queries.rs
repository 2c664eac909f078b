use std::cmp::Ordering;

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{ColumnTrait, Condition, DbBackend, EntityTrait, QueryFilter, QueryOrder, Select};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::models::work_order::{self, WorkOrder, WorkOrderPriority, WorkOrderStatus};
use crate::validation::{parse_priority, parse_status, ValidationFailure};

/// Raw query string of the listing endpoint.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkOrderListParams {
    /// Exact status match
    pub status: Option<String>,
    /// Exact priority match
    pub priority: Option<String>,
    /// Case-insensitive substring of title or description
    pub search: Option<String>,
}

/// Typed listing filter. Every supplied criterion must hold (logical AND).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkOrderFilter {
    pub status: Option<WorkOrderStatus>,
    pub priority: Option<WorkOrderPriority>,
    pub search: Option<String>,
}

impl WorkOrderFilter {
    /// Parses query parameters. Empty values count as "not supplied".
    pub fn from_params(params: WorkOrderListParams) -> Result<Self, ValidationFailure> {
        fn supplied(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        let status = supplied(params.status)
            .map(|raw| parse_status(&raw))
            .transpose()
            .map_err(|message| ValidationFailure::single("status", message))?;
        let priority = supplied(params.priority)
            .map(|raw| parse_priority(&raw))
            .transpose()
            .map_err(|message| ValidationFailure::single("priority", message))?;

        Ok(Self {
            status,
            priority,
            search: supplied(params.search),
        })
    }

    pub fn with_status(mut self, status: WorkOrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: WorkOrderPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none() && self.search.is_none()
    }

    /// In-memory rendering of the filter.
    pub fn matches(&self, record: &WorkOrder) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if record.priority != priority {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !record.title.to_lowercase().contains(&needle)
                && !record.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }

    /// Status and priority as SQL.
    fn enum_condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(status) = self.status {
            condition = condition.add(work_order::Column::Status.eq(status));
        }
        if let Some(priority) = self.priority {
            condition = condition.add(work_order::Column::Priority.eq(priority));
        }

        condition
    }

    /// Search as SQL: `LOWER(col) LIKE '%needle%'` over title or description.
    fn search_condition(&self) -> Option<Condition> {
        let search = self.search.as_ref()?;
        let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
        let lowered_like = |column: work_order::Column| {
            Expr::expr(Func::lower(Expr::col((work_order::Entity, column))))
                .like(LikeExpr::new(pattern.clone()).escape('\\'))
        };

        Some(
            Condition::any()
                .add(lowered_like(work_order::Column::Title))
                .add(lowered_like(work_order::Column::Description)),
        )
    }

    /// Full SQL rendering of the filter.
    pub fn condition(&self) -> Condition {
        let condition = self.enum_condition();
        match self.search_condition() {
            Some(search) => condition.add(search),
            None => condition,
        }
    }

    /// Filtered, ordered select over the work-order table.
    pub fn select(&self) -> Select<work_order::Entity> {
        apply_ordering(work_order::Entity::find().filter(self.condition()))
    }

    /// Select for a given backend. Where the backend cannot fold case like
    /// [`WorkOrderFilter::matches`], search is left out and the caller must
    /// finish the rows with `matches`.
    pub fn select_for(&self, backend: DbBackend) -> Select<work_order::Entity> {
        if search_in_sql(backend) {
            self.select()
        } else {
            apply_ordering(work_order::Entity::find().filter(self.enum_condition()))
        }
    }
}

/// SQLite's `LOWER()` folds ASCII only; Postgres and MySQL lower Unicode text.
pub fn search_in_sql(backend: DbBackend) -> bool {
    !matches!(backend, DbBackend::Sqlite)
}

/// Newest first; ties on `created_at` fall back to the higher id.
pub fn apply_ordering(select: Select<work_order::Entity>) -> Select<work_order::Entity> {
    select
        .order_by_desc(work_order::Column::CreatedAt)
        .order_by_desc(work_order::Column::Id)
}

/// Ordering used by [`apply_ordering`], for in-memory collections.
pub fn newest_first(a: &WorkOrder, b: &WorkOrder) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

pub fn sort_newest_first(records: &mut [WorkOrder]) {
    records.sort_by(newest_first);
}

/// Runs the filter over an in-memory collection and returns the ordered matches.
pub fn filter_and_sort<'a, I>(records: I, filter: &WorkOrderFilter) -> Vec<WorkOrder>
where
    I: IntoIterator<Item = &'a WorkOrder>,
{
    let mut matched: Vec<WorkOrder> = records
        .into_iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect();
    sort_newest_first(&mut matched);
    matched
}

/// Escapes LIKE wildcards so the search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::work_order::NewWorkOrder;
    use chrono::{Duration, TimeZone, Utc};
    use sea_orm::QueryTrait;

    fn record(id: i32, title: &str, description: &str, minutes: i64) -> WorkOrder {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        NewWorkOrder {
            title: title.into(),
            description: description.into(),
            status: WorkOrderStatus::Pending,
            priority: WorkOrderPriority::Medium,
            assigned_to: "Aria".into(),
            location: "Guild hall".into(),
            due_date: base + Duration::days(7),
        }
        .into_model(id, base + Duration::minutes(minutes))
    }

    #[test]
    fn empty_params_mean_no_filter() {
        let filter = WorkOrderFilter::from_params(WorkOrderListParams {
            status: Some(String::new()),
            priority: None,
            search: Some(String::new()),
        })
        .unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn unknown_status_is_a_validation_failure() {
        let failure = WorkOrderFilter::from_params(WorkOrderListParams {
            status: Some("archived".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(failure.has_field("status"));
    }

    #[test]
    fn search_is_case_insensitive_over_title_or_description() {
        let records = vec![
            record(1, "Fetch Potion", "Red vial", 0),
            record(2, "Slay Dragon", "Big one", 1),
            record(3, "Escort", "Protect the DRAGON egg", 2),
        ];
        let filter = WorkOrderFilter::default().with_search("dragon");
        let ids: Vec<i32> = filter_and_sort(&records, &filter).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn filters_combine_with_and() {
        let mut urgent = record(1, "Quest A", "", 0);
        urgent.priority = WorkOrderPriority::Urgent;
        let mut urgent_done = record(2, "Quest B", "", 1);
        urgent_done.priority = WorkOrderPriority::Urgent;
        urgent_done.status = WorkOrderStatus::Completed;
        let plain = record(3, "Quest C", "", 2);

        let records = vec![urgent, urgent_done, plain];
        let filter = WorkOrderFilter::default()
            .with_priority(WorkOrderPriority::Urgent)
            .with_status(WorkOrderStatus::Pending);
        let ids: Vec<i32> = filter_and_sort(&records, &filter).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn ordering_is_newest_first_with_id_tie_break() {
        let mut records = vec![
            record(1, "a", "a", 5),
            record(2, "b", "b", 10),
            record(3, "c", "c", 5),
        ];
        sort_newest_first(&mut records);
        let ids: Vec<i32> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
        let records = vec![record(1, "100% done", "", 0), record(2, "1000 done", "", 1)];
        let filter = WorkOrderFilter::default().with_search("100%");
        assert_eq!(filter_and_sort(&records, &filter).len(), 1);
    }

    #[test]
    fn search_folds_unicode_case() {
        let records = vec![record(1, "ÉPÉE Forge", "", 0), record(2, "Anvil", "", 1)];
        let filter = WorkOrderFilter::default().with_search("épée");
        let ids: Vec<i32> = filter_and_sort(&records, &filter).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn sqlite_select_leaves_search_to_matches() {
        let filter = WorkOrderFilter::default()
            .with_priority(WorkOrderPriority::High)
            .with_search("épée");

        let sqlite = filter.select_for(DbBackend::Sqlite).build(DbBackend::Sqlite).to_string();
        assert!(!sqlite.contains("LIKE"), "{sqlite}");
        assert!(sqlite.contains(r#""work_orders"."priority" = 'high'"#), "{sqlite}");

        let postgres = filter
            .select_for(DbBackend::Postgres)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(postgres.contains("LIKE"), "{postgres}");
    }

    #[test]
    fn sql_rendering_filters_and_orders() {
        let sql = WorkOrderFilter::default()
            .with_status(WorkOrderStatus::InProgress)
            .with_search("Quest")
            .select()
            .build(DbBackend::Sqlite)
            .to_string();

        assert!(sql.contains(r#""work_orders"."status" = 'in_progress'"#), "{sql}");
        assert!(sql.contains("LOWER"), "{sql}");
        assert!(sql.contains("'%quest%'"), "{sql}");
        assert!(
            sql.contains(r#"ORDER BY "work_orders"."created_at" DESC, "work_orders"."id" DESC"#),
            "{sql}"
        );
    }
}
