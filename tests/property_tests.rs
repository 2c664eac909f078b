//! Property-based tests for filtering, validation and the lifecycle rules.
//!
//! These tests use proptest to check invariants across generated records and
//! payloads, catching edge cases that example-based tests might miss.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use sea_orm::Iterable;

use quest_board::models::work_order::{WorkOrder, WorkOrderPriority, WorkOrderStatus};
use quest_board::queries::work_order_queries::{filter_and_sort, WorkOrderFilter};
use quest_board::services::lifecycle::LifecycleAction;
use quest_board::services::stats::{StatusCounts, StatusTally};
use quest_board::validation::{validate_create, validate_update, CreateWorkOrderRequest, UpdateWorkOrderRequest};

// Strategies for generating test data
fn status_strategy() -> impl Strategy<Value = WorkOrderStatus> {
    prop::sample::select(WorkOrderStatus::iter().collect::<Vec<_>>())
}

fn priority_strategy() -> impl Strategy<Value = WorkOrderPriority> {
    prop_oneof![
        Just(WorkOrderPriority::Low),
        Just(WorkOrderPriority::Medium),
        Just(WorkOrderPriority::High),
        Just(WorkOrderPriority::Urgent),
    ]
}

fn action_strategy() -> impl Strategy<Value = LifecycleAction> {
    prop_oneof![
        Just(LifecycleAction::Accept),
        Just(LifecycleAction::Complete),
        Just(LifecycleAction::Cancel),
    ]
}

fn work_order_strategy() -> impl Strategy<Value = WorkOrder> {
    (
        1i32..10_000,
        "[A-Za-z ]{1,20}",
        "[A-Za-z ]{1,40}",
        status_strategy(),
        priority_strategy(),
        0i64..1_000_000,
    )
        .prop_map(|(id, title, description, status, priority, offset)| {
            let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + chrono::Duration::seconds(offset);
            WorkOrder {
                id,
                title,
                description,
                status,
                priority,
                assigned_to: "Aria".to_string(),
                location: "Keep".to_string(),
                created_at,
                updated_at: created_at,
                due_date: created_at,
            }
        })
}

fn work_orders_strategy() -> impl Strategy<Value = Vec<WorkOrder>> {
    prop::collection::vec(work_order_strategy(), 0..40).prop_map(|mut records| {
        // ids are unique in any real store
        for (index, record) in records.iter_mut().enumerate() {
            record.id = index as i32 + 1;
        }
        records
    })
}

fn valid_create_strategy() -> impl Strategy<Value = CreateWorkOrderRequest> {
    (
        "[A-Za-z][A-Za-z ]{0,30}",
        "[A-Za-z][A-Za-z ]{0,60}",
        "[A-Za-z]{1,12}",
        "[A-Za-z]{1,12}",
        (2000i32..2100, 1u32..13, 1u32..29),
    )
        .prop_map(|(title, description, assigned_to, location, (y, m, d))| {
            CreateWorkOrderRequest {
                title: Some(title),
                description: Some(description),
                assigned_to: Some(assigned_to),
                location: Some(location),
                due_date: Some(format!("{y:04}-{m:02}-{d:02}")),
                ..Default::default()
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn filtered_results_are_exactly_the_matching_records(
        records in work_orders_strategy(),
        status in prop::option::of(status_strategy()),
        priority in prop::option::of(priority_strategy()),
        search in prop::option::of("[a-z]{1,3}"),
    ) {
        let filter = WorkOrderFilter { status, priority, search: search.clone() };
        let result = filter_and_sort(&records, &filter);

        for record in &result {
            prop_assert!(status.map_or(true, |s| record.status == s));
            prop_assert!(priority.map_or(true, |p| record.priority == p));
            if let Some(needle) = &search {
                prop_assert!(
                    record.title.to_lowercase().contains(needle)
                        || record.description.to_lowercase().contains(needle)
                );
            }
        }

        let expected = records.iter().filter(|r| filter.matches(r)).count();
        prop_assert_eq!(result.len(), expected);
    }

    #[test]
    fn results_are_ordered_newest_first(records in work_orders_strategy()) {
        let result = filter_and_sort(&records, &WorkOrderFilter::default());

        prop_assert_eq!(result.len(), records.len());
        for pair in result.windows(2) {
            prop_assert!(
                pair[0].created_at > pair[1].created_at
                    || (pair[0].created_at == pair[1].created_at && pair[0].id > pair[1].id)
            );
        }
    }

    #[test]
    fn stats_equal_per_status_counts(records in work_orders_strategy()) {
        let counts = StatusCounts::from(StatusTally::from_statuses(records.iter().map(|r| r.status)));
        let count = |s: WorkOrderStatus| records.iter().filter(|r| r.status == s).count() as u64;

        prop_assert_eq!(counts.pending, count(WorkOrderStatus::Pending));
        prop_assert_eq!(counts.in_progress, count(WorkOrderStatus::InProgress));
        prop_assert_eq!(counts.completed, count(WorkOrderStatus::Completed));
    }

    #[test]
    fn valid_creates_default_status_and_priority(request in valid_create_strategy()) {
        let created = validate_create(request.clone());
        prop_assert!(created.is_ok(), "rejected {:?}", request);
        let created = created.unwrap();
        prop_assert_eq!(created.status, WorkOrderStatus::Pending);
        prop_assert_eq!(created.priority, WorkOrderPriority::Medium);
    }

    #[test]
    fn whitespace_titles_are_always_rejected(blank in "[ \t]{0,8}", request in valid_create_strategy()) {
        let request = CreateWorkOrderRequest { title: Some(blank), ..request };
        let failure = validate_create(request).unwrap_err();
        prop_assert!(failure.has_field("title"));
    }

    #[test]
    fn unknown_statuses_never_validate(raw in "[a-z_]{1,12}") {
        prop_assume!(WorkOrderStatus::names().iter().all(|name| *name != raw));
        let request = UpdateWorkOrderRequest { status: Some(raw), ..Default::default() };
        let failure = validate_update(request).unwrap_err();
        prop_assert!(failure.has_field("status"));
    }

    #[test]
    fn actions_only_land_on_reachable_states(from in status_strategy(), action in action_strategy()) {
        let allowed = action.is_allowed_from(from);
        prop_assert_eq!(allowed, from.can_transition_to(action.target()));
        if from.is_terminal() {
            prop_assert!(!allowed);
        }
    }
}
