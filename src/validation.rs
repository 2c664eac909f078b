//! Validation and normalization of inbound work-order payloads.
//!
//! Request bodies deserialize into all-optional structs so that a missing
//! field surfaces as a per-field error rather than a body rejection. The
//! `validator` derive checks presence and blankness; enumerations and the due
//! date are then parsed into their typed forms.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::work_order::{
    NewWorkOrder, WorkOrderChanges, WorkOrderPriority, WorkOrderStatus,
};

/// One offending field and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    /// Field name as it appears in the JSON payload
    pub field: String,
    pub message: String,
}

/// A rejected payload, carrying one message per offending field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationFailure {
    errors: Vec<FieldError>,
}

impl ValidationFailure {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        // first message per field wins
        if !self.has_field(field) {
            self.errors.push(FieldError {
                field: field.to_string(),
                message: message.into(),
            });
        }
    }

    fn finish(mut self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            self.errors.sort_by(|a, b| a.field.cmp(&b.field));
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl From<ValidationErrors> for ValidationFailure {
    fn from(errors: ValidationErrors) -> Self {
        let mut failure = ValidationFailure::default();
        // BTreeMap keeps the output independent of hash ordering
        let by_field: BTreeMap<String, Vec<ValidationError>> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| (json_field_name(field), errs.clone()))
            .collect();
        for (field, errs) in by_field {
            for err in errs {
                let message = match err.message {
                    Some(message) => message.to_string(),
                    None if err.code == "required" => format!("{} is required", field_label(&field)),
                    None => format!("{} is invalid", field),
                };
                failure.push(&field, message);
            }
        }
        failure
    }
}

/// Human label for a payload field (`assignedTo` -> `Assigned To`).
fn field_label(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 2);
    for (i, ch) in field.chars().enumerate() {
        if i == 0 {
            out.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            out.push(' ');
            out.push(ch);
        } else {
            out.push(ch);
        }
    }
    out
}

/// Maps a Rust field name to its camelCase payload name (`assigned_to` -> `assignedTo`).
fn json_field_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for ch in field.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Candidate fields for a new work order.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkOrderRequest {
    #[validate(required, custom = "validate_not_blank")]
    #[schema(example = "Slay Dragon")]
    pub title: Option<String>,

    #[validate(required, custom = "validate_not_blank")]
    pub description: Option<String>,

    /// Defaults to `pending`
    #[schema(example = "pending")]
    pub status: Option<String>,

    /// Defaults to `medium`
    #[schema(example = "high")]
    pub priority: Option<String>,

    #[validate(required, custom = "validate_not_blank")]
    pub assigned_to: Option<String>,

    #[validate(required, custom = "validate_not_blank")]
    pub location: Option<String>,

    #[validate(required, custom = "validate_not_blank")]
    #[schema(example = "2024-06-01")]
    pub due_date: Option<String>,
}

/// Partial update; only supplied fields are validated and written.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkOrderRequest {
    #[validate(custom = "validate_not_blank")]
    pub title: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub assigned_to: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub location: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub due_date: Option<String>,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Parses a status name, producing the field error on failure.
pub fn parse_status(value: &str) -> Result<WorkOrderStatus, String> {
    WorkOrderStatus::from_str(value).map_err(|_| {
        format!(
            "Invalid status '{}'; expected one of: {}",
            value,
            WorkOrderStatus::names().join(", ")
        )
    })
}

/// Parses a priority name, producing the field error on failure.
pub fn parse_priority(value: &str) -> Result<WorkOrderPriority, String> {
    WorkOrderPriority::from_str(value).map_err(|_| {
        format!(
            "Invalid priority '{}'; expected one of: {}",
            value,
            WorkOrderPriority::names().join(", ")
        )
    })
}

/// Parses a due date into an absolute timestamp.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM[:SS[.fff]]` (taken as UTC) and a
/// bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_due_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

struct TypedFields {
    status: Option<WorkOrderStatus>,
    priority: Option<WorkOrderPriority>,
    due_date: Option<DateTime<Utc>>,
}

/// Shared enum/date parsing for both paths. Fields already rejected by the
/// derive (e.g. a blank due date) are not reported twice.
fn parse_typed_fields(
    failure: &mut ValidationFailure,
    status: Option<&str>,
    priority: Option<&str>,
    due_date: Option<&str>,
) -> TypedFields {
    let status = status.and_then(|raw| match parse_status(raw) {
        Ok(status) => Some(status),
        Err(message) => {
            failure.push("status", message);
            None
        }
    });
    let priority = priority.and_then(|raw| match parse_priority(raw) {
        Ok(priority) => Some(priority),
        Err(message) => {
            failure.push("priority", message);
            None
        }
    });
    let due_date = due_date
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| match parse_due_date(raw) {
            Some(dt) => Some(dt),
            None => {
                failure.push("dueDate", format!("Invalid date '{}'", raw));
                None
            }
        });
    TypedFields {
        status,
        priority,
        due_date,
    }
}

fn derive_failure<T: Validate>(request: &T) -> ValidationFailure {
    match request.validate() {
        Ok(()) => ValidationFailure::default(),
        Err(errors) => errors.into(),
    }
}

/// Validates a create payload into a fully-typed record.
pub fn validate_create(request: CreateWorkOrderRequest) -> Result<NewWorkOrder, ValidationFailure> {
    let mut failure = derive_failure(&request);
    let typed = parse_typed_fields(
        &mut failure,
        request.status.as_deref(),
        request.priority.as_deref(),
        request.due_date.as_deref(),
    );
    failure.finish()?;

    match (
        request.title,
        request.description,
        request.assigned_to,
        request.location,
        typed.due_date,
    ) {
        (Some(title), Some(description), Some(assigned_to), Some(location), Some(due_date)) => {
            Ok(NewWorkOrder {
                title,
                description,
                status: typed.status.unwrap_or_default(),
                priority: typed.priority.unwrap_or_default(),
                assigned_to,
                location,
                due_date,
            })
        }
        // the derive reports every missing field, so this is unreachable in practice
        _ => Err(ValidationFailure::single("body", "Incomplete work order")),
    }
}

/// Validates an update payload; absent fields stay `None`.
pub fn validate_update(request: UpdateWorkOrderRequest) -> Result<WorkOrderChanges, ValidationFailure> {
    let mut failure = derive_failure(&request);
    let typed = parse_typed_fields(
        &mut failure,
        request.status.as_deref(),
        request.priority.as_deref(),
        request.due_date.as_deref(),
    );
    failure.finish()?;

    Ok(WorkOrderChanges {
        title: request.title,
        description: request.description,
        status: typed.status,
        priority: typed.priority,
        assigned_to: request.assigned_to,
        location: request.location,
        due_date: typed.due_date,
    })
}
