//! Field-level validation shared by the todo service and the query builder.
//! Violations keep their field order so responses list them predictably.

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::error::Violation;
use crate::models::{NewTodo, TodoPatch, TodoPayload, TodoPriority, TodoStatus};

pub const SORT_ORDER_MAX: i64 = 1_000_000;

pub fn create_todo(payload: TodoPayload) -> Result<NewTodo, Vec<Violation>> {
    let mut violations = Vec::new();

    let title = match payload.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => {
            violations.push(Violation {
                field: "title",
                message: "title is required".to_string(),
            });
            String::new()
        }
    };

    let status = parse_status(payload.status.as_deref(), &mut violations).unwrap_or_default();
    let priority = parse_priority(payload.priority.as_deref(), &mut violations).unwrap_or_default();
    let due_date = match payload.due_date.as_deref() {
        Some(raw) => parse_due_date(raw, &mut violations),
        None => None,
    };
    let sort_order = match payload.sort_order.as_ref() {
        Some(raw) => parse_sort_order(raw, &mut violations),
        None => None,
    };

    if !violations.is_empty() {
        return Err(violations);
    }

    Ok(NewTodo {
        title,
        description: payload.description.unwrap_or_default(),
        status,
        priority,
        tags: payload.tags.unwrap_or_default(),
        due_date,
        board_id: payload.board_id,
        sort_order,
    })
}

pub fn update_todo(payload: TodoPayload) -> Result<TodoPatch, Vec<Violation>> {
    let mut violations = Vec::new();

    let title = match payload.title.as_deref().map(str::trim) {
        Some(title) if title.is_empty() => {
            violations.push(Violation {
                field: "title",
                message: "title must not be empty".to_string(),
            });
            None
        }
        Some(title) => Some(title.to_string()),
        None => None,
    };

    let status = parse_status(payload.status.as_deref(), &mut violations);
    let priority = parse_priority(payload.priority.as_deref(), &mut violations);
    let due_date = match payload.due_date.as_deref() {
        Some(raw) => parse_due_date(raw, &mut violations),
        None => None,
    };
    let sort_order = match payload.sort_order.as_ref() {
        Some(raw) => parse_sort_order(raw, &mut violations),
        None => None,
    };

    if !violations.is_empty() {
        return Err(violations);
    }

    Ok(TodoPatch {
        title,
        description: payload.description,
        status,
        priority,
        tags: payload.tags,
        due_date,
        board_id: payload.board_id,
        sort_order,
    })
}

pub(crate) fn parse_status(
    raw: Option<&str>,
    violations: &mut Vec<Violation>,
) -> Option<TodoStatus> {
    let raw = raw?;
    match TodoStatus::parse(raw) {
        Some(status) => Some(status),
        None => {
            violations.push(Violation {
                field: "status",
                message: format!("status must be one of {}", TodoStatus::ALLOWED),
            });
            None
        }
    }
}

pub(crate) fn parse_priority(
    raw: Option<&str>,
    violations: &mut Vec<Violation>,
) -> Option<TodoPriority> {
    let raw = raw?;
    match TodoPriority::parse(raw) {
        Some(priority) => Some(priority),
        None => {
            violations.push(Violation {
                field: "priority",
                message: format!("priority must be one of {}", TodoPriority::ALLOWED),
            });
            None
        }
    }
}

fn parse_sort_order(raw: &Value, violations: &mut Vec<Violation>) -> Option<i64> {
    match raw.as_i64() {
        Some(n) if (0..=SORT_ORDER_MAX).contains(&n) => Some(n),
        _ => {
            violations.push(Violation {
                field: "sortOrder",
                message: format!("sortOrder must be an integer between 0 and {SORT_ORDER_MAX}"),
            });
            None
        }
    }
}

// Normalizes to UTC so stored values compare lexicographically in date order.
fn parse_due_date(raw: &str, violations: &mut Vec<Violation>) -> Option<String> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .and_then(|dt| dt.to_offset(UtcOffset::UTC).format(&Rfc3339).ok())
        .or_else(|| {
            violations.push(Violation {
                field: "dueDate",
                message: "dueDate must be an RFC 3339 date-time".to_string(),
            });
            None
        })
}
