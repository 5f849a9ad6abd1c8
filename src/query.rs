//! Translates raw, untrusted list parameters into a typed filter, sort
//! specification and pagination window.

use crate::error::Violation;
use crate::models::{ListTodosParams, TodoPriority, TodoStatus};
use crate::validate;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    DueDate,
    Title,
    Status,
    SortOrder,
}

impl SortField {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            "dueDate" => Some(SortField::DueDate),
            "title" => Some(SortField::Title),
            "status" => Some(SortField::Status),
            "sortOrder" => Some(SortField::SortOrder),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
            SortField::DueDate => "dueDate",
            SortField::Title => "title",
            SortField::Status => "status",
            SortField::SortOrder => "sortOrder",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::DueDate => "due_date",
            SortField::Title => "title",
            SortField::Status => "status",
            SortField::SortOrder => "sort_order",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    fn label(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Parses a `field:direction` string. Fields outside the allow-list fall
    /// back to `createdAt`; any direction other than `asc` sorts descending.
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = raw.unwrap_or("");
        let (field, direction) = match raw.split_once(':') {
            Some((field, direction)) => (field, direction),
            None => (raw, ""),
        };

        SortSpec {
            field: SortField::parse(field).unwrap_or(SortField::CreatedAt),
            direction: if direction == "asc" {
                SortDirection::Asc
            } else {
                SortDirection::Desc
            },
        }
    }

    pub fn label(self) -> String {
        format!("{}:{}", self.field.name(), self.direction.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoFilter {
    pub status: Option<TodoStatus>,
    pub priority: Option<TodoPriority>,
    pub tags: Vec<String>,
    pub title_match: Option<String>,
    pub board_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    pub page: i64,
    pub limit: i64,
}

impl PageSpec {
    pub fn skip(self) -> i64 {
        (self.page - 1) * self.limit
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TodoQuery {
    pub filter: TodoFilter,
    pub sort: SortSpec,
    pub page: PageSpec,
}

/// Builds the full query specification for a list request. Out-of-range or
/// non-numeric `page`/`limit` values are clamped, never rejected; out-of-enum
/// `status`/`priority` filter values are rejected as validation errors.
pub fn build(params: &ListTodosParams) -> Result<TodoQuery, Vec<Violation>> {
    let mut violations = Vec::new();

    let status = validate::parse_status(params.status.as_deref(), &mut violations);
    let priority = validate::parse_priority(params.priority.as_deref(), &mut violations);

    if !violations.is_empty() {
        return Err(violations);
    }

    let tags = params.tag.as_deref().map(split_tags).unwrap_or_default();
    let title_match = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_owned);

    Ok(TodoQuery {
        filter: TodoFilter {
            status,
            priority,
            tags,
            title_match,
            board_id: params.board_id.clone(),
        },
        sort: SortSpec::parse(params.sort.as_deref()),
        page: PageSpec {
            page: parse_page(params.page.as_deref()),
            limit: parse_limit(params.limit.as_deref()),
        },
    })
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.parse::<i64>().ok())
        .map(|page| page.max(1))
        .unwrap_or(1)
}

fn parse_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.parse::<i64>().ok())
        .map(|limit| limit.clamp(1, MAX_LIMIT))
        .unwrap_or(DEFAULT_LIMIT)
}
