use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TodoStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    pub const ALLOWED: &'static str = "pending, in-progress, completed";

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(TodoStatus::Pending),
            "in-progress" => Some(TodoStatus::InProgress),
            "completed" => Some(TodoStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::InProgress => "in-progress",
            TodoStatus::Completed => "completed",
        }
    }
}

impl FromSql for TodoStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|s| TodoStatus::parse(s).ok_or(FromSqlError::InvalidType))
    }
}

impl ToSql for TodoStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TodoPriority {
    pub const ALLOWED: &'static str = "low, medium, high";

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "low" => Some(TodoPriority::Low),
            "medium" => Some(TodoPriority::Medium),
            "high" => Some(TodoPriority::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TodoPriority::Low => "low",
            TodoPriority::Medium => "medium",
            TodoPriority::High => "high",
        }
    }
}

impl FromSql for TodoPriority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()
            .and_then(|s| TodoPriority::parse(s).ok_or(FromSqlError::InvalidType))
    }
}

impl ToSql for TodoPriority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    pub tags: Vec<String>,
    pub due_date: Option<String>,
    pub board_id: Option<String>,
    pub sort_order: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: i64,
    pub name: String,
    pub owner_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSummary {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
}

/// Raw request body for creating or updating a todo. Everything is optional
/// here; `validate` decides what a create requires versus an update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TodoPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<String>,
    pub board_id: Option<String>,
    // Accepts any JSON value so fractional and non-numeric inputs surface as
    // a 400 violation instead of a body-deserialization rejection.
    pub sort_order: Option<serde_json::Value>,
}

/// A validated create, with defaults applied and the title trimmed.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    pub tags: Vec<String>,
    pub due_date: Option<String>,
    pub board_id: Option<String>,
    pub sort_order: Option<i64>,
}

/// A validated partial update; `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TodoStatus>,
    pub priority: Option<TodoPriority>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<String>,
    pub board_id: Option<String>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListTodosParams {
    pub status: Option<String>,
    pub tag: Option<String>,
    pub q: Option<String>,
    pub priority: Option<String>,
    pub board_id: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardTodosParams {
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TodoPage {
    pub items: Vec<Todo>,
    pub page: i64,
    pub limit: i64,
    pub total: u64,
    pub pages: u64,
    pub sort: String,
    pub filters: FilterEcho,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterEcho {
    pub status: Option<String>,
    pub tag: Option<String>,
    pub priority: Option<String>,
    pub board_id: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BoardList {
    pub boards: Vec<BoardSummary>,
}

#[derive(Debug, Serialize)]
pub struct BoardTodos {
    pub todos: Vec<Todo>,
}
