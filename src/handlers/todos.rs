use axum::extract::{Path, Query, State};
use axum::{http::StatusCode, response::IntoResponse, Json};
use tracing::info;

use crate::error::AppError;
use crate::models::{ListTodosParams, Todo, TodoPage, TodoPayload};
use crate::{service, AppState};

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<TodoPayload>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let todo = service::create_todo(&state.repo, payload)?;
    info!(id = todo.id, title = %todo.title, "created todo");
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListTodosParams>,
) -> Result<Json<TodoPage>, AppError> {
    let page = service::list_todos(&state.repo, params)?;
    info!(count = page.items.len(), total = page.total, "listed todos");
    Ok(Json(page))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<TodoPayload>,
) -> Result<Json<Todo>, AppError> {
    let todo = service::update_todo(&state.repo, id, payload)?;
    info!(id = todo.id, status = todo.status.as_str(), "updated todo");
    Ok(Json(todo))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    service::delete_todo(&state.repo, id)?;
    info!(id, "deleted todo");
    Ok(StatusCode::NO_CONTENT)
}
