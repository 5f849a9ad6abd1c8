use axum::extract::{Path, Query, State};
use axum::Json;
use tracing::info;

use crate::error::AppError;
use crate::middleware::Identity;
use crate::models::{BoardList, BoardTodos, BoardTodosParams};
use crate::{service, AppState};

pub async fn list(
    Identity(owner_id): Identity,
    State(state): State<AppState>,
) -> Result<Json<BoardList>, AppError> {
    let boards = service::list_boards(&state.repo, &owner_id)?;
    info!(owner = %owner_id, count = boards.len(), "listed boards");
    Ok(Json(BoardList { boards }))
}

pub async fn todos(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    Query(params): Query<BoardTodosParams>,
) -> Result<Json<BoardTodos>, AppError> {
    let todos = service::list_board_todos(&state.repo, &board_id, params.sort.as_deref())?;
    Ok(Json(BoardTodos { todos }))
}
