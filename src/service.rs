//! Orchestration over the repository: validation, query building and the
//! pagination/ordering contract of the list endpoints.

use crate::db::Repository;
use crate::error::AppError;
use crate::models::{BoardSummary, FilterEcho, ListTodosParams, Todo, TodoPage, TodoPayload};
use crate::query::{self, SortSpec};
use crate::validate;

pub fn create_todo(repo: &Repository, payload: TodoPayload) -> Result<Todo, AppError> {
    let new = validate::create_todo(payload).map_err(AppError::Validation)?;
    repo.insert_todo(&new)
}

pub fn list_todos(repo: &Repository, params: ListTodosParams) -> Result<TodoPage, AppError> {
    let query = query::build(&params).map_err(AppError::Validation)?;

    let items = repo.find_todos(&query)?;
    let total = repo.count_todos(&query.filter)?;

    Ok(TodoPage {
        items,
        page: query.page.page,
        limit: query.page.limit,
        total,
        pages: total.div_ceil(query.page.limit as u64),
        sort: query.sort.label(),
        filters: FilterEcho {
            status: params.status,
            tag: params.tag,
            priority: params.priority,
            board_id: params.board_id,
            q: params.q,
        },
    })
}

pub fn update_todo(repo: &Repository, id: i64, payload: TodoPayload) -> Result<Todo, AppError> {
    let patch = validate::update_todo(payload).map_err(AppError::Validation)?;
    repo.update_todo(id, &patch)?.ok_or(AppError::NotFound)
}

pub fn delete_todo(repo: &Repository, id: i64) -> Result<(), AppError> {
    if repo.delete_todo(id)? {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

/// Board-scoped listing shares the sort and tie-break rules of `list_todos`
/// but returns every match without pagination.
pub fn list_board_todos(
    repo: &Repository,
    board_id: &str,
    sort: Option<&str>,
) -> Result<Vec<Todo>, AppError> {
    repo.find_todos_by_board(board_id, SortSpec::parse(sort))
}

pub fn list_boards(repo: &Repository, owner_id: &str) -> Result<Vec<BoardSummary>, AppError> {
    repo.find_boards_by_owner(owner_id)
}
