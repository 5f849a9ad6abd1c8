use std::backtrace::Backtrace;

use axum::response::{IntoResponse, Response};
use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub enum AppError {
    Validation(Vec<Violation>),
    NotFound,
    Unauthorized,
    Storage {
        message: String,
        stack: Option<String>,
    },
}

impl AppError {
    pub fn storage(err: rusqlite::Error, capture_stack: bool) -> Self {
        AppError::Storage {
            message: err.to_string(),
            stack: capture_stack.then(|| Backtrace::force_capture().to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Validation error", "details": details })),
            )
                .into_response(),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Not found" })),
            )
                .into_response(),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response(),
            AppError::Storage { message, stack } => {
                tracing::error!(%message, "storage failure");
                let body = match stack {
                    Some(stack) => json!({ "error": message, "stack": stack }),
                    None => json!({ "error": message }),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
