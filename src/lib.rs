pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod query;
pub mod service;
pub mod validate;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use db::Repository;

#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/todos", get(handlers::todos::list))
        .route("/todos", post(handlers::todos::create))
        .route("/todos/{id}", put(handlers::todos::update))
        .route("/todos/{id}", delete(handlers::todos::remove))
        .route("/boards", get(handlers::boards::list))
        .route("/boards/{board_id}/todos", get(handlers::boards::todos))
        .layer(
            tower::ServiceBuilder::new()
                .layer(tower_http::trace::TraceLayer::new_for_http())
                .layer(tower_http::compression::CompressionLayer::new())
                .layer(tower_http::cors::CorsLayer::permissive()),
        )
        .with_state(state)
}
