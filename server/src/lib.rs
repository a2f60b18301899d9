//! HTTP service for an ordered to-do list.
//!
//! # Overview
//! Stateless axum handlers over an [`ItemStore`]. Each handler makes exactly
//! one store call, so a request either applies fully or not at all.
//!
//! # Routes
//! - `GET  /todos/`               list, ascending by `order`
//! - `POST /todos/`               create `{title}`
//! - `GET  /todos/{id}`           fetch one
//! - `PUT  /todos/{id}`           update `{title?, completed?}`
//! - `PATCH /todos/{id}/toggle`   invert `completed`, no body
//! - `DELETE /todos/{id}`         remove
//! - `POST /todos/reorder`        `{todo_ids}`, must be a permutation of all ids
//! - `GET  /api/health`
//!
//! The collection routes answer with and without the trailing slash.

pub mod config;
pub mod error;
pub mod store;

use std::{future::Future, path::Path as FsPath};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub use config::Config;
pub use error::AppError;
pub use store::{Item, ItemChanges, ItemStore, StoreError};

#[derive(Debug, Deserialize)]
pub struct CreateTodo {
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderTodos {
    pub todo_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub mode: String,
}

/// The API router without static file hosting.
pub fn app(store: ItemStore) -> Router {
    with_layers(api(store, "api"))
}

/// The API router, plus single-page-app hosting when `static_dir` exists.
/// Unknown paths serve files from the directory and fall back to its
/// `index.html`.
pub fn router(store: ItemStore, static_dir: Option<&FsPath>) -> Router {
    match static_dir {
        Some(dir) if dir.is_dir() => {
            let spa = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
            with_layers(api(store, "static").fallback_service(spa))
        }
        Some(dir) => {
            tracing::warn!(dir = %dir.display(), "static directory missing, serving API only");
            app(store)
        }
        None => app(store),
    }
}

fn api(store: ItemStore, mode: &'static str) -> Router {
    Router::new()
        .route("/api/health", get(move || health(mode)))
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/", get(list_todos).post(create_todo))
        .route("/todos/reorder", post(reorder_todos))
        .route(
            "/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/todos/{id}/toggle", patch(toggle_todo))
        .with_state(store)
}

fn with_layers(router: Router) -> Router {
    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn run(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health(mode: &'static str) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        mode: mode.to_string(),
    })
}

async fn list_todos(State(store): State<ItemStore>) -> Result<Json<Vec<Item>>, AppError> {
    Ok(Json(store.list().await?))
}

async fn create_todo(
    State(store): State<ItemStore>,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    let item = store.create(&input.title).await?;
    tracing::debug!(id = item.id, order = item.order, "created todo");
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_todo(
    State(store): State<ItemStore>,
    Path(id): Path<i64>,
) -> Result<Json<Item>, AppError> {
    Ok(Json(store.get(id).await?))
}

async fn update_todo(
    State(store): State<ItemStore>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Item>, AppError> {
    let changes = ItemChanges {
        title: input.title,
        completed: input.completed,
    };
    Ok(Json(store.update(id, changes).await?))
}

async fn toggle_todo(
    State(store): State<ItemStore>,
    Path(id): Path<i64>,
) -> Result<Json<Item>, AppError> {
    let item = store.toggle(id).await?;
    tracing::debug!(id, completed = item.completed, "toggled todo");
    Ok(Json(item))
}

async fn delete_todo(
    State(store): State<ItemStore>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    store.delete(id).await?;
    tracing::debug!(id, "deleted todo");
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder_todos(
    State(store): State<ItemStore>,
    Json(input): Json<ReorderTodos>,
) -> Result<Json<Vec<Item>>, AppError> {
    let items = store.set_order(&input.todo_ids).await?;
    tracing::debug!(count = items.len(), "reordered todos");
    Ok(Json(items))
}
