//! Wire DTOs for the todo API.
//!
//! # Design
//! Defined independently of the server crate so the client carries no axum
//! or SQLite baggage. The JSON vectors in `test-vectors/` and the end-to-end
//! test catch schema drift between the two.

use serde::{Deserialize, Serialize};

/// A single todo item as the server reports it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    pub order: i64,
}

/// Request payload for creating a new todo. The server assigns id and order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodo {
    pub title: String,
}

/// Request payload for updating an existing todo. Only the fields present in
/// the JSON are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Request payload for reordering: every current id, in the desired order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderTodos {
    pub todo_ids: Vec<i64>,
}

impl ReorderTodos {
    pub fn from_todos(todos: &[Todo]) -> Self {
        Self {
            todo_ids: todos.iter().map(|t| t.id).collect(),
        }
    }
}
