//! Client core for the ordered todo service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). On top of that sit the
//! stateful pieces a front end needs: [`TodoList`], the local mirror of the
//! server's list with optimistic reordering, and [`Board`], which maps user
//! gestures onto it and renders cards.
//!
//! # Design
//! - `TodoClient` is stateless; it holds only `base_url`.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - `TodoList` and `Board` reach the network only through a host-supplied
//!   [`Transport`].
//! - DTOs are defined independently from the server crate; the JSON vectors
//!   and the end-to-end test catch schema drift.

pub mod board;
pub mod client;
pub mod error;
pub mod http;
pub mod list;
pub mod types;

pub use board::{move_item, Board, Editing, Key};
pub use client::TodoClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use list::{Reconcile, TodoList};
pub use types::{CreateTodo, ReorderTodos, Todo, UpdateTodo};
