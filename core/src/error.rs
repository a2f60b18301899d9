//! Error types for the todo API client.
//!
//! # Design
//! `NotFound` and `Rejected` get dedicated variants because callers react to
//! them differently from an unexpected status: one means the item is gone,
//! the other that the server refused the input (blank title, bad reorder).
//! Everything else keeps the raw status and body for diagnostics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404; the requested todo does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned 400 or 422 and refused the request payload.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The server returned some other non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The host could not complete the round-trip at all.
    #[error("transport failed: {0}")]
    Transport(String),

    #[error("deserialization failed: {0}")]
    Deserialize(String),

    #[error("serialization failed: {0}")]
    Serialize(String),
}
