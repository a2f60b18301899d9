//! SQLite-backed item store.
//!
//! # Design
//! One `todos` table keyed by an `AUTOINCREMENT` id so deleted ids are never
//! handed out again. The connection lives behind an async mutex; every
//! operation holds the lock for its whole read-modify-write, and multi-row
//! writes run inside a transaction, so each call is all-or-nothing.

use std::{collections::HashSet, path::Path, sync::Arc};

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    title     TEXT    NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0,
    "order"   INTEGER NOT NULL DEFAULT 0
);
"#;

const SELECT_ITEM: &str = r#"SELECT id, title, completed, "order" FROM todos"#;

const DEMO_ITEMS: [(&str, bool); 3] = [
    ("Learn axum", false),
    ("Build the terminal front end", false),
    ("Wire client and server together", true),
];

/// A stored to-do item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    pub order: i64,
}

/// Partial update; `None` fields keep their stored value.
#[derive(Clone, Debug, Default)]
pub struct ItemChanges {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("todo {0} not found")]
    NotFound(i64),

    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Clone)]
pub struct ItemStore {
    conn: Arc<Mutex<Connection>>,
}

impl ItemStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// A private, non-durable store. Used by tests and `TODO_DB_PATH=:memory:`.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn list(&self) -> StoreResult<Vec<Item>> {
        let conn = self.conn.lock().await;
        list_items(&conn)
    }

    pub async fn create(&self, title: &str) -> StoreResult<Item> {
        let title = clean_title(title)?;
        let conn = self.conn.lock().await;
        insert_item(&conn, &title, false)
    }

    pub async fn get(&self, id: i64) -> StoreResult<Item> {
        let conn = self.conn.lock().await;
        find_item(&conn, id)?.ok_or(StoreError::NotFound(id))
    }

    pub async fn update(&self, id: i64, changes: ItemChanges) -> StoreResult<Item> {
        let title = changes.title.as_deref().map(clean_title).transpose()?;
        let conn = self.conn.lock().await;
        let mut item = find_item(&conn, id)?.ok_or(StoreError::NotFound(id))?;
        if let Some(title) = title {
            item.title = title;
        }
        if let Some(completed) = changes.completed {
            item.completed = completed;
        }
        conn.execute(
            "UPDATE todos SET title = ?1, completed = ?2 WHERE id = ?3",
            params![item.title, item.completed, id],
        )?;
        Ok(item)
    }

    pub async fn toggle(&self, id: i64) -> StoreResult<Item> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE todos SET completed = NOT completed WHERE id = ?1",
            params![id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        find_item(&conn, id)?.ok_or(StoreError::NotFound(id))
    }

    pub async fn delete(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        match conn.execute("DELETE FROM todos WHERE id = ?1", params![id])? {
            0 => Err(StoreError::NotFound(id)),
            _ => Ok(()),
        }
    }

    /// Assign `order = position` for every id in `ids`.
    ///
    /// `ids` must be a permutation of every stored id; anything else is
    /// rejected before a row is touched.
    pub async fn set_order(&self, ids: &[i64]) -> StoreResult<Vec<Item>> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let existing: HashSet<i64> = {
            let mut stmt = tx.prepare("SELECT id FROM todos")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };
        check_permutation(&existing, ids)?;

        {
            let mut stmt = tx.prepare(r#"UPDATE todos SET "order" = ?1 WHERE id = ?2"#)?;
            for (position, id) in ids.iter().enumerate() {
                stmt.execute(params![position as i64, id])?;
            }
        }
        let items = list_items(&tx)?;
        tx.commit()?;
        Ok(items)
    }

    /// Insert the demo items when the table is empty. Returns how many rows
    /// were added.
    pub async fn seed_if_empty(&self) -> StoreResult<usize> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let count: i64 = tx.query_row("SELECT COUNT(*) FROM todos", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(0);
        }
        for (title, completed) in DEMO_ITEMS {
            insert_item(&tx, title, completed)?;
        }
        tx.commit()?;
        Ok(DEMO_ITEMS.len())
    }
}

fn clean_title(title: &str) -> StoreResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StoreError::Validation("title must not be empty".to_string()));
    }
    Ok(title.to_string())
}

fn check_permutation(existing: &HashSet<i64>, ids: &[i64]) -> StoreResult<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !existing.contains(id) {
            return Err(StoreError::Validation(format!("unknown todo id {id}")));
        }
        if !seen.insert(*id) {
            return Err(StoreError::Validation(format!("duplicate todo id {id}")));
        }
    }
    if seen.len() != existing.len() {
        return Err(StoreError::Validation(format!(
            "expected all {} todo ids, got {}",
            existing.len(),
            seen.len()
        )));
    }
    Ok(())
}

fn insert_item(conn: &Connection, title: &str, completed: bool) -> StoreResult<Item> {
    let order: i64 = conn.query_row(
        r#"SELECT COALESCE(MAX("order") + 1, 0) FROM todos"#,
        [],
        |row| row.get(0),
    )?;
    conn.execute(
        r#"INSERT INTO todos (title, completed, "order") VALUES (?1, ?2, ?3)"#,
        params![title, completed, order],
    )?;
    Ok(Item {
        id: conn.last_insert_rowid(),
        title: title.to_string(),
        completed,
        order,
    })
}

fn find_item(conn: &Connection, id: i64) -> StoreResult<Option<Item>> {
    let sql = format!("{SELECT_ITEM} WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], row_to_item).optional()?)
}

fn list_items(conn: &Connection) -> StoreResult<Vec<Item>> {
    let sql = format!(r#"{SELECT_ITEM} ORDER BY "order", id"#);
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt.query_map([], row_to_item)?;
    Ok(items.collect::<Result<_, _>>()?)
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        title: row.get(1)?,
        completed: row.get(2)?,
        order: row.get(3)?,
    })
}
