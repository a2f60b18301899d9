//! Client-side mirror of the server's todo list.
//!
//! # Design
//! `TodoList` keeps the last list the server reported, a loading flag and a
//! single error message. Every operation goes through a host [`Transport`]
//! and reports success as a `bool`; failures are logged, turned into a
//! message for the user and never returned as `Err`.
//!
//! Only reordering is optimistic. [`TodoList::apply_reorder`] installs the
//! new order immediately and remembers the last confirmed list;
//! [`TodoList::reconcile_reorder`] then either adopts the server's answer or
//! restores the confirmed list and refetches.

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::{CreateTodo, ReorderTodos, Todo, UpdateTodo};

/// Progress of a speculative reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconcile {
    /// The new order is shown but not confirmed. `confirmed` is the list as
    /// the server last reported it.
    Pending { confirmed: Vec<Todo> },
    /// The server accepted the order; the list now holds its response.
    Committed,
    /// The server call failed; the speculative order was discarded and the
    /// list re-read.
    RolledBack,
}

pub struct TodoList<T> {
    client: TodoClient,
    transport: T,
    items: Vec<Todo>,
    loading: bool,
    error: Option<String>,
    reorder: Option<Reconcile>,
}

impl<T: Transport> TodoList<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self {
            client,
            transport,
            items: Vec::new(),
            loading: false,
            error: None,
            reorder: None,
        }
    }

    pub fn items(&self) -> &[Todo] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// State of the most recent reorder, if any was started.
    pub fn reorder_state(&self) -> Option<&Reconcile> {
        self.reorder.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Replace the list with the server's.
    pub fn fetch(&mut self) -> bool {
        let request = self.begin_fetch();
        let response = self.transport.execute(request);
        self.finish_fetch(response)
    }

    /// First half of [`TodoList::fetch`]: mark the list as loading and build
    /// the request. `is_loading` stays true until [`TodoList::finish_fetch`].
    pub fn begin_fetch(&mut self) -> HttpRequest {
        self.loading = true;
        self.client.build_list_todos()
    }

    /// Second half of [`TodoList::fetch`]: apply the list response and clear
    /// the loading flag.
    pub fn finish_fetch(&mut self, response: Result<HttpResponse, ApiError>) -> bool {
        let result = response.and_then(|resp| self.client.parse_list_todos(resp));
        self.loading = false;

        match result {
            Ok(items) => {
                tracing::debug!(count = items.len(), "fetched todos");
                self.items = items;
                self.error = None;
                true
            }
            Err(err) => self.fail("Failed to load todos", err),
        }
    }

    /// Create a todo and append the server's copy. Blank titles are refused
    /// without a request.
    pub fn create(&mut self, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            tracing::debug!("refusing to create a todo with a blank title");
            self.error = Some("Title cannot be empty".to_string());
            return false;
        }
        let input = CreateTodo {
            title: title.to_string(),
        };
        let result = self
            .client
            .build_create_todo(&input)
            .and_then(|req| self.transport.execute(req))
            .and_then(|resp| self.client.parse_create_todo(resp));

        match result {
            Ok(todo) => {
                self.items.push(todo);
                true
            }
            Err(err) => self.fail("Failed to add todo", err),
        }
    }

    pub fn update(&mut self, id: i64, input: &UpdateTodo) -> bool {
        let result = self
            .client
            .build_update_todo(id, input)
            .and_then(|req| self.transport.execute(req))
            .and_then(|resp| self.client.parse_update_todo(resp));
        self.replace_with(result, "Failed to update todo")
    }

    pub fn toggle(&mut self, id: i64) -> bool {
        let request = self.client.build_toggle_todo(id);
        let result = self
            .transport
            .execute(request)
            .and_then(|resp| self.client.parse_toggle_todo(resp));
        self.replace_with(result, "Failed to update todo")
    }

    pub fn delete(&mut self, id: i64) -> bool {
        let request = self.client.build_delete_todo(id);
        let result = self
            .transport
            .execute(request)
            .and_then(|resp| self.client.parse_delete_todo(resp));

        match result {
            Ok(()) => {
                self.items.retain(|t| t.id != id);
                true
            }
            Err(err) => self.fail("Failed to delete todo", err),
        }
    }

    /// Show `new_order` immediately, submit it, then reconcile.
    pub fn reorder(&mut self, new_order: Vec<Todo>) -> Reconcile {
        let response = self
            .apply_reorder(new_order)
            .and_then(|req| self.transport.execute(req));
        self.reconcile_reorder(response)
    }

    /// First half of [`TodoList::reorder`]: install the speculative order and
    /// build the request that confirms it.
    ///
    /// A reorder applied while another is still pending keeps the original
    /// confirmed list, so a rollback never lands on a speculative order.
    pub fn apply_reorder(&mut self, new_order: Vec<Todo>) -> Result<HttpRequest, ApiError> {
        let request = self
            .client
            .build_reorder_todos(&ReorderTodos::from_todos(&new_order));
        let shown = std::mem::replace(&mut self.items, new_order);
        let confirmed = match self.reorder.take() {
            Some(Reconcile::Pending { confirmed }) => confirmed,
            _ => shown,
        };
        self.reorder = Some(Reconcile::Pending { confirmed });
        request
    }

    /// Second half of [`TodoList::reorder`]: settle a pending reorder with
    /// the outcome of its request.
    pub fn reconcile_reorder(&mut self, response: Result<HttpResponse, ApiError>) -> Reconcile {
        let confirmed = match self.reorder.take() {
            Some(Reconcile::Pending { confirmed }) => confirmed,
            _ => {
                tracing::warn!("reorder response arrived with no reorder pending");
                self.items.clone()
            }
        };

        let result = response.and_then(|resp| self.client.parse_reorder_todos(resp));
        let outcome = match result {
            Ok(items) => {
                if items != self.items {
                    tracing::debug!("server order differs from the optimistic one");
                }
                self.items = items;
                Reconcile::Committed
            }
            Err(err) => {
                tracing::warn!(error = %err, "reorder failed, resynchronising");
                self.items = confirmed;
                self.fetch();
                self.error = Some(user_message("Failed to reorder todos", &err));
                Reconcile::RolledBack
            }
        };
        self.reorder = Some(outcome.clone());
        outcome
    }

    fn replace_with(&mut self, result: Result<Todo, ApiError>, action: &str) -> bool {
        match result {
            Ok(todo) => {
                if let Some(slot) = self.items.iter_mut().find(|t| t.id == todo.id) {
                    *slot = todo;
                }
                true
            }
            Err(err) => self.fail(action, err),
        }
    }

    fn fail(&mut self, action: &str, err: ApiError) -> bool {
        tracing::warn!(error = %err, "{action}");
        self.error = Some(user_message(action, &err));
        false
    }
}

fn user_message(action: &str, err: &ApiError) -> String {
    match err {
        ApiError::Rejected(detail) => format!("{action}: {detail}"),
        ApiError::NotFound => format!("{action}: it no longer exists"),
        _ => action.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn list(transport: Scripted) -> TodoList<Scripted> {
        TodoList::new(TodoClient::new("http://test"), transport)
    }

    fn loaded(items: &[Todo], then: impl FnOnce(Scripted) -> Scripted) -> TodoList<Scripted> {
        let mut list = list(then(Scripted::default().reply(200, &json(items))));
        assert!(list.fetch());
        list
    }

    #[test]
    fn fetch_replaces_items_and_clears_error() {
        let items = [todo(1, "a", false, 0), todo(2, "b", true, 1)];
        let mut list = list(Scripted::default().unreachable().reply(200, &json(&items)));

        assert!(!list.fetch());
        assert_eq!(list.error(), Some("Failed to load todos"));
        assert!(!list.is_loading());

        assert!(list.fetch());
        assert_eq!(list.items(), &items);
        assert_eq!(list.error(), None);
    }

    #[test]
    fn loading_holds_between_request_and_response() {
        let items = [todo(1, "a", false, 0)];
        let mut list = list(Scripted::default());
        assert!(!list.is_loading());

        let request = list.begin_fetch();
        assert_eq!(request.path, "http://test/todos/");
        assert!(list.is_loading());

        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: json(&items),
        };
        assert!(list.finish_fetch(Ok(response)));
        assert!(!list.is_loading());
        assert_eq!(list.items(), &items);
    }

    #[test]
    fn failed_fetch_also_clears_loading() {
        let mut list = list(Scripted::default());
        list.begin_fetch();
        assert!(!list.finish_fetch(Err(ApiError::Transport("timed out".into()))));
        assert!(!list.is_loading());
        assert_eq!(list.error(), Some("Failed to load todos"));
    }

    #[test]
    fn create_blank_title_never_reaches_network() {
        let mut list = list(Scripted::default());
        assert!(!list.create("   "));
        assert_eq!(list.error(), Some("Title cannot be empty"));
        assert!(list.transport().requests.borrow().is_empty());
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn create_blank_title_is_logged() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut list = list(Scripted::default());
            assert!(!list.create(""));
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("refusing to create a todo with a blank title"), "{output}");
    }

    #[test]
    fn create_appends_server_copy() {
        let created = todo(9, "buy milk", false, 4);
        let mut list = loaded(&[], |s| {
            s.reply(201, &serde_json::to_string(&created).unwrap())
        });

        assert!(list.create("  buy milk "));
        assert_eq!(list.items(), &[created]);
        let sent = list.transport().requests.borrow()[1].body.clone().unwrap();
        assert_eq!(sent, r#"{"title":"buy milk"}"#);
    }

    #[test]
    fn failed_create_leaves_list_untouched() {
        let mut list = loaded(&[todo(1, "a", false, 0)], |s| s.reply(500, "boom"));
        assert!(!list.create("b"));
        assert_eq!(list.items().len(), 1);
        assert_eq!(list.error(), Some("Failed to add todo"));
    }

    #[test]
    fn toggle_replaces_matching_item_only() {
        let flipped = todo(2, "b", true, 1);
        let mut list = loaded(&[todo(1, "a", false, 0), todo(2, "b", false, 1)], |s| {
            s.reply(200, &serde_json::to_string(&flipped).unwrap())
        });

        assert!(list.toggle(2));
        assert_eq!(list.items()[1], flipped);
        assert!(!list.items()[0].completed);
        assert_eq!(list.transport().paths()[1], "PATCH http://test/todos/2/toggle");
    }

    #[test]
    fn update_not_found_reports_and_keeps_item() {
        let mut list = loaded(&[todo(1, "a", false, 0)], |s| s.reply(404, ""));
        let input = UpdateTodo {
            title: Some("z".into()),
            completed: None,
        };
        assert!(!list.update(1, &input));
        assert_eq!(list.items()[0].title, "a");
        assert_eq!(list.error(), Some("Failed to update todo: it no longer exists"));
    }

    #[test]
    fn delete_removes_by_id() {
        let mut list = loaded(&[todo(1, "a", false, 0), todo(2, "b", false, 1)], |s| {
            s.reply(204, "")
        });
        assert!(list.delete(1));
        assert_eq!(list.items(), &[todo(2, "b", false, 1)]);
    }

    #[test]
    fn reorder_is_visible_before_the_server_answers() {
        let a = todo(1, "a", false, 0);
        let b = todo(2, "b", false, 1);
        let mut list = loaded(&[a.clone(), b.clone()], |s| s);

        let request = list.apply_reorder(vec![b.clone(), a.clone()]).unwrap();
        assert_eq!(request.body.as_deref(), Some(r#"{"todo_ids":[2,1]}"#));
        assert_eq!(list.items(), &[b.clone(), a.clone()]);
        assert_eq!(
            list.reorder_state(),
            Some(&Reconcile::Pending {
                confirmed: vec![a, b]
            })
        );
    }

    #[test]
    fn reorder_commits_server_order() {
        let a = todo(1, "a", false, 0);
        let b = todo(2, "b", false, 1);
        let canonical = [todo(2, "b", false, 0), todo(1, "a", false, 1)];
        let mut list = loaded(&[a.clone(), b.clone()], |s| s.reply(200, &json(&canonical)));

        assert_eq!(list.reorder(vec![b, a]), Reconcile::Committed);
        assert_eq!(list.items(), &canonical);
        assert_eq!(list.reorder_state(), Some(&Reconcile::Committed));
    }

    #[test]
    fn failed_reorder_rolls_back_to_server_order() {
        let a = todo(1, "a", false, 0);
        let b = todo(2, "b", false, 1);
        let server = [a.clone(), b.clone()];
        let mut list = loaded(&server, |s| s.unreachable().reply(200, &json(&server)));

        assert_eq!(list.reorder(vec![b, a]), Reconcile::RolledBack);
        assert_eq!(list.items(), &server);
        assert_eq!(list.error(), Some("Failed to reorder todos"));
        assert_eq!(
            list.transport().paths(),
            vec![
                "GET http://test/todos/",
                "POST http://test/todos/reorder",
                "GET http://test/todos/",
            ]
        );
    }

    #[test]
    fn overlapping_reorders_roll_back_to_server_order() {
        let server = [todo(1, "a", false, 0), todo(2, "b", false, 1), todo(3, "c", false, 2)];
        let [a, b, c] = server.clone();
        let mut list = loaded(&server, |s| s.unreachable());

        list.apply_reorder(vec![b.clone(), a.clone(), c.clone()]).unwrap();
        list.apply_reorder(vec![c.clone(), b.clone(), a.clone()]).unwrap();
        assert_eq!(list.items(), &[c, b, a]);
        assert_eq!(
            list.reorder_state(),
            Some(&Reconcile::Pending {
                confirmed: server.to_vec()
            })
        );

        let outcome = list.reconcile_reorder(Err(ApiError::Transport("connection reset".into())));
        assert_eq!(outcome, Reconcile::RolledBack);
        assert_eq!(list.items(), &server);
    }

    #[test]
    fn rejected_reorder_keeps_confirmed_order_when_refetch_also_fails() {
        let a = todo(1, "a", false, 0);
        let b = todo(2, "b", false, 1);
        let mut list = loaded(&[a.clone(), b.clone()], |s| {
            s.reply(422, r#"{"detail":"duplicate todo id 1"}"#).unreachable()
        });

        assert_eq!(list.reorder(vec![a.clone(), a.clone()]), Reconcile::RolledBack);
        assert_eq!(list.items(), &[a, b]);
        assert_eq!(
            list.error(),
            Some("Failed to reorder todos: duplicate todo id 1")
        );
    }
}
