//! Presentation state for a todo board.
//!
//! A `Board` turns user gestures (click, drag, edit keystrokes, delete with
//! confirmation) into [`TodoList`] calls and renders the list as text cards.
//! It owns no data of its own beyond what the user is in the middle of doing.

use std::fmt::Write as _;

use crate::http::Transport;
use crate::list::{Reconcile, TodoList};
use crate::types::{Todo, UpdateTodo};

/// What the user is editing. At most one item at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Editing {
    #[default]
    Idle,
    Item { id: i64, draft: String },
}

/// Keystrokes that finish an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
}

/// Move the element at `from` to `to`, shifting the ones in between.
/// `None` when either index is out of bounds.
pub fn move_item<T: Clone>(items: &[T], from: usize, to: usize) -> Option<Vec<T>> {
    if from >= items.len() || to >= items.len() {
        return None;
    }
    let mut moved = items.to_vec();
    let item = moved.remove(from);
    moved.insert(to, item);
    Some(moved)
}

pub struct Board<T> {
    list: TodoList<T>,
    editing: Editing,
    confirm_delete: Option<i64>,
}

impl<T: Transport> Board<T> {
    pub fn new(list: TodoList<T>) -> Self {
        Self {
            list,
            editing: Editing::Idle,
            confirm_delete: None,
        }
    }

    pub fn list(&self) -> &TodoList<T> {
        &self.list
    }

    /// Hosts that run the fetch themselves use this for
    /// [`TodoList::begin_fetch`] and [`TodoList::finish_fetch`].
    pub fn list_mut(&mut self) -> &mut TodoList<T> {
        &mut self.list
    }

    pub fn editing(&self) -> &Editing {
        &self.editing
    }

    pub fn pending_delete(&self) -> Option<i64> {
        self.confirm_delete
    }

    pub fn load(&mut self) -> bool {
        self.list.fetch()
    }

    pub fn add(&mut self, title: &str) -> bool {
        self.list.create(title)
    }

    /// A click on a card body toggles completion, except on the card that is
    /// being edited.
    pub fn click(&mut self, id: i64) -> bool {
        if matches!(self.editing, Editing::Item { id: editing, .. } if editing == id) {
            return false;
        }
        self.list.toggle(id)
    }

    /// Start editing `id`, abandoning any other edit in progress.
    pub fn begin_edit(&mut self, id: i64) -> bool {
        let Some(draft) = self.find(id).map(|t| t.title.clone()) else {
            return false;
        };
        self.editing = Editing::Item { id, draft };
        true
    }

    pub fn set_draft(&mut self, text: &str) -> bool {
        match &mut self.editing {
            Editing::Item { draft, .. } => {
                *draft = text.to_string();
                true
            }
            Editing::Idle => false,
        }
    }

    /// Submit the draft. An unchanged title closes the editor without a
    /// request; a failed update keeps the editor open.
    pub fn save_edit(&mut self) -> bool {
        let Editing::Item { id, draft } = &self.editing else {
            return false;
        };
        let (id, title) = (*id, draft.trim().to_string());

        if self.find(id).is_some_and(|t| t.title == title) {
            self.editing = Editing::Idle;
            return true;
        }
        let input = UpdateTodo {
            title: Some(title),
            completed: None,
        };
        let saved = self.list.update(id, &input);
        if saved {
            self.editing = Editing::Idle;
        }
        saved
    }

    pub fn cancel_edit(&mut self) {
        self.editing = Editing::Idle;
    }

    pub fn key(&mut self, key: Key) -> bool {
        match key {
            Key::Enter => self.save_edit(),
            Key::Escape => {
                self.cancel_edit();
                true
            }
        }
    }

    /// Ask for confirmation before deleting `id`.
    pub fn request_delete(&mut self, id: i64) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        self.confirm_delete = Some(id);
        true
    }

    pub fn confirm_delete(&mut self) -> bool {
        let Some(id) = self.confirm_delete.take() else {
            return false;
        };
        let deleted = self.list.delete(id);
        if deleted && matches!(self.editing, Editing::Item { id: editing, .. } if editing == id) {
            self.editing = Editing::Idle;
        }
        deleted
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_delete = None;
    }

    /// Drop the card at index `from` onto index `to`.
    pub fn drag(&mut self, from: usize, to: usize) -> Option<Reconcile> {
        if from == to {
            return None;
        }
        let new_order = move_item(self.list.items(), from, to)?;
        Some(self.list.reorder(new_order))
    }

    /// One line per card in display order, then any prompt or error.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let items = self.list.items();
        if self.list.is_loading() {
            out.push_str("Loading...\n");
        } else if items.is_empty() {
            out.push_str("No todos yet.\n");
        }
        for (position, todo) in items.iter().enumerate() {
            let mark = if todo.completed { 'x' } else { ' ' };
            let _ = match &self.editing {
                Editing::Item { id, draft } if *id == todo.id => writeln!(
                    out,
                    "{:>3}. [{mark}] {draft}_  (editing #{})",
                    position + 1,
                    todo.id
                ),
                _ => writeln!(out, "{:>3}. [{mark}] {}  #{}", position + 1, todo.title, todo.id),
            };
        }
        if let Some(todo) = self.confirm_delete.and_then(|id| self.find(id)) {
            let _ = writeln!(out, "Delete \"{}\"? (y/N)", todo.title);
        }
        if let Some(error) = self.list.error() {
            let _ = writeln!(out, "! {error}");
        }
        out
    }

    fn find(&self, id: i64) -> Option<&Todo> {
        self.list.items().iter().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TodoClient;
    use crate::http::HttpResponse;
    use crate::list::testing::{json, todo, Scripted};

    fn board(items: &[Todo], then: impl FnOnce(Scripted) -> Scripted) -> Board<Scripted> {
        let transport = then(Scripted::default().reply(200, &json(items)));
        let mut board = Board::new(TodoList::new(TodoClient::new("http://test"), transport));
        assert!(board.load());
        board
    }

    fn two() -> [Todo; 2] {
        [todo(1, "buy milk", false, 0), todo(2, "buy eggs", false, 1)]
    }

    #[test]
    fn move_item_shifts_neighbours() {
        let items = ['a', 'b', 'c', 'd'];
        assert_eq!(move_item(&items, 0, 2), Some(vec!['b', 'c', 'a', 'd']));
        assert_eq!(move_item(&items, 3, 1), Some(vec!['a', 'd', 'b', 'c']));
        assert_eq!(move_item(&items, 1, 1), Some(items.to_vec()));
        assert_eq!(move_item(&items, 4, 0), None);
    }

    #[test]
    fn click_toggles_unless_card_is_being_edited() {
        let flipped = todo(1, "buy milk", true, 0);
        let mut board = board(&two(), |s| s.reply(200, &serde_json::to_string(&flipped).unwrap()));

        assert!(board.begin_edit(1));
        assert!(!board.click(1));
        board.cancel_edit();
        assert!(board.click(1));
        assert!(board.list().items()[0].completed);
    }

    #[test]
    fn only_one_item_edited_at_a_time() {
        let mut board = board(&two(), |s| s);
        assert!(board.begin_edit(1));
        assert!(board.begin_edit(2));
        assert_eq!(
            board.editing(),
            &Editing::Item {
                id: 2,
                draft: "buy eggs".into()
            }
        );
        assert!(!board.begin_edit(99));
    }

    #[test]
    fn enter_saves_draft_and_escape_discards() {
        let renamed = todo(1, "buy oat milk", false, 0);
        let mut board = board(&two(), |s| s.reply(200, &serde_json::to_string(&renamed).unwrap()));

        board.begin_edit(2);
        board.set_draft("something else");
        assert!(board.key(Key::Escape));
        assert_eq!(board.editing(), &Editing::Idle);
        assert_eq!(board.list().items()[1].title, "buy eggs");

        board.begin_edit(1);
        board.set_draft(" buy oat milk ");
        assert!(board.key(Key::Enter));
        assert_eq!(board.editing(), &Editing::Idle);
        assert_eq!(board.list().items()[0], renamed);
        let body = board.list().transport().requests.borrow()[1].body.clone();
        assert_eq!(body.as_deref(), Some(r#"{"title":"buy oat milk"}"#));
    }

    #[test]
    fn unchanged_draft_closes_without_request() {
        let mut board = board(&two(), |s| s);
        board.begin_edit(1);
        assert!(board.save_edit());
        assert_eq!(board.list().transport().requests.borrow().len(), 1);
    }

    #[test]
    fn failed_save_keeps_editor_open() {
        let mut board = board(&two(), |s| s.reply(422, r#"{"detail":"title must not be empty"}"#));
        board.begin_edit(1);
        board.set_draft("   ");
        assert!(!board.save_edit());
        assert!(matches!(board.editing(), Editing::Item { id: 1, .. }));
        assert!(board.render().contains("! Failed to update todo: title must not be empty"));
    }

    #[test]
    fn set_draft_needs_an_open_editor() {
        let mut board = board(&two(), |s| s);
        assert!(!board.set_draft("orphan"));
        assert_eq!(board.editing(), &Editing::Idle);
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut board = board(&two(), |s| s.reply(204, ""));

        assert!(board.request_delete(1));
        assert!(board.render().contains("Delete \"buy milk\"? (y/N)"));
        board.cancel_delete();
        assert!(!board.confirm_delete());
        assert_eq!(board.list().items().len(), 2);

        board.begin_edit(1);
        assert!(board.request_delete(1));
        assert!(board.confirm_delete());
        assert_eq!(board.list().items(), &[todo(2, "buy eggs", false, 1)]);
        assert_eq!(board.editing(), &Editing::Idle);
    }

    #[test]
    fn drag_submits_moved_permutation() {
        let [milk, eggs] = two();
        let reordered = [todo(2, "buy eggs", false, 0), todo(1, "buy milk", false, 1)];
        let mut board = board(&[milk, eggs], |s| s.reply(200, &json(&reordered)));

        assert_eq!(board.drag(0, 0), None);
        assert_eq!(board.drag(0, 5), None);
        assert_eq!(board.drag(1, 0), Some(Reconcile::Committed));
        assert_eq!(board.list().items(), &reordered);
        let body = board.list().transport().requests.borrow()[1].body.clone();
        assert_eq!(body.as_deref(), Some(r#"{"todo_ids":[2,1]}"#));
    }

    #[test]
    fn render_lists_cards_in_order() {
        let items = [todo(4, "walk dog", true, 0), todo(2, "feed cat", false, 1)];
        let mut board = board(&items, |s| s);
        assert_eq!(
            board.render(),
            "  1. [x] walk dog  #4\n  2. [ ] feed cat  #2\n"
        );

        board.begin_edit(2);
        board.set_draft("feed both cats");
        assert!(board.render().contains("  2. [ ] feed both cats_  (editing #2)"));
    }

    #[test]
    fn render_empty_board() {
        let board = board(&[], |s| s);
        assert_eq!(board.render(), "No todos yet.\n");
    }

    #[test]
    fn render_shows_loading_until_the_list_arrives() {
        let items = [todo(4, "walk dog", false, 0)];
        let mut board = board(&items, |s| s);

        board.list_mut().begin_fetch();
        assert_eq!(board.render(), "Loading...\n  1. [ ] walk dog  #4\n");

        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: json(&[]),
        };
        assert!(board.list_mut().finish_fetch(Ok(response)));
        assert_eq!(board.render(), "No todos yet.\n");
    }
}
