//! Per-user todo operations.
//!
//! # Design
//! The service is stateless: it holds only repository handles. Every method
//! takes the caller's already-resolved user id and checks ownership itself.
//! `NotFound` means the todo is absent or deleted; `Forbidden` means it
//! exists but belongs to someone else.
//!
//! `move_todos` has no transaction to lean on, so it loads and authorizes
//! every target before issuing the single bulk write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::entity::Todo;
use crate::error::{storage, Result, ServiceError};
use crate::repository::{TodoListRepository, TodoRepository};
use crate::types::{CreateTodo, MoveResult, MoveTodos, TodoPage, UpdateTodo};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Clone)]
pub struct TodoService {
    todos: Arc<dyn TodoRepository>,
    lists: Arc<dyn TodoListRepository>,
}

impl TodoService {
    pub fn new(todos: Arc<dyn TodoRepository>, lists: Arc<dyn TodoListRepository>) -> Self {
        Self { todos, lists }
    }

    /// Create a todo for `user_id`.
    ///
    /// A well-formed `list_id` that does not name one of the caller's lists
    /// is dropped and the todo is created outside any list.
    #[instrument(skip_all, fields(%user_id))]
    pub fn create(&self, user_id: Uuid, input: CreateTodo) -> Result<Todo> {
        let now = Utc::now();
        let requested_list = parse_optional_id(input.list_id.as_deref(), "invalid list id")?;
        let completed_at = if input.completed {
            Some(completion_time(input.completed_at, now)?)
        } else {
            None
        };

        let list_id = match requested_list {
            Some(list_id) => self.usable_list(user_id, list_id)?,
            None => None,
        };

        let mut todo = Todo::new(
            user_id,
            list_id,
            input.title,
            input.description,
            input.priority,
            input.due_date,
            now,
        );
        if let Some(at) = completed_at {
            todo.mark_complete(at, now);
        }

        self.todos.create(&todo).map_err(storage("creating todo"))?;
        info!(todo_id = %todo.id, list_id = ?todo.list_id, "todo created");
        Ok(todo)
    }

    pub fn get_by_id(&self, user_id: Uuid, todo_id: Uuid) -> Result<Todo> {
        debug!(%user_id, %todo_id, "loading todo");
        self.load_owned(user_id, todo_id)
    }

    /// One page of the caller's todos, oldest first.
    ///
    /// `page` below 1 becomes 1; a `page_size` outside `1..=MAX_PAGE_SIZE`
    /// becomes [`DEFAULT_PAGE_SIZE`].
    pub fn list(&self, user_id: Uuid, page: i64, page_size: i64) -> Result<TodoPage> {
        let page = usize::try_from(page).ok().filter(|p| *p >= 1).unwrap_or(1);
        let page_size = usize::try_from(page_size)
            .ok()
            .filter(|s| (1..=MAX_PAGE_SIZE).contains(s))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let total = self
            .todos
            .count_by_owner(user_id)
            .map_err(storage("counting todos"))?;
        let offset = (page - 1).saturating_mul(page_size);
        let todos = self
            .todos
            .find_by_owner(user_id, offset, page_size)
            .map_err(storage("listing todos"))?;

        debug!(%user_id, page, page_size, total, "listed todos");
        Ok(TodoPage {
            todos,
            total,
            page,
            page_size,
            total_pages: total.div_ceil(page_size),
        })
    }

    /// Apply the fields present in `input`.
    ///
    /// `completed: true` without `completed_at` stamps now. `completed: false`
    /// clears `completed_at`. A `completed_at` in the future is rejected
    /// whether or not it would be applied. `due_date: null` clears the due
    /// date.
    #[instrument(skip_all, fields(%user_id, %todo_id))]
    pub fn update(&self, user_id: Uuid, todo_id: Uuid, input: UpdateTodo) -> Result<Todo> {
        let now = Utc::now();
        let mut todo = self.load_owned(user_id, todo_id)?;

        // Validate before mutating anything. A supplied completed_at is
        // checked even when it ends up not being applied.
        let requested_at = input
            .completed_at
            .map(|at| completion_time(Some(at), now))
            .transpose()?;
        let completion = match input.completed {
            Some(true) => Some(Some(requested_at.unwrap_or(now))),
            Some(false) => Some(None),
            None => requested_at.filter(|_| todo.completed).map(Some),
        };

        if let Some(title) = input.title {
            todo.title = title;
        }
        if let Some(description) = input.description {
            todo.description = description;
        }
        if let Some(priority) = input.priority {
            todo.priority = priority;
        }
        if let Some(due_date) = input.due_date {
            todo.due_date = due_date;
        }
        match completion {
            Some(Some(at)) => todo.mark_complete(at, now),
            Some(None) => todo.mark_incomplete(now),
            None => {}
        }
        todo.updated_at = now;

        self.todos.update(&todo).map_err(storage("updating todo"))?;
        info!(completed = todo.completed, "todo updated");
        Ok(todo)
    }

    pub fn toggle_complete(&self, user_id: Uuid, todo_id: Uuid) -> Result<Todo> {
        let now = Utc::now();
        let mut todo = self.load_owned(user_id, todo_id)?;
        if todo.completed {
            todo.mark_incomplete(now);
        } else {
            todo.mark_complete(now, now);
        }
        self.todos.update(&todo).map_err(storage("toggling todo"))?;
        info!(%user_id, %todo_id, completed = todo.completed, "todo toggled");
        Ok(todo)
    }

    pub fn delete(&self, user_id: Uuid, todo_id: Uuid) -> Result<()> {
        self.load_owned(user_id, todo_id)?;
        self.todos
            .soft_delete(todo_id, Utc::now())
            .map_err(storage("deleting todo"))?;
        info!(%user_id, %todo_id, "todo deleted");
        Ok(())
    }

    /// Put every todo in `input.todo_ids` into `input.list_id`, or take them
    /// out of any list when it is absent.
    ///
    /// All targets are checked before the write. Missing todos are reported
    /// ahead of foreign ones; if any check fails nothing is modified.
    #[instrument(skip_all, fields(%user_id))]
    pub fn move_todos(&self, user_id: Uuid, input: MoveTodos) -> Result<MoveResult> {
        if input.todo_ids.is_empty() {
            return Err(ServiceError::bad_request("todo_ids must not be empty"));
        }
        let mut ids: Vec<Uuid> = Vec::with_capacity(input.todo_ids.len());
        for raw in &input.todo_ids {
            let id = parse_id(raw, "invalid todo id")?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        let target = parse_optional_id(input.list_id.as_deref(), "invalid list id")?;

        let mut found = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.todos.find_by_id(*id).map_err(storage("loading todo"))? {
                Some(todo) => found.push(todo),
                None => return Err(ServiceError::not_found(format!("todo {id} not found"))),
            }
        }
        if let Some(todo) = found.iter().find(|t| !t.is_owned_by(user_id)) {
            warn!(todo_id = %todo.id, "bulk move includes a todo owned by another user");
            return Err(ServiceError::forbidden(format!(
                "todo {} belongs to another user",
                todo.id
            )));
        }

        if let Some(list_id) = target {
            let list = self
                .lists
                .find_by_id(list_id)
                .map_err(storage("loading list"))?
                .ok_or_else(|| ServiceError::not_found("list not found"))?;
            if !list.is_owned_by(user_id) {
                warn!(%list_id, "bulk move into a list owned by another user");
                return Err(ServiceError::forbidden("you do not have access to this list"));
            }
        }

        let moved = self
            .todos
            .reassign_list_id(&ids, target, user_id, Utc::now())
            .map_err(storage("moving todos"))?;
        info!(moved, list_id = ?target, "todos moved");
        Ok(MoveResult { moved })
    }

    fn load_owned(&self, user_id: Uuid, todo_id: Uuid) -> Result<Todo> {
        let todo = self
            .todos
            .find_by_id(todo_id)
            .map_err(storage("loading todo"))?
            .ok_or_else(|| ServiceError::not_found("todo not found"))?;
        if !todo.is_owned_by(user_id) {
            warn!(%user_id, %todo_id, "todo access by non-owner");
            return Err(ServiceError::forbidden("you do not have access to this todo"));
        }
        Ok(todo)
    }

    /// `Some(list_id)` if it names a live list of `user_id`, otherwise `None`.
    fn usable_list(&self, user_id: Uuid, list_id: Uuid) -> Result<Option<Uuid>> {
        match self
            .lists
            .find_by_id(list_id)
            .map_err(storage("loading list"))?
        {
            Some(list) if list.is_owned_by(user_id) => Ok(Some(list.id)),
            _ => {
                debug!(%list_id, "list not usable, todo created without a list");
                Ok(None)
            }
        }
    }
}

/// Blank strings count as "no id".
fn parse_optional_id(raw: Option<&str>, msg: &'static str) -> Result<Option<Uuid>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_id(raw, msg).map(Some),
    }
}

fn parse_id(raw: &str, msg: &'static str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::bad_request(msg))
}

fn completion_time(requested: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    match requested {
        Some(at) if at > now => Err(ServiceError::bad_request(
            "completed_at cannot be in the future",
        )),
        Some(at) => Ok(at),
        None => Ok(now),
    }
}
