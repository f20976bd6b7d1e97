//! Request payloads and response projections of the services.
//!
//! # Design
//! Identifiers that arrive straight from a client (a list id in a create
//! payload, the ids of a bulk move) are kept as strings so the services can
//! reject malformed values with a `BadRequest` before touching storage.
//! Path identifiers are typed `Uuid`s; the transport parses those.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::entity::{Priority, Todo, TodoList};

/// Payload for registering a user. The credential hash is produced by the
/// authentication layer and stored as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub credential_hash: String,
    pub display_name: String,
}

/// Payload for creating a todo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub list_id: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Payload for updating a todo. Only the fields present are applied;
/// omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// `Some(Some(at))` sets the due date, `Some(None)` (JSON `null`)
    /// clears it, `None` leaves it unchanged.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Payload for moving several todos at once. `list_id: None` moves them out
/// of any list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveTodos {
    pub todo_ids: Vec<String>,
    #[serde(default)]
    pub list_id: Option<String>,
}

/// One page of a user's todos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPage {
    pub todos: Vec<Todo>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// A list together with its live todos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListWithTodos {
    pub list: TodoList,
    pub todos: Vec<Todo>,
}

/// All of a user's lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCollection {
    pub lists: Vec<TodoList>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    pub list_id: Uuid,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResult {
    pub moved: usize,
}

/// A field that is present, even as `null`, becomes `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
