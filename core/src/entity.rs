//! Persistent records owned by users.
//!
//! # Design
//! Entities are plain data with a handful of state-transition helpers. Every
//! helper takes the caller's `now` instead of reading the clock itself, so a
//! service method stamps all rows it touches with one consistent instant.
//! Deletion is soft: `deleted_at` is set and repositories treat the row as
//! absent from then on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Urgency of a todo item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// An account. Username and email are unique among non-deleted users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub credential_hash: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(
        username: String,
        email: String,
        credential_hash: String,
        display_name: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            credential_hash,
            display_name,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn update_profile(&mut self, display_name: String, now: DateTime<Utc>) {
        self.display_name = display_name;
        self.updated_at = now;
    }

    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        self.deleted_at = Some(now);
        self.updated_at = now;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A named container for todos. The owner is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TodoList {
    pub fn new(owner_id: Uuid, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn rename(&mut self, name: String, now: DateTime<Utc>) {
        self.name = name;
        self.updated_at = now;
    }

    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        self.deleted_at = Some(now);
        self.updated_at = now;
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A task item.
///
/// `completed_at` is `Some` exactly when `completed` is true. The two fields
/// are only changed together through [`Todo::mark_complete`] and
/// [`Todo::mark_incomplete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// `None` means the todo is not in any list.
    pub list_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Todo {
    /// Build an incomplete todo owned by `owner_id`.
    pub fn new(
        owner_id: Uuid,
        list_id: Option<Uuid>,
        title: String,
        description: String,
        priority: Priority,
        due_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            list_id,
            title,
            description,
            priority,
            completed: false,
            completed_at: None,
            due_date,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Mark the todo complete as of `at`. Callers validate that `at` is not
    /// after `now`.
    pub fn mark_complete(&mut self, at: DateTime<Utc>, now: DateTime<Utc>) {
        self.completed = true;
        self.completed_at = Some(at);
        self.updated_at = now;
    }

    pub fn mark_incomplete(&mut self, now: DateTime<Utc>) {
        self.completed = false;
        self.completed_at = None;
        self.updated_at = now;
    }

    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        self.deleted_at = Some(now);
        self.updated_at = now;
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
