//! Storage contracts consumed by the services.
//!
//! # Design
//! Each call is assumed atomic on its own; nothing here spans several calls
//! in a transaction. Finders treat soft-deleted rows as absent. The traits
//! are object safe so services can hold `Arc<dyn ...>` and the wiring layer
//! picks the backend.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entity::{Todo, TodoList, User};
use crate::error::RepoError;

pub type RepoResult<T> = Result<T, RepoError>;

pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with [`RepoError::Conflict`] when the
    /// username or email is already used by a non-deleted user.
    fn create(&self, user: &User) -> RepoResult<()>;

    fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    /// Replace the stored row with `user`, including its `deleted_at`.
    fn update(&self, user: &User) -> RepoResult<()>;
}

pub trait TodoListRepository: Send + Sync {
    fn create(&self, list: &TodoList) -> RepoResult<()>;

    fn find_by_id(&self, id: Uuid) -> RepoResult<Option<TodoList>>;

    /// All live lists of `owner_id`, oldest first.
    fn find_by_owner(&self, owner_id: Uuid) -> RepoResult<Vec<TodoList>>;

    fn update(&self, list: &TodoList) -> RepoResult<()>;

    fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> RepoResult<()>;
}

pub trait TodoRepository: Send + Sync {
    fn create(&self, todo: &Todo) -> RepoResult<()>;

    fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Todo>>;

    /// A window of the live todos of `owner_id`, oldest first.
    fn find_by_owner(&self, owner_id: Uuid, offset: usize, limit: usize) -> RepoResult<Vec<Todo>>;

    fn count_by_owner(&self, owner_id: Uuid) -> RepoResult<usize>;

    /// All live todos whose `list_id` is `list_id`, oldest first.
    fn find_by_list_id(&self, list_id: Uuid) -> RepoResult<Vec<Todo>>;

    fn update(&self, todo: &Todo) -> RepoResult<()>;

    fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> RepoResult<()>;

    /// Soft-delete every live todo in `list_id`. Returns how many rows changed.
    fn soft_delete_by_list_id(&self, list_id: Uuid, at: DateTime<Utc>) -> RepoResult<usize>;

    /// Set `list_id` on every live todo in `todo_ids` owned by `owner_id`.
    /// Returns how many rows changed.
    fn reassign_list_id(
        &self,
        todo_ids: &[Uuid],
        list_id: Option<Uuid>,
        owner_id: Uuid,
        at: DateTime<Utc>,
    ) -> RepoResult<usize>;
}
