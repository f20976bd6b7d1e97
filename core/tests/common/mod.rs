//! Shared fixtures for the service integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use todo_core::repository::RepoResult;
use todo_core::{
    CreateTodo, MemoryStore, RegisterUser, RepoError, ShareTokenCodec, Todo, TodoListService,
    TodoRepository, TodoService, UserService,
};
use uuid::Uuid;

pub const SECRET: &str = "integration-test-secret";

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub users: UserService,
    pub todos: TodoService,
    pub lists: TodoListService,
}

impl Fixture {
    pub fn new() -> Self {
        Self::new_with_store(Arc::new(MemoryStore::new()))
    }

    pub fn new_with_store(store: Arc<MemoryStore>) -> Self {
        Self::with_todo_repo(store.clone(), store)
    }

    /// Wire the services to `store`, except that todo storage goes through
    /// `todos`.
    pub fn with_todo_repo(store: Arc<MemoryStore>, todos: Arc<dyn TodoRepository>) -> Self {
        let codec = ShareTokenCodec::new(SECRET).unwrap();
        Self {
            users: UserService::new(store.clone()),
            todos: TodoService::new(todos.clone(), store.clone()),
            lists: TodoListService::new(store.clone(), todos, codec),
            store,
        }
    }

    pub fn user(&self, name: &str) -> Uuid {
        self.users
            .register(RegisterUser {
                username: name.to_string(),
                email: format!("{name}@example.com"),
                credential_hash: "hash".to_string(),
                display_name: name.to_string(),
            })
            .unwrap()
            .id
    }

    pub fn todo(&self, user_id: Uuid, title: &str) -> Todo {
        self.todos.create(user_id, create(title)).unwrap()
    }

    pub fn todo_in(&self, user_id: Uuid, list_id: Uuid, title: &str) -> Todo {
        let input = CreateTodo {
            list_id: Some(list_id.to_string()),
            ..create(title)
        };
        self.todos.create(user_id, input).unwrap()
    }
}

pub fn create(title: &str) -> CreateTodo {
    CreateTodo {
        title: title.to_string(),
        ..Default::default()
    }
}

/// Todo repository that delegates to a [`MemoryStore`] but fails every
/// `create` after the first `allowed_creates`, and optionally every
/// `soft_delete`.
pub struct FlakyTodos {
    inner: Arc<MemoryStore>,
    allowed_creates: usize,
    creates: AtomicUsize,
    fail_deletes: bool,
}

impl FlakyTodos {
    pub fn new(inner: Arc<MemoryStore>, allowed_creates: usize) -> Self {
        Self {
            inner,
            allowed_creates,
            creates: AtomicUsize::new(0),
            fail_deletes: false,
        }
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    fn unavailable() -> RepoError {
        RepoError::Unavailable("injected failure".to_string())
    }
}

impl TodoRepository for FlakyTodos {
    fn create(&self, todo: &Todo) -> RepoResult<()> {
        if self.creates.fetch_add(1, Ordering::SeqCst) >= self.allowed_creates {
            return Err(Self::unavailable());
        }
        TodoRepository::create(self.inner.as_ref(), todo)
    }

    fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Todo>> {
        TodoRepository::find_by_id(self.inner.as_ref(), id)
    }

    fn find_by_owner(&self, owner_id: Uuid, offset: usize, limit: usize) -> RepoResult<Vec<Todo>> {
        TodoRepository::find_by_owner(self.inner.as_ref(), owner_id, offset, limit)
    }

    fn count_by_owner(&self, owner_id: Uuid) -> RepoResult<usize> {
        self.inner.count_by_owner(owner_id)
    }

    fn find_by_list_id(&self, list_id: Uuid) -> RepoResult<Vec<Todo>> {
        self.inner.find_by_list_id(list_id)
    }

    fn update(&self, todo: &Todo) -> RepoResult<()> {
        TodoRepository::update(self.inner.as_ref(), todo)
    }

    fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> RepoResult<()> {
        if self.fail_deletes {
            return Err(Self::unavailable());
        }
        TodoRepository::soft_delete(self.inner.as_ref(), id, at)
    }

    fn soft_delete_by_list_id(&self, list_id: Uuid, at: DateTime<Utc>) -> RepoResult<usize> {
        self.inner.soft_delete_by_list_id(list_id, at)
    }

    fn reassign_list_id(
        &self,
        todo_ids: &[Uuid],
        list_id: Option<Uuid>,
        owner_id: Uuid,
        at: DateTime<Utc>,
    ) -> RepoResult<usize> {
        self.inner.reassign_list_id(todo_ids, list_id, owner_id, at)
    }
}
