//! Domain service layer for a multi-tenant todo backend.
//!
//! # Overview
//! Users own todos, optionally grouped into named lists. The services in
//! this crate enforce ownership, the list-to-todo delete cascade, the
//! completed/completed_at coupling and all-or-nothing authorization for bulk
//! moves. Lists can be shared through stateless signed tokens.
//!
//! # Design
//! - The services are stateless and synchronous. All state lives behind the
//!   [`repository`] traits, which the caller wires to a backend
//!   ([`memory::MemoryStore`] ships with the crate).
//! - Identity is resolved upstream; every service method takes the caller's
//!   user id as an explicit argument.
//! - Every public service method returns [`ServiceError`]; callers branch on
//!   [`ErrorKind`].

pub mod entity;
pub mod error;
pub mod list_service;
pub mod memory;
pub mod repository;
pub mod share;
pub mod todo_service;
pub mod types;
pub mod user_service;

pub use entity::{Priority, Todo, TodoList, User};
pub use error::{ErrorKind, RepoError, ServiceError};
pub use list_service::TodoListService;
pub use memory::MemoryStore;
pub use repository::{TodoListRepository, TodoRepository, UserRepository};
pub use share::{ShareSecretError, ShareTokenCodec, ShareTokenError};
pub use todo_service::{TodoService, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use types::{
    CreateTodo, ListCollection, ListWithTodos, MoveResult, MoveTodos, RegisterUser, ShareLink,
    TodoPage, UpdateTodo,
};
pub use user_service::UserService;
