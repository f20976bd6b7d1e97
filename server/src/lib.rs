//! HTTP transport over the todo service layer.
//!
//! Handlers bind paths, query strings and JSON bodies, resolve the caller
//! through [`auth::CurrentUser`], and hand everything to the services in
//! `todo_core`. No domain rule lives here.

pub mod auth;
pub mod config;
pub mod error;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use todo_core::{
    CreateTodo, ListCollection, ListWithTodos, MemoryStore, MoveResult, MoveTodos, RegisterUser,
    ShareLink, ShareTokenCodec, Todo, TodoList, TodoListService, TodoPage, TodoService,
    UpdateTodo, User, UserService, DEFAULT_PAGE_SIZE,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub todos: TodoService,
    pub lists: TodoListService,
}

impl AppState {
    /// Services wired to one process-local [`MemoryStore`].
    pub fn in_memory(codec: ShareTokenCodec) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: UserService::new(store.clone()),
            todos: TodoService::new(store.clone(), store.clone()),
            lists: TodoListService::new(store.clone(), store, codec),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/users", post(register))
        .route("/users/me", get(me).patch(update_me))
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/move", post(move_todos))
        .route("/todos/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .route("/todos/{id}/toggle", post(toggle_todo))
        .route("/lists", get(list_lists).post(create_list))
        .route("/lists/{id}", get(get_list).put(update_list).delete(delete_list))
        .route("/lists/{id}/duplicate", post(duplicate_list))
        .route("/lists/{id}/share", post(share_list))
        .route("/shared/{token}", post(import_list))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Deserialize)]
struct Pagination {
    page: Option<i64>,
    page_size: Option<i64>,
}

#[derive(Deserialize)]
struct CopyOptions {
    #[serde(default)]
    keep_completed: bool,
}

#[derive(Deserialize)]
struct ListName {
    name: String,
}

#[derive(Deserialize)]
struct ProfileUpdate {
    display_name: String,
}

// --- users ---

async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.users.register(input)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn me(State(state): State<AppState>, CurrentUser(user_id): CurrentUser) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get_by_id(user_id)?))
}

async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(input): Json<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.update_profile(user_id, input.display_name)?))
}

// --- todos ---

async fn list_todos(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(p): Query<Pagination>,
) -> ApiResult<Json<TodoPage>> {
    let page = p.page.unwrap_or(1);
    let page_size = p.page_size.unwrap_or(DEFAULT_PAGE_SIZE as i64);
    Ok(Json(state.todos.list(user_id, page, page_size)?))
}

async fn create_todo(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(input): Json<CreateTodo>,
) -> ApiResult<(StatusCode, Json<Todo>)> {
    let todo = state.todos.create(user_id, input)?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Todo>> {
    Ok(Json(state.todos.get_by_id(user_id, id)?))
}

async fn update_todo(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTodo>,
) -> ApiResult<Json<Todo>> {
    Ok(Json(state.todos.update(user_id, id, input)?))
}

async fn toggle_todo(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Todo>> {
    Ok(Json(state.todos.toggle_complete(user_id, id)?))
}

async fn delete_todo(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.todos.delete(user_id, id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn move_todos(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(input): Json<MoveTodos>,
) -> ApiResult<Json<MoveResult>> {
    Ok(Json(state.todos.move_todos(user_id, input)?))
}

// --- lists ---

async fn list_lists(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<ListCollection>> {
    Ok(Json(state.lists.list(user_id)?))
}

async fn create_list(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(input): Json<ListName>,
) -> ApiResult<(StatusCode, Json<TodoList>)> {
    let list = state.lists.create(user_id, input.name)?;
    Ok((StatusCode::CREATED, Json(list)))
}

async fn get_list(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ListWithTodos>> {
    Ok(Json(state.lists.get_by_id(user_id, id)?))
}

async fn update_list(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ListName>,
) -> ApiResult<Json<TodoList>> {
    Ok(Json(state.lists.update(user_id, id, input.name)?))
}

async fn delete_list(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.lists.delete(user_id, id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn duplicate_list(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Query(opts): Query<CopyOptions>,
) -> ApiResult<(StatusCode, Json<ListWithTodos>)> {
    let copy = state.lists.duplicate(user_id, id, opts.keep_completed)?;
    Ok((StatusCode::CREATED, Json(copy)))
}

async fn share_list(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ShareLink>> {
    Ok(Json(state.lists.generate_share_link(user_id, id)?))
}

async fn import_list(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(token): Path<String>,
    Query(opts): Query<CopyOptions>,
) -> ApiResult<(StatusCode, Json<ListWithTodos>)> {
    let copy = state
        .lists
        .import_shared_list(user_id, &token, opts.keep_completed)?;
    Ok((StatusCode::CREATED, Json(copy)))
}
