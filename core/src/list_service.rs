//! Todo-list operations: CRUD, cascading delete, duplication and sharing.
//!
//! # Design
//! Sharing is capability based. The owner mints a [`ShareTokenCodec`] token
//! for a list; whoever presents it may import a copy into their own account.
//! No invitation is stored and the import grants no access to the original.
//!
//! Duplicate and import write one list and then one todo per source todo.
//! Storage offers no multi-call transaction, so when a copy fails part way
//! the rows already written are soft-deleted again before the error is
//! returned. That cleanup is best effort: if it fails too, the leftovers stay
//! and are logged.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::entity::{Todo, TodoList};
use crate::error::{storage, Result, ServiceError};
use crate::repository::{TodoListRepository, TodoRepository};
use crate::share::ShareTokenCodec;
use crate::types::{ListCollection, ListWithTodos, ShareLink};

#[derive(Clone)]
pub struct TodoListService {
    lists: Arc<dyn TodoListRepository>,
    todos: Arc<dyn TodoRepository>,
    tokens: ShareTokenCodec,
}

impl TodoListService {
    pub fn new(
        lists: Arc<dyn TodoListRepository>,
        todos: Arc<dyn TodoRepository>,
        tokens: ShareTokenCodec,
    ) -> Self {
        Self {
            lists,
            todos,
            tokens,
        }
    }

    pub fn create(&self, user_id: Uuid, name: String) -> Result<TodoList> {
        let list = TodoList::new(user_id, name, Utc::now());
        self.lists.create(&list).map_err(storage("creating list"))?;
        info!(%user_id, list_id = %list.id, "list created");
        Ok(list)
    }

    /// The list and its live todos.
    pub fn get_by_id(&self, user_id: Uuid, list_id: Uuid) -> Result<ListWithTodos> {
        let list = self.load_owned(user_id, list_id)?;
        let todos = self
            .todos
            .find_by_list_id(list.id)
            .map_err(storage("loading list todos"))?;
        debug!(%user_id, %list_id, todos = todos.len(), "loaded list");
        Ok(ListWithTodos { list, todos })
    }

    pub fn list(&self, user_id: Uuid) -> Result<ListCollection> {
        let lists = self
            .lists
            .find_by_owner(user_id)
            .map_err(storage("listing lists"))?;
        let count = lists.len();
        debug!(%user_id, count, "listed lists");
        Ok(ListCollection { lists, count })
    }

    pub fn update(&self, user_id: Uuid, list_id: Uuid, name: String) -> Result<TodoList> {
        let mut list = self.load_owned(user_id, list_id)?;
        list.rename(name, Utc::now());
        self.lists.update(&list).map_err(storage("renaming list"))?;
        info!(%user_id, %list_id, "list renamed");
        Ok(list)
    }

    /// Soft-delete the list and every todo in it.
    pub fn delete(&self, user_id: Uuid, list_id: Uuid) -> Result<()> {
        self.load_owned(user_id, list_id)?;
        let now = Utc::now();
        // Todos first: if the list delete then fails, the list is still
        // visible and the call can be retried.
        let removed = self
            .todos
            .soft_delete_by_list_id(list_id, now)
            .map_err(storage("deleting list todos"))?;
        self.lists
            .soft_delete(list_id, now)
            .map_err(storage("deleting list"))?;
        info!(%user_id, %list_id, todos = removed, "list deleted");
        Ok(())
    }

    /// Copy one of the caller's lists into a new list named
    /// `"<name> (Copy)"`.
    ///
    /// With `keep_completed` false every copy starts incomplete; otherwise
    /// completed todos stay completed with a fresh `completed_at`.
    #[instrument(skip_all, fields(%user_id, %list_id))]
    pub fn duplicate(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        keep_completed: bool,
    ) -> Result<ListWithTodos> {
        let source = self.load_owned(user_id, list_id)?;
        let todos = self
            .todos
            .find_by_list_id(source.id)
            .map_err(storage("loading list todos"))?;
        let copy = self.copy_into(
            user_id,
            format!("{} (Copy)", source.name),
            &todos,
            keep_completed,
        )?;
        info!(new_list_id = %copy.list.id, todos = copy.todos.len(), "list duplicated");
        Ok(copy)
    }

    /// Mint a share token for one of the caller's lists.
    pub fn generate_share_link(&self, user_id: Uuid, list_id: Uuid) -> Result<ShareLink> {
        let list = self.load_owned(user_id, list_id)?;
        let token = self.tokens.encode(list.id);
        info!(%user_id, %list_id, "share link generated");
        Ok(ShareLink {
            list_id: list.id,
            token,
        })
    }

    /// Copy the list behind `token` into the caller's account as
    /// `"<name> (shared)"`.
    #[instrument(skip_all, fields(%user_id))]
    pub fn import_shared_list(
        &self,
        user_id: Uuid,
        token: &str,
        keep_completed: bool,
    ) -> Result<ListWithTodos> {
        let list_id = self.tokens.decode(token).map_err(|err| {
            warn!("rejected share token");
            ServiceError::bad_request(err.to_string())
        })?;
        let source = self
            .lists
            .find_by_id(list_id)
            .map_err(storage("loading shared list"))?
            .ok_or_else(|| ServiceError::not_found("shared list no longer exists"))?;
        if source.is_owned_by(user_id) {
            warn!(%list_id, "owner tried to import own list");
            return Err(ServiceError::bad_request(
                "cannot import your own list, use duplicate instead",
            ));
        }

        let todos = self
            .todos
            .find_by_list_id(source.id)
            .map_err(storage("loading shared list todos"))?;
        let copy = self.copy_into(
            user_id,
            format!("{} (shared)", source.name),
            &todos,
            keep_completed,
        )?;
        info!(
            source_list_id = %list_id,
            new_list_id = %copy.list.id,
            todos = copy.todos.len(),
            "shared list imported"
        );
        Ok(copy)
    }

    fn load_owned(&self, user_id: Uuid, list_id: Uuid) -> Result<TodoList> {
        let list = self
            .lists
            .find_by_id(list_id)
            .map_err(storage("loading list"))?
            .ok_or_else(|| ServiceError::not_found("list not found"))?;
        if !list.is_owned_by(user_id) {
            warn!(%user_id, %list_id, "list access by non-owner");
            return Err(ServiceError::forbidden("you do not have access to this list"));
        }
        Ok(list)
    }

    fn copy_into(
        &self,
        owner_id: Uuid,
        name: String,
        source: &[Todo],
        keep_completed: bool,
    ) -> Result<ListWithTodos> {
        let now = Utc::now();
        let list = TodoList::new(owner_id, name, now);
        self.lists
            .create(&list)
            .map_err(storage("creating list copy"))?;

        let mut copies = Vec::with_capacity(source.len());
        for original in source {
            let mut copy = Todo::new(
                owner_id,
                Some(list.id),
                original.title.clone(),
                original.description.clone(),
                original.priority,
                original.due_date,
                now,
            );
            if keep_completed && original.completed {
                copy.mark_complete(now, now);
            }
            if let Err(err) = self.todos.create(&copy) {
                self.discard_partial_copy(&list, &copies, now);
                return Err(storage("copying todo")(err));
            }
            copies.push(copy);
        }

        Ok(ListWithTodos {
            list,
            todos: copies,
        })
    }

    fn discard_partial_copy(&self, list: &TodoList, copies: &[Todo], now: DateTime<Utc>) {
        warn!(list_id = %list.id, written = copies.len(), "copy failed, discarding partial list");
        for todo in copies {
            if let Err(err) = self.todos.soft_delete(todo.id, now) {
                warn!(todo_id = %todo.id, error = %err, "could not discard copied todo");
            }
        }
        if let Err(err) = self.lists.soft_delete(list.id, now) {
            warn!(list_id = %list.id, error = %err, "could not discard copied list");
        }
    }
}
