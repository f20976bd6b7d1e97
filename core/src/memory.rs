//! In-memory implementation of the repository contracts.
//!
//! # Design
//! One `RwLock` per entity kind guards a `HashMap` of rows plus the ids in
//! insertion order, which doubles as creation order for the finders. Every
//! trait call takes the lock once, so each call is atomic on its own and no
//! call spans two locks. A poisoned lock surfaces as
//! [`RepoError::Unavailable`].

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entity::{Todo, TodoList, User};
use crate::error::RepoError;
use crate::repository::{RepoResult, TodoListRepository, TodoRepository, UserRepository};

struct Table<T> {
    rows: HashMap<Uuid, T>,
    order: Vec<Uuid>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T> Table<T> {
    fn insert(&mut self, id: Uuid, row: T) {
        if self.rows.insert(id, row).is_none() {
            self.order.push(id);
        }
    }

    /// Rows in insertion order.
    fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.rows.get(id))
    }
}

/// Process-local store for users, lists and todos.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Table<User>>,
    lists: RwLock<Table<TodoList>>,
    todos: RwLock<Table<Todo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> RepoResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| RepoError::Unavailable("lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> RepoResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| RepoError::Unavailable("lock poisoned".to_string()))
}

impl UserRepository for MemoryStore {
    fn create(&self, user: &User) -> RepoResult<()> {
        let mut users = write(&self.users)?;
        let live = users.iter().filter(|u| !u.is_deleted());
        for existing in live {
            if existing.username == user.username {
                return Err(RepoError::Conflict("username already taken".to_string()));
            }
            if existing.email == user.email {
                return Err(RepoError::Conflict("email already registered".to_string()));
            }
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let users = read(&self.users)?;
        Ok(users.rows.get(&id).filter(|u| !u.is_deleted()).cloned())
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let users = read(&self.users)?;
        let found = users
            .iter()
            .find(|u| !u.is_deleted() && u.username == username)
            .cloned();
        Ok(found)
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let users = read(&self.users)?;
        let found = users
            .iter()
            .find(|u| !u.is_deleted() && u.email == email)
            .cloned();
        Ok(found)
    }

    fn update(&self, user: &User) -> RepoResult<()> {
        let mut users = write(&self.users)?;
        let row = users.rows.get_mut(&user.id).ok_or(RepoError::Missing)?;
        *row = user.clone();
        Ok(())
    }
}

impl TodoListRepository for MemoryStore {
    fn create(&self, list: &TodoList) -> RepoResult<()> {
        write(&self.lists)?.insert(list.id, list.clone());
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> RepoResult<Option<TodoList>> {
        let lists = read(&self.lists)?;
        Ok(lists.rows.get(&id).filter(|l| !l.is_deleted()).cloned())
    }

    fn find_by_owner(&self, owner_id: Uuid) -> RepoResult<Vec<TodoList>> {
        let lists = read(&self.lists)?;
        Ok(lists
            .iter()
            .filter(|l| !l.is_deleted() && l.owner_id == owner_id)
            .cloned()
            .collect())
    }

    fn update(&self, list: &TodoList) -> RepoResult<()> {
        let mut lists = write(&self.lists)?;
        let row = lists.rows.get_mut(&list.id).ok_or(RepoError::Missing)?;
        *row = list.clone();
        Ok(())
    }

    fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> RepoResult<()> {
        let mut lists = write(&self.lists)?;
        let row = lists
            .rows
            .get_mut(&id)
            .filter(|l| !l.is_deleted())
            .ok_or(RepoError::Missing)?;
        row.soft_delete(at);
        Ok(())
    }
}

impl TodoRepository for MemoryStore {
    fn create(&self, todo: &Todo) -> RepoResult<()> {
        write(&self.todos)?.insert(todo.id, todo.clone());
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Todo>> {
        let todos = read(&self.todos)?;
        Ok(todos.rows.get(&id).filter(|t| !t.is_deleted()).cloned())
    }

    fn find_by_owner(&self, owner_id: Uuid, offset: usize, limit: usize) -> RepoResult<Vec<Todo>> {
        let todos = read(&self.todos)?;
        Ok(todos
            .iter()
            .filter(|t| !t.is_deleted() && t.owner_id == owner_id)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn count_by_owner(&self, owner_id: Uuid) -> RepoResult<usize> {
        let todos = read(&self.todos)?;
        Ok(todos
            .iter()
            .filter(|t| !t.is_deleted() && t.owner_id == owner_id)
            .count())
    }

    fn find_by_list_id(&self, list_id: Uuid) -> RepoResult<Vec<Todo>> {
        let todos = read(&self.todos)?;
        Ok(todos
            .iter()
            .filter(|t| !t.is_deleted() && t.list_id == Some(list_id))
            .cloned()
            .collect())
    }

    fn update(&self, todo: &Todo) -> RepoResult<()> {
        let mut todos = write(&self.todos)?;
        let row = todos.rows.get_mut(&todo.id).ok_or(RepoError::Missing)?;
        *row = todo.clone();
        Ok(())
    }

    fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> RepoResult<()> {
        let mut todos = write(&self.todos)?;
        let row = todos
            .rows
            .get_mut(&id)
            .filter(|t| !t.is_deleted())
            .ok_or(RepoError::Missing)?;
        row.soft_delete(at);
        Ok(())
    }

    fn soft_delete_by_list_id(&self, list_id: Uuid, at: DateTime<Utc>) -> RepoResult<usize> {
        let mut todos = write(&self.todos)?;
        let mut changed = 0;
        for todo in todos.rows.values_mut() {
            if !todo.is_deleted() && todo.list_id == Some(list_id) {
                todo.soft_delete(at);
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn reassign_list_id(
        &self,
        todo_ids: &[Uuid],
        list_id: Option<Uuid>,
        owner_id: Uuid,
        at: DateTime<Utc>,
    ) -> RepoResult<usize> {
        let mut todos = write(&self.todos)?;
        let mut changed = 0;
        for id in todo_ids {
            if let Some(todo) = todos.rows.get_mut(id) {
                if !todo.is_deleted() && todo.owner_id == owner_id {
                    todo.list_id = list_id;
                    todo.updated_at = at;
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Priority;

    fn todo(owner: Uuid, list_id: Option<Uuid>, title: &str) -> Todo {
        Todo::new(
            owner,
            list_id,
            title.to_string(),
            String::new(),
            Priority::Low,
            None,
            Utc::now(),
        )
    }

    fn user(name: &str) -> User {
        User::new(
            name.to_string(),
            format!("{name}@example.com"),
            "hash".to_string(),
            name.to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn finders_keep_creation_order() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        for i in 0..5 {
            TodoRepository::create(&store, &todo(owner, None, &format!("t{i}"))).unwrap();
        }
        let page = TodoRepository::find_by_owner(&store, owner, 1, 2).unwrap();
        let titles: Vec<_> = page.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["t1", "t2"]);
        assert_eq!(store.count_by_owner(owner).unwrap(), 5);
    }

    #[test]
    fn soft_deleted_rows_are_invisible() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let t = todo(owner, None, "gone");
        TodoRepository::create(&store, &t).unwrap();
        TodoRepository::soft_delete(&store, t.id, Utc::now()).unwrap();

        assert!(TodoRepository::find_by_id(&store, t.id).unwrap().is_none());
        assert_eq!(store.count_by_owner(owner).unwrap(), 0);
        assert_eq!(
            TodoRepository::soft_delete(&store, t.id, Utc::now()),
            Err(RepoError::Missing)
        );
    }

    #[test]
    fn cascade_only_touches_the_given_list() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        TodoRepository::create(&store, &todo(owner, Some(a), "a1")).unwrap();
        TodoRepository::create(&store, &todo(owner, Some(a), "a2")).unwrap();
        TodoRepository::create(&store, &todo(owner, Some(b), "b1")).unwrap();

        assert_eq!(store.soft_delete_by_list_id(a, Utc::now()).unwrap(), 2);
        assert!(store.find_by_list_id(a).unwrap().is_empty());
        assert_eq!(store.find_by_list_id(b).unwrap().len(), 1);
    }

    #[test]
    fn reassign_skips_foreign_todos() {
        let store = MemoryStore::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mine = todo(alice, None, "mine");
        let theirs = todo(bob, None, "theirs");
        TodoRepository::create(&store, &mine).unwrap();
        TodoRepository::create(&store, &theirs).unwrap();

        let list = Uuid::new_v4();
        let moved = store
            .reassign_list_id(&[mine.id, theirs.id], Some(list), alice, Utc::now())
            .unwrap();
        assert_eq!(moved, 1);
        let theirs = TodoRepository::find_by_id(&store, theirs.id).unwrap().unwrap();
        assert!(theirs.list_id.is_none());
    }

    #[test]
    fn duplicate_username_or_email_conflicts() {
        let store = MemoryStore::new();
        UserRepository::create(&store, &user("alice")).unwrap();

        let err = UserRepository::create(&store, &user("alice")).unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));

        let mut other = user("bob");
        other.email = "alice@example.com".to_string();
        let err = UserRepository::create(&store, &other).unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
    }

    #[test]
    fn users_found_by_username_and_email() {
        let store = MemoryStore::new();
        let alice = user("alice");
        UserRepository::create(&store, &alice).unwrap();
        UserRepository::create(&store, &user("bob")).unwrap();

        let by_name = store.find_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, alice.id);
        let by_email = store.find_by_email("alice@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, alice.id);
        assert!(store.find_by_email("carol@example.com").unwrap().is_none());
    }

    #[test]
    fn deleted_user_frees_username() {
        let store = MemoryStore::new();
        let mut alice = user("alice");
        UserRepository::create(&store, &alice).unwrap();
        alice.soft_delete(Utc::now());
        UserRepository::update(&store, &alice).unwrap();

        assert!(store.find_by_username("alice").unwrap().is_none());
        UserRepository::create(&store, &user("alice")).unwrap();
    }

    #[test]
    fn update_of_missing_row_fails() {
        let store = MemoryStore::new();
        let list = TodoList::new(Uuid::new_v4(), "Work".to_string(), Utc::now());
        assert_eq!(
            TodoListRepository::update(&store, &list),
            Err(RepoError::Missing)
        );
    }
}
