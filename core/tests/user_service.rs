//! Registration and profile behaviour.

mod common;

use common::Fixture;
use todo_core::{ErrorKind, RegisterUser};
use uuid::Uuid;

fn registration(username: &str, email: &str) -> RegisterUser {
    RegisterUser {
        username: username.to_string(),
        email: email.to_string(),
        credential_hash: "$argon2id$stub".to_string(),
        display_name: username.to_string(),
    }
}

#[test]
fn register_then_fetch() {
    let fx = Fixture::new();
    let user = fx
        .users
        .register(registration("alice", "alice@example.com"))
        .unwrap();

    let fetched = fx.users.get_by_id(user.id).unwrap();
    assert_eq!(fetched, user);
    assert_eq!(fetched.credential_hash, "$argon2id$stub");
}

#[test]
fn duplicate_username_is_conflict() {
    let fx = Fixture::new();
    fx.users
        .register(registration("alice", "alice@example.com"))
        .unwrap();

    let err = fx
        .users
        .register(registration("alice", "other@example.com"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "username already taken");
}

#[test]
fn duplicate_email_is_conflict() {
    let fx = Fixture::new();
    fx.users
        .register(registration("alice", "alice@example.com"))
        .unwrap();

    let err = fx
        .users
        .register(registration("alicia", "alice@example.com"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "email already registered");
}

#[test]
fn unknown_user_is_not_found() {
    let fx = Fixture::new();
    let err = fx.users.get_by_id(Uuid::new_v4()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn update_profile_changes_display_name_only() {
    let fx = Fixture::new();
    let user = fx
        .users
        .register(registration("alice", "alice@example.com"))
        .unwrap();

    let updated = fx
        .users
        .update_profile(user.id, "Alice Liddell".to_string())
        .unwrap();
    assert_eq!(updated.display_name, "Alice Liddell");
    assert_eq!(updated.username, "alice");
    assert!(updated.updated_at >= user.updated_at);
}

#[test]
fn deleted_user_disappears_and_frees_username() {
    let fx = Fixture::new();
    let user = fx
        .users
        .register(registration("alice", "alice@example.com"))
        .unwrap();

    fx.users.delete(user.id).unwrap();
    assert_eq!(
        fx.users.get_by_id(user.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );

    fx.users
        .register(registration("alice", "alice@example.com"))
        .unwrap();
}
