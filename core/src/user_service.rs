//! Account registration and profile management.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::entity::User;
use crate::error::{storage, RepoError, Result, ServiceError};
use crate::repository::UserRepository;
use crate::types::RegisterUser;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Create an account. Username and email must not be taken by a live user.
    pub fn register(&self, input: RegisterUser) -> Result<User> {
        if self
            .users
            .find_by_username(&input.username)
            .map_err(storage("looking up username"))?
            .is_some()
        {
            return Err(ServiceError::Conflict("username already taken".to_string()));
        }
        if self
            .users
            .find_by_email(&input.email)
            .map_err(storage("looking up email"))?
            .is_some()
        {
            return Err(ServiceError::Conflict("email already registered".to_string()));
        }

        let user = User::new(
            input.username,
            input.email,
            input.credential_hash,
            input.display_name,
            Utc::now(),
        );
        // The lookups above race with concurrent registrations; the store's
        // own uniqueness check is the one that counts.
        match self.users.create(&user) {
            Ok(()) => {}
            Err(RepoError::Conflict(msg)) => return Err(ServiceError::Conflict(msg)),
            Err(err) => return Err(storage("creating user")(err)),
        }

        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub fn get_by_id(&self, user_id: Uuid) -> Result<User> {
        debug!(%user_id, "loading user");
        self.users
            .find_by_id(user_id)
            .map_err(storage("loading user"))?
            .ok_or_else(|| ServiceError::not_found("user not found"))
    }

    pub fn update_profile(&self, user_id: Uuid, display_name: String) -> Result<User> {
        let mut user = self.get_by_id(user_id)?;
        user.update_profile(display_name, Utc::now());
        self.users.update(&user).map_err(storage("updating user"))?;
        info!(%user_id, "user profile updated");
        Ok(user)
    }

    pub fn delete(&self, user_id: Uuid) -> Result<()> {
        let mut user = self.get_by_id(user_id)?;
        user.soft_delete(Utc::now());
        self.users.update(&user).map_err(storage("deleting user"))?;
        info!(%user_id, "user deleted");
        Ok(())
    }
}
