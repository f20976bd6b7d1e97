//! Caller identity for the HTTP surface.
//!
//! Real deployments resolve identity from a verified bearer credential
//! before a request reaches this layer. Here the resolved id travels in the
//! `x-user-id` header and only has to name a live user.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use todo_core::ErrorKind;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

pub const USER_HEADER: &str = "x-user-id";

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or(ApiError::Unauthorized)?;

        match state.users.get_by_id(id) {
            Ok(user) => Ok(CurrentUser(user.id)),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ApiError::Unauthorized),
            Err(err) => Err(err.into()),
        }
    }
}
