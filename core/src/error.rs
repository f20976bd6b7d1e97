//! Error types for the service layer and the repository contracts.
//!
//! # Design
//! Every public service method returns [`ServiceError`]. Callers branch on
//! [`ServiceError::kind`], never on the message. Storage failures are wrapped
//! as `Internal` with a fixed message; the repository error stays attached as
//! the `source` for server-side diagnostics only.

use thiserror::Error;

/// Failure reported by a repository implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    /// A unique constraint was violated (duplicate username or email).
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// An update or delete addressed a row that does not exist.
    #[error("row does not exist")]
    Missing,

    /// The backend could not serve the call.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Machine-checkable classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    BadRequest,
    Conflict,
    Internal,
}

/// Errors returned by the user, todo and todo-list services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The entity is absent or soft-deleted.
    #[error("{0}")]
    NotFound(String),

    /// The entity exists but belongs to another user.
    #[error("{0}")]
    Forbidden(String),

    /// The input is malformed.
    #[error("{0}")]
    BadRequest(String),

    /// A uniqueness rule would be broken.
    #[error("{0}")]
    Conflict(String),

    /// Storage or infrastructure failure. The message is always generic.
    #[error("internal server error")]
    Internal(#[source] RepoError),
}

impl ServiceError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ServiceError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ServiceError::Forbidden(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ServiceError::BadRequest(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Forbidden(_) => ErrorKind::Forbidden,
            ServiceError::BadRequest(_) => ErrorKind::BadRequest,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The caller-facing message.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Wrap a repository failure as `Internal`, logging the cause.
///
/// Used as `.map_err(storage("loading todo"))`.
pub(crate) fn storage(context: &'static str) -> impl FnOnce(RepoError) -> ServiceError {
    move |err| {
        tracing::error!(error = %err, context, "storage call failed");
        ServiceError::Internal(err)
    }
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn kinds_match_variants() {
        assert_eq!(ServiceError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(ServiceError::forbidden("x").kind(), ErrorKind::Forbidden);
        assert_eq!(ServiceError::bad_request("x").kind(), ErrorKind::BadRequest);
        assert_eq!(
            ServiceError::Conflict("x".to_string()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            ServiceError::Internal(RepoError::Missing).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn internal_hides_storage_detail_but_keeps_source() {
        let err = storage("test")(RepoError::Unavailable("disk on fire".to_string()));
        assert_eq!(err.message(), "internal server error");
        let source = err.source().expect("source attached");
        assert!(source.to_string().contains("disk on fire"));
    }

    #[test]
    fn caller_messages_pass_through() {
        let err = ServiceError::bad_request("invalid todo id");
        assert_eq!(err.to_string(), "invalid todo id");
    }
}
