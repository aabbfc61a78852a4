//! Error types for evently.

use thiserror::Error;

/// Errors that can occur in evently operations.
///
/// Repository operations surface these to the caller instead of retrying;
/// deciding what to show the user is left to the presentation layer.
#[derive(Error, Debug)]
pub enum EventlyError {
    #[error("You must be signed in to do that")]
    NotAuthenticated,

    #[error("Only the event owner can do that")]
    NotOwner,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already joined this event")]
    AlreadyJoined,

    #[error("You cannot join an event that you created")]
    OwnerCannotJoin,

    #[error("The event owner cannot be removed")]
    CannotRemoveOwner,

    #[error("This user is already the owner")]
    AlreadyOwner,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store request timed out after {0}s")]
    StoreTimeout(u64),

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Invalid store path: {0}")]
    InvalidPath(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for EventlyError {
    fn from(err: serde_json::Error) -> Self {
        EventlyError::Serialization(err.to_string())
    }
}

/// Result type alias for evently operations.
pub type EventlyResult<T> = Result<T, EventlyError>;
