//! Error types and result types for repository operations.
//!
//! Every failure that crosses the repository boundary is one of the variants of
//! [`RepositoryError`]. Backends re-classify their driver errors into this taxonomy
//! so that no store-internal error object ever reaches a caller.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when working with a repository.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    /// The caller supplied something malformed: an identifier, a cursor, a cursor
    /// pointing at a document that no longer exists, a search term the collection
    /// cannot serve, or a command the store rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The targeted document does not exist (within the ownership scope, if any).
    #[error("Not found: {0}")]
    NotFound(String),
    /// The store is not connected, or failed in a way that is not the caller's fault.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    /// A document could not be converted to or from its typed model.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A specialized `Result` type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl RepositoryError {
    /// An identifier that is not the textual form of a native primary key.
    pub fn invalid_identifier(id: &str) -> Self {
        Self::InvalidArgument(format!("invalid identifier '{id}'"))
    }

    /// A cursor that decodes correctly but references a document that is gone.
    pub fn stale_cursor(cursor: &str) -> Self {
        Self::InvalidArgument(format!("cursor '{cursor}' is no longer valid"))
    }

    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound(format!("document {id} in collection {collection}"))
    }

    /// Returns `true` when the error was caused by the request rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::NotFound(_))
    }
}

impl From<BsonError> for RepositoryError {
    fn from(err: BsonError) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for RepositoryError {
    fn from(err: SerdeJsonError) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(RepositoryError::invalid_identifier("xyz").is_client_error());
        assert!(RepositoryError::stale_cursor("abc").is_client_error());
        assert!(RepositoryError::not_found("items", "abc").is_client_error());
        assert!(!RepositoryError::StorageUnavailable("down".into()).is_client_error());
        assert!(!RepositoryError::Serialization("bad".into()).is_client_error());
    }

    #[test]
    fn test_messages_name_the_input() {
        let err = RepositoryError::stale_cursor("65f0c0ffee");
        assert_eq!(err.to_string(), "Invalid argument: cursor '65f0c0ffee' is no longer valid");
    }
}
