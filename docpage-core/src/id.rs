//! Mapping between application identifiers and native primary keys.
//!
//! Applications see identifiers as opaque strings. The store keys documents by
//! [`ObjectId`], whose textual form is 24 hexadecimal characters. [`to_native`] is
//! the single validation gate for caller-supplied identifiers.

use bson::oid::ObjectId;

use crate::error::{RepositoryError, RepositoryResult};

/// Field name the store uses for the primary key.
pub const NATIVE_ID_FIELD: &str = "_id";

/// Parses an application identifier into a native primary key.
///
/// # Errors
///
/// Returns [`RepositoryError::InvalidArgument`] if `id` is not exactly 24
/// hexadecimal characters.
pub fn to_native(id: &str) -> RepositoryResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| RepositoryError::invalid_identifier(id))
}

/// Renders a native primary key as an application identifier.
pub fn from_native(id: &ObjectId) -> String {
    id.to_hex()
}
