//! Opaque pagination cursors.
//!
//! A cursor is the hexadecimal primary key of the last document of the previous
//! page. Decoding validates its format without touching the store; resolving
//! fetches the referenced document, whose field values seed the keyset predicate.

use bson::{Bson, Document, doc, oid::ObjectId};
use tracing::warn;

use crate::{
    backend::StoreBackend,
    error::{RepositoryError, RepositoryResult},
    id::{self, NATIVE_ID_FIELD},
};

/// Validates a cursor and returns the primary key it carries.
///
/// # Errors
///
/// Returns [`RepositoryError::InvalidArgument`] for anything that is not a
/// primary key's textual form.
pub fn decode(cursor: &str) -> RepositoryResult<ObjectId> {
    id::to_native(cursor).map_err(|_| RepositoryError::InvalidArgument(format!("malformed cursor '{cursor}'")))
}

/// Produces the cursor pointing at `document`.
///
/// # Errors
///
/// Returns [`RepositoryError::Serialization`] if the document carries no
/// object-id primary key.
pub fn encode(document: &Document) -> RepositoryResult<String> {
    document
        .get_object_id(NATIVE_ID_FIELD)
        .map(|oid| id::from_native(&oid))
        .map_err(|_| RepositoryError::Serialization(format!("document has no {NATIVE_ID_FIELD} to build a cursor from")))
}

/// Fetches the reference document a cursor points at.
///
/// With a `scope` of `(field, owner)` only that owner's document is looked up,
/// so a cursor cannot be used to learn about another owner's documents.
///
/// # Errors
///
/// A document that no longer exists, or that lies outside the scope, yields
/// [`RepositoryError::InvalidArgument`]: a stale cursor is reported to the
/// caller rather than read as an empty page.
pub async fn resolve<B>(
    backend: &B,
    collection: &str,
    cursor: &ObjectId,
    scope: Option<(&str, &Bson)>,
) -> RepositoryResult<Document>
where
    B: StoreBackend + ?Sized,
{
    let mut selector = doc! { NATIVE_ID_FIELD: *cursor };
    if let Some((field, owner)) = scope {
        selector.insert(field, owner.clone());
    }

    match backend.find_one(selector, collection).await? {
        Some(reference) => Ok(reference),
        None => {
            let cursor = id::from_native(cursor);
            warn!(collection = %collection, cursor = %cursor, "Pagination cursor references a missing document");
            Err(RepositoryError::stale_cursor(&cursor))
        }
    }
}
