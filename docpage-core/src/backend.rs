//! Storage backend abstraction for repositories.
//!
//! A [`StoreBackend`] is the handle a repository is given by whoever owns the
//! database connection. It exposes the handful of native operations the
//! repository needs, each addressed to a named collection, and reports through
//! [`is_ready`](StoreBackend::is_ready) whether the connection is usable.
//!
//! Selectors, sort documents and aggregation stages are passed in the native
//! `$`-operator dialect. Implementations must classify their failures into
//! [`RepositoryError`](crate::error::RepositoryError) and never leak driver errors.
//!
//! # Examples
//!
//! ```ignore
//! use docpage::backend::StoreBackend;
//! use bson::doc;
//!
//! let id = backend.insert_one(doc! { "name": "Alice" }, "users").await?;
//! let found = backend.find_one(doc! { "_id": id }, "users").await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::{Document, oid::ObjectId};
use std::fmt::Debug;

use crate::{error::RepositoryResult, query::FindQuery};

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// Implementations must be shareable between tasks. Every method is an
/// independent unit of work; the repository holds no state between calls.
///
/// # Cancellation
///
/// All methods are async. Dropping a returned future before it completes must
/// not leave partial writes behind: each write method is a single atomic store
/// operation.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Returns `false` while the underlying connection is not initialized.
    fn is_ready(&self) -> bool {
        true
    }

    /// Returns the documents matching `query.selector`, ordered by `query.sort`
    /// and truncated to `query.limit`.
    async fn find(&self, query: FindQuery, collection: &str) -> RepositoryResult<Vec<Document>>;

    /// Returns the first document matching `selector`, if any.
    async fn find_one(&self, selector: Document, collection: &str) -> RepositoryResult<Option<Document>>;

    /// Inserts a document that has no primary key and returns the key the store assigned.
    async fn insert_one(&self, document: Document, collection: &str) -> RepositoryResult<ObjectId>;

    /// Replaces the body of the first document matching `selector`, keeping its
    /// primary key. Returns the number of documents matched (0 or 1).
    async fn replace_one(
        &self,
        selector: Document,
        replacement: Document,
        collection: &str,
    ) -> RepositoryResult<u64>;

    /// Deletes the first document matching `selector`. Returns the number removed (0 or 1).
    async fn delete_one(&self, selector: Document, collection: &str) -> RepositoryResult<u64>;

    /// Counts the documents matching `selector`.
    async fn count(&self, selector: Document, collection: &str) -> RepositoryResult<u64>;

    /// Runs an aggregation pipeline and returns the raw result documents.
    ///
    /// A pipeline the store refuses must surface as
    /// [`RepositoryError::InvalidArgument`](crate::error::RepositoryError::InvalidArgument).
    async fn aggregate(&self, pipeline: Vec<Document>, collection: &str) -> RepositoryResult<Vec<Document>>;

    /// Creates an index over `keys` (a native sort document).
    async fn create_index(&self, keys: Document, unique: bool, collection: &str) -> RepositoryResult<()>;

    /// Drops a collection and all its documents.
    async fn drop_collection(&self, collection: &str) -> RepositoryResult<()>;

    /// Releases the connection. The default implementation is a no-op.
    async fn shutdown(self) -> RepositoryResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory for backends whose construction is itself fallible or async.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> RepositoryResult<Self::Backend>;
}
