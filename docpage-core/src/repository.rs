//! Typed, owner-scoped CRUD and keyset-paginated listing over one collection.
//!
//! A [`Repository`] borrows a [`StoreBackend`] handle and combines the selector
//! compiler, sort compiler, cursor codec, keyset predicate builder and document
//! mapper into the operations applications call.
//!
//! # Example
//!
//! ```ignore
//! use docpage::prelude::*;
//!
//! let products = store.serde_repository::<Product>(
//!     RepositoryConfig::builder("products").searchable_fields(["name"]).build(),
//! )?;
//!
//! let first = products.read_all(None, None, &[Sort::asc("price")], &Pagination::new(2)).await?;
//! if let Some(next) = Pagination::new(2).after(&first) {
//!     let second = products.read_all(None, None, &[Sort::asc("price")], &next).await?;
//! }
//! ```

use bson::{Bson, Document, doc, oid::ObjectId};
use tracing::debug;

use crate::{
    backend::StoreBackend,
    config::RepositoryConfig,
    cursor,
    error::{RepositoryError, RepositoryResult},
    id::{self, NATIVE_ID_FIELD},
    keyset,
    mapper::{DocumentMapper, ModelCodec},
    page::{Page, Pagination},
    query::FindQuery,
    selector::SelectorCompiler,
    sort::{Sort, SortOrder},
};

/// A typed view of one collection.
///
/// Holds no mutable state: every operation is an independent unit of work
/// against the borrowed backend.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend reference
/// * `B` - The storage backend type
/// * `T` - The application model
/// * `C` - The codec converting between `T` and documents
#[derive(Debug)]
pub struct Repository<'a, B: StoreBackend, T, C: ModelCodec<T>> {
    config: RepositoryConfig,
    backend: &'a B,
    mapper: DocumentMapper<T, C>,
}

impl<'a, B: StoreBackend, T, C: ModelCodec<T>> Repository<'a, B, T, C> {
    /// Creates a repository over `config.collection`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidArgument`] if the configuration is unusable.
    pub fn new(backend: &'a B, config: RepositoryConfig, codec: C) -> RepositoryResult<Self> {
        config.validate()?;
        let mapper = DocumentMapper::new(config.id_field.clone(), codec);

        Ok(Self { config, backend, mapper })
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Returns the name of this repository's collection.
    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    /// Lists one page of models.
    ///
    /// The filter is native dialect plus the search key `q`. Sorting always ends
    /// with the identifier, so pages never overlap or skip documents in a static
    /// collection. One document beyond the page size is fetched to learn whether
    /// another page exists.
    ///
    /// Callers must not rely on a top-level `$and` in `filter` being anything but
    /// an array: the search and keyset clauses are appended to it.
    ///
    /// # Errors
    ///
    /// * [`RepositoryError::InvalidArgument`] for a zero or unrepresentable
    ///   limit, a malformed cursor, a cursor whose document is gone or belongs
    ///   to another owner, or an unusable search term
    /// * [`RepositoryError::StorageUnavailable`] if the store is not ready or fails
    pub async fn read_all(
        &self,
        scope: Option<&Bson>,
        filter: Option<&Document>,
        sort: &[Sort],
        pagination: &Pagination,
    ) -> RepositoryResult<Page<T>> {
        let limit = self.config.page_size(pagination.limit)?;
        let fetch_limit = limit
            .checked_add(1)
            .ok_or_else(|| RepositoryError::InvalidArgument(format!("page size {limit} is too large")))?;
        let mut selector = self.selector_compiler().compile(scope, filter)?;
        let order = SortOrder::compile(sort, &self.config.id_field);
        let reference_id = pagination
            .cursor
            .as_deref()
            .map(cursor::decode)
            .transpose()?;

        self.ensure_ready()?;

        if let Some(reference_id) = reference_id {
            let reference = cursor::resolve(
                self.backend,
                self.collection(),
                &reference_id,
                scope.map(|owner| (self.config.scope_field.as_str(), owner)),
            )
            .await?;
            keyset::continue_after(&mut selector, &order, &reference)?;
        }

        let query = FindQuery::builder()
            .selector(selector)
            .sort(order.to_document())
            .limit(fetch_limit)
            .build();

        let mut documents = self.backend.find(query, self.collection()).await?;
        let fetched = documents.len();
        let has_more = fetched > limit;
        documents.truncate(limit);

        let next_cursor = match documents.last() {
            Some(last) if has_more => Some(cursor::encode(last)?),
            _ => None,
        };

        debug!(
            collection = %self.collection(),
            limit,
            fetched,
            has_more,
            "Read page"
        );

        Ok(Page::builder(
            documents
                .iter()
                .map(|doc| self.mapper.to_model(doc))
                .collect::<RepositoryResult<Vec<T>>>()?,
        )
        .with_next_cursor(next_cursor)
        .build())
    }

    /// Reads a single model by identifier.
    ///
    /// # Errors
    ///
    /// * [`RepositoryError::InvalidArgument`] for a malformed identifier
    /// * [`RepositoryError::NotFound`] if no document matches (within `scope`)
    pub async fn read(&self, id: &str, scope: Option<&Bson>) -> RepositoryResult<T> {
        let selector = self.id_selector(id, scope)?;
        self.ensure_ready()?;

        match self.backend.find_one(selector, self.collection()).await? {
            Some(document) => self.mapper.to_model(&document),
            None => Err(RepositoryError::not_found(self.collection(), id)),
        }
    }

    /// Stores a new model and returns it with its assigned identifier.
    ///
    /// Any identifier already on `item` is ignored.
    pub async fn create(&self, item: &T, scope: Option<&Bson>) -> RepositoryResult<T> {
        let body = self.body(item, scope)?;
        self.ensure_ready()?;

        let oid = self.backend.insert_one(body.clone(), self.collection()).await?;
        debug!(collection = %self.collection(), id = %oid, "Created document");

        self.mapper.to_model_with_id(body, &oid)
    }

    /// Replaces the stored body of `id` with `item`.
    ///
    /// The primary key comes from `id`, never from the model.
    ///
    /// # Errors
    ///
    /// * [`RepositoryError::InvalidArgument`] for a malformed identifier
    /// * [`RepositoryError::NotFound`] if no document matches (within `scope`)
    pub async fn update(&self, id: &str, item: &T, scope: Option<&Bson>) -> RepositoryResult<T> {
        let oid = id::to_native(id)?;
        let body = self.body(item, scope)?;
        self.ensure_ready()?;

        let matched = self
            .backend
            .replace_one(self.native_id_selector(&oid, scope), body.clone(), self.collection())
            .await?;

        if matched == 0 {
            return Err(RepositoryError::not_found(self.collection(), id));
        }

        debug!(collection = %self.collection(), id = %oid, "Updated document");

        self.mapper.to_model_with_id(body, &oid)
    }

    /// Deletes the document `id`.
    ///
    /// # Errors
    ///
    /// * [`RepositoryError::InvalidArgument`] for a malformed identifier
    /// * [`RepositoryError::NotFound`] if no document matches (within `scope`)
    pub async fn delete(&self, id: &str, scope: Option<&Bson>) -> RepositoryResult<()> {
        let selector = self.id_selector(id, scope)?;
        self.ensure_ready()?;

        if self.backend.delete_one(selector, self.collection()).await? == 0 {
            return Err(RepositoryError::not_found(self.collection(), id));
        }

        debug!(collection = %self.collection(), id = %id, "Deleted document");

        Ok(())
    }

    /// Counts the documents matching `filter` (search key included) within `scope`.
    pub async fn count(&self, scope: Option<&Bson>, filter: Option<&Document>) -> RepositoryResult<u64> {
        let selector = self.selector_compiler().compile(scope, filter)?;
        self.ensure_ready()?;

        self.backend.count(selector, self.collection()).await
    }

    /// Runs an aggregation pipeline verbatim, preceded by a `$match` on the
    /// ownership scope when one is given.
    ///
    /// # Errors
    ///
    /// A pipeline the store rejects surfaces as [`RepositoryError::InvalidArgument`].
    pub async fn aggregate(&self, pipeline: Vec<Document>, scope: Option<&Bson>) -> RepositoryResult<Vec<Document>> {
        let mut stages = Vec::with_capacity(pipeline.len() + 1);

        if let Some(scope) = scope {
            stages.push(doc! { "$match": { self.config.scope_field.as_str(): scope.clone() } });
        }
        stages.extend(pipeline);

        self.ensure_ready()?;

        self.backend.aggregate(stages, self.collection()).await
    }

    /// Creates an index matching the compiled form of `sort`, so that keyset
    /// queries under that order are served from the index.
    pub async fn ensure_sort_index(&self, sort: &[Sort]) -> RepositoryResult<()> {
        let keys = SortOrder::compile(sort, &self.config.id_field).to_document();
        self.ensure_ready()?;

        debug!(collection = %self.collection(), keys = %keys, "Ensuring sort index");

        self.backend.create_index(keys, false, self.collection()).await
    }

    fn selector_compiler(&self) -> SelectorCompiler<'_> {
        SelectorCompiler::new(&self.config.scope_field, &self.config.searchable_fields)
    }

    fn ensure_ready(&self) -> RepositoryResult<()> {
        if self.backend.is_ready() {
            Ok(())
        } else {
            Err(RepositoryError::StorageUnavailable("connection not initialized".to_string()))
        }
    }

    fn id_selector(&self, id: &str, scope: Option<&Bson>) -> RepositoryResult<Document> {
        Ok(self.native_id_selector(&id::to_native(id)?, scope))
    }

    fn native_id_selector(&self, oid: &ObjectId, scope: Option<&Bson>) -> Document {
        let mut selector = doc! { NATIVE_ID_FIELD: *oid };

        if let Some(scope) = scope {
            selector.insert(self.config.scope_field.clone(), scope.clone());
        }

        selector
    }

    fn body(&self, item: &T, scope: Option<&Bson>) -> RepositoryResult<Document> {
        let mut body = self.mapper.to_document(item)?;

        if let Some(scope) = scope {
            body.insert(self.config.scope_field.clone(), scope.clone());
        }

        Ok(body)
    }
}
