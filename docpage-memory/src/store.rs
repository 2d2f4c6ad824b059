//! In-memory storage implementation for repositories.
//!
//! Collections are vectors of native documents kept in insertion order behind an
//! async-aware read-write lock. Selectors are evaluated by
//! [`DocumentEvaluator`](crate::evaluator::DocumentEvaluator), so the store
//! accepts the same `$`-operator dialect as a real document database.

use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering as AtomicOrdering},
    },
};

use async_trait::async_trait;
use bson::{Bson, Document, doc, oid::ObjectId};
use mea::rwlock::RwLock;
use tracing::debug;

use docpage_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{RepositoryError, RepositoryResult},
    id::NATIVE_ID_FIELD,
    query::{FindQuery, lookup_path},
    sort::SortDirection,
};

use crate::evaluator::{Comparable, DocumentEvaluator};

type StoreMap = HashMap<String, Vec<Document>>;

/// Thread-safe in-memory document storage backend.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data and readiness flag.
///
/// # Performance
///
/// Queries scan every document of a collection; indexes are accepted and ignored.
///
/// # Example
///
/// ```ignore
/// use docpage_memory::InMemoryStore;
/// use docpage::backend::StoreBackend;
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// let id = store.insert_one(doc! { "name": "Alice" }, "users").await?;
/// assert!(store.find_one(doc! { "_id": id }, "users").await?.is_some());
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryStore {
    /// collection name -> documents, in insertion order
    store: Arc<RwLock<StoreMap>>,
    ready: Arc<AtomicBool>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new, empty and ready store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Marks the store as connected or disconnected.
    ///
    /// While disconnected every operation fails with
    /// [`RepositoryError::StorageUnavailable`], which lets callers exercise
    /// their handling of a store that has not finished connecting.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, AtomicOrdering::SeqCst);
    }

    fn check_ready(&self) -> RepositoryResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(RepositoryError::StorageUnavailable("connection not initialized".to_string()))
        }
    }
}

/// Sorts `documents` in place by a native sort document. The sort is stable, so
/// keys not named in `sort` keep insertion order.
fn sort_documents(documents: &mut [Document], sort: &Document) -> RepositoryResult<()> {
    let keys = sort
        .iter()
        .map(|(field, direction)| Ok((field.as_str(), SortDirection::from_native(direction)?)))
        .collect::<RepositoryResult<Vec<_>>>()?;

    documents.sort_by(|a, b| {
        keys.iter()
            .map(|(field, direction)| {
                let ordering = Comparable::from(lookup_path(a, field))
                    .total_cmp(&Comparable::from(lookup_path(b, field)));

                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    Ok(())
}

/// Index of the first document matching `selector`.
fn position_of(documents: &[Document], selector: &Document) -> RepositoryResult<Option<usize>> {
    for (index, document) in documents.iter().enumerate() {
        if DocumentEvaluator::new(document).evaluate(selector)? {
            return Ok(Some(index));
        }
    }

    Ok(None)
}

/// Puts the primary key first, ahead of the body's own fields.
fn with_primary_key(id: Bson, body: Document) -> Document {
    let mut stored = doc! { NATIVE_ID_FIELD: id };

    for (key, value) in body {
        if key != NATIVE_ID_FIELD {
            stored.insert(key, value);
        }
    }

    stored
}

fn stage_count(stage: &str, value: &Bson) -> RepositoryResult<usize> {
    let count = match value {
        Bson::Int32(n) => i64::from(*n),
        Bson::Int64(n) => *n,
        Bson::Double(n) if n.fract() == 0.0 => *n as i64,
        other => {
            return Err(RepositoryError::InvalidArgument(format!("{stage} needs a whole number, got {other}")));
        }
    };

    usize::try_from(count).map_err(|_| RepositoryError::InvalidArgument(format!("{stage} must not be negative")))
}

/// Runs the supported subset of aggregation stages over `documents`.
fn run_pipeline(mut documents: Vec<Document>, pipeline: &[Document]) -> RepositoryResult<Vec<Document>> {
    for stage in pipeline {
        let mut entries = stage.iter();
        let (name, value) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(RepositoryError::InvalidArgument(format!(
                    "a pipeline stage must have exactly one key, got {stage}"
                )));
            }
        };

        documents = match (name.as_str(), value) {
            ("$match", Bson::Document(selector)) => DocumentEvaluator::filter_documents(&documents, selector)?,
            ("$sort", Bson::Document(sort)) => {
                sort_documents(&mut documents, sort)?;
                documents
            }
            ("$skip", value) => documents.into_iter().skip(stage_count("$skip", value)?).collect(),
            ("$limit", value) => documents.into_iter().take(stage_count("$limit", value)?).collect(),
            ("$count", Bson::String(field)) if !field.is_empty() && !field.starts_with('$') => {
                if documents.is_empty() {
                    Vec::new()
                } else {
                    vec![doc! { field.as_str(): documents.len() as i64 }]
                }
            }
            (name, value) => {
                return Err(RepositoryError::InvalidArgument(format!("unsupported pipeline stage {name}: {value}")));
            }
        };
    }

    Ok(documents)
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    fn is_ready(&self) -> bool {
        self.ready.load(AtomicOrdering::SeqCst)
    }

    async fn find(&self, query: FindQuery, collection: &str) -> RepositoryResult<Vec<Document>> {
        self.check_ready()?;

        let store = self.store.read().await;
        let documents = match store.get(collection) {
            Some(documents) => documents,
            None => return Ok(vec![]),
        };

        let mut matched = DocumentEvaluator::filter_documents(documents, &query.selector)?;

        if let Some(sort) = &query.sort {
            sort_documents(&mut matched, sort)?;
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        debug!(collection = %collection, matched = matched.len(), "Evaluated find");

        Ok(matched)
    }

    async fn find_one(&self, selector: Document, collection: &str) -> RepositoryResult<Option<Document>> {
        self.check_ready()?;

        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(None);
        };

        for document in documents {
            if DocumentEvaluator::new(document).evaluate(&selector)? {
                return Ok(Some(document.clone()));
            }
        }

        Ok(None)
    }

    async fn insert_one(&self, document: Document, collection: &str) -> RepositoryResult<ObjectId> {
        self.check_ready()?;

        let mut store = self.store.write().await;
        let documents = store.entry(collection.to_string()).or_default();

        let id = match document.get(NATIVE_ID_FIELD) {
            Some(Bson::ObjectId(id)) => *id,
            Some(other) => {
                return Err(RepositoryError::InvalidArgument(format!("primary key must be an object id, got {other}")));
            }
            None => ObjectId::new(),
        };

        if documents
            .iter()
            .any(|existing| existing.get_object_id(NATIVE_ID_FIELD).is_ok_and(|existing| existing == id))
        {
            return Err(RepositoryError::InvalidArgument(format!(
                "duplicate key {id} in collection {collection}"
            )));
        }

        documents.push(with_primary_key(Bson::ObjectId(id), document));

        Ok(id)
    }

    async fn replace_one(
        &self,
        selector: Document,
        replacement: Document,
        collection: &str,
    ) -> RepositoryResult<u64> {
        self.check_ready()?;

        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(0);
        };

        let Some(index) = position_of(documents, &selector)? else {
            return Ok(0);
        };

        let id = documents[index].get(NATIVE_ID_FIELD).cloned().unwrap_or(Bson::Null);
        documents[index] = with_primary_key(id, replacement);

        Ok(1)
    }

    async fn delete_one(&self, selector: Document, collection: &str) -> RepositoryResult<u64> {
        self.check_ready()?;

        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(0);
        };

        Ok(match position_of(documents, &selector)? {
            Some(index) => {
                documents.remove(index);
                1
            }
            None => 0,
        })
    }

    async fn count(&self, selector: Document, collection: &str) -> RepositoryResult<u64> {
        self.check_ready()?;

        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(0);
        };

        Ok(DocumentEvaluator::filter_documents(documents, &selector)?.len() as u64)
    }

    async fn aggregate(&self, pipeline: Vec<Document>, collection: &str) -> RepositoryResult<Vec<Document>> {
        self.check_ready()?;

        let documents = self
            .store
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default();

        run_pipeline(documents, &pipeline)
    }

    async fn create_index(&self, keys: Document, _unique: bool, collection: &str) -> RepositoryResult<()> {
        self.check_ready()?;

        // Scans need no index; only the key document is checked.
        for (_, direction) in &keys {
            SortDirection::from_native(direction)?;
        }

        debug!(collection = %collection, keys = %keys, "Ignoring index creation in memory");

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> RepositoryResult<()> {
        self.check_ready()?;
        self.store.write().await.remove(name);

        Ok(())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docpage_memory::InMemoryStore;
/// use docpage::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await?;
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder {
    seed: Vec<(String, Vec<Document>)>,
}

impl InMemoryStoreBuilder {
    /// Preloads `collection` with `documents`. Documents without a primary key
    /// are given one.
    pub fn with_documents(mut self, collection: impl Into<String>, documents: Vec<Document>) -> Self {
        self.seed.push((collection.into(), documents));
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> RepositoryResult<Self::Backend> {
        let store = InMemoryStore::new();

        for (collection, documents) in self.seed {
            for document in documents {
                store.insert_one(document, &collection).await?;
            }
        }

        Ok(store)
    }
}
