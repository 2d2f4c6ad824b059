use async_trait::async_trait;
use bson::{Document, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    options::{ClientOptions, FindOptions, IndexOptions},
};
use tracing::debug;

use docpage_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{RepositoryError, RepositoryResult},
    query::FindQuery,
};

use crate::error::classify;

/// [`StoreBackend`] over a MongoDB database.
///
/// Selectors, sort documents and pipelines are handed to the server unchanged.
#[derive(Debug, Clone)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn find(&self, query: FindQuery, collection: &str) -> RepositoryResult<Vec<Document>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            let limit = i64::try_from(limit)
                .map_err(|_| RepositoryError::InvalidArgument(format!("limit {limit} is too large")))?;
            options.limit = Some(limit);
        }
        if let Some(sort) = query.sort {
            options.sort = Some(sort);
        }

        debug!(collection = %collection, selector = %query.selector, "Running find");

        self.get_collection(collection)
            .find(query.selector)
            .with_options(options)
            .await
            .map_err(classify)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(classify)
    }

    async fn find_one(&self, selector: Document, collection: &str) -> RepositoryResult<Option<Document>> {
        self.get_collection(collection)
            .find_one(selector)
            .await
            .map_err(classify)
    }

    async fn insert_one(&self, document: Document, collection: &str) -> RepositoryResult<ObjectId> {
        let result = self
            .get_collection(collection)
            .insert_one(document)
            .await
            .map_err(classify)?;

        result.inserted_id.as_object_id().ok_or_else(|| {
            RepositoryError::Serialization(format!("store assigned a non object id key {}", result.inserted_id))
        })
    }

    async fn replace_one(
        &self,
        selector: Document,
        replacement: Document,
        collection: &str,
    ) -> RepositoryResult<u64> {
        Ok(self
            .get_collection(collection)
            .replace_one(selector, replacement)
            .await
            .map_err(classify)?
            .matched_count)
    }

    async fn delete_one(&self, selector: Document, collection: &str) -> RepositoryResult<u64> {
        Ok(self
            .get_collection(collection)
            .delete_one(selector)
            .await
            .map_err(classify)?
            .deleted_count)
    }

    async fn count(&self, selector: Document, collection: &str) -> RepositoryResult<u64> {
        self.get_collection(collection)
            .count_documents(selector)
            .await
            .map_err(classify)
    }

    async fn aggregate(&self, pipeline: Vec<Document>, collection: &str) -> RepositoryResult<Vec<Document>> {
        self.get_collection(collection)
            .aggregate(pipeline)
            .await
            .map_err(classify)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(classify)
    }

    async fn create_index(&self, keys: Document, unique: bool, collection: &str) -> RepositoryResult<()> {
        self.get_collection(collection)
            .create_index(
                IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                    .unique(unique)
                    .build()
                )
                .build()
            )
            .await
            .map_err(classify)?;

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> RepositoryResult<()> {
        self.get_collection(name)
            .drop()
            .await
            .map_err(classify)
    }

    async fn shutdown(self) -> RepositoryResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
    app_name: Option<String>,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
            app_name: None,
        }
    }

    /// Name reported to the server in connection handshakes and logs.
    pub fn app_name(mut self, app_name: &str) -> Self {
        self.app_name = Some(app_name.to_string());
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> RepositoryResult<Self::Backend> {
        let mut options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| RepositoryError::StorageUnavailable(e.to_string()))?;

        if self.app_name.is_some() {
            options.app_name = self.app_name;
        }

        debug!(database = %self.database, "Connecting to MongoDB");

        Ok(MongoDbStore::new(
            Client::with_options(options)
                .map_err(|e| RepositoryError::StorageUnavailable(e.to_string()))?,
            self.database,
        ))
    }
}
