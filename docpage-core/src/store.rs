//! Owning entry point for a storage backend.
//!
//! A [`DocumentStore`] owns one backend and hands out [`Repository`] views that
//! borrow it, one per collection and model type.
//!
//! # Example
//!
//! ```ignore
//! use docpage::prelude::*;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let products = store.serde_repository::<Product>(RepositoryConfig::new("products"))?;
//! ```

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    backend::StoreBackend,
    config::RepositoryConfig,
    error::RepositoryResult,
    mapper::{ModelCodec, SerdeCodec},
    repository::Repository,
};

/// A document store bound to a specific backend implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns a repository mapping documents through `codec`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn repository<'a, T, C: ModelCodec<T>>(
        &'a self,
        config: RepositoryConfig,
        codec: C,
    ) -> RepositoryResult<Repository<'a, B, T, C>> {
        Repository::new(&self.backend, config, codec)
    }

    /// Returns a repository for a serde model.
    pub fn serde_repository<'a, T>(
        &'a self,
        config: RepositoryConfig,
    ) -> RepositoryResult<Repository<'a, B, T, SerdeCodec<T>>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.repository(config, SerdeCodec::new())
    }

    /// Drops (deletes) a collection with the given name.
    pub async fn drop_collection(&self, name: &str) -> RepositoryResult<()> {
        self.backend.drop_collection(name).await
    }

    /// Shuts down the store, releasing the backend's connection.
    pub async fn shutdown(self) -> RepositoryResult<()> {
        self.backend.shutdown().await
    }
}
