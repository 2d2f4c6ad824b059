//! Main docpage crate: owner-scoped repositories with stable keyset pagination.
//!
//! This crate is the primary entry point for users of docpage. It re-exports the
//! core types from the sub-crates and provides access to the storage backends.
//!
//! # Features
//!
//! - **Typed repositories** - Map stored documents to serde models (or hand-written codecs)
//! - **Ownership scoping** - Every operation can be confined to one owner's documents
//! - **Keyset pagination** - Opaque cursors that never skip or repeat documents
//! - **Free-text search** - Case-insensitive partial matching across configured fields
//! - **Multiple backends** - In-memory and MongoDB storage behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use docpage::{prelude::*, memory::InMemoryStore};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Product {
//!     #[serde(default)]
//!     pub id: String,
//!     pub name: String,
//!     pub price: i32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> RepositoryResult<()> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!     let products = store.serde_repository::<Product>(
//!         RepositoryConfig::builder("products").searchable_fields(["name"]).build(),
//!     )?;
//!
//!     let owner = Bson::from("user-1");
//!     products
//!         .create(&Product { id: String::new(), name: "Widget".into(), price: 10 }, Some(&owner))
//!         .await?;
//!
//!     // Walk every page of the owner's widgets, cheapest first.
//!     let filter = doc! { "q": "widget" };
//!     let sort = [Sort::asc("price")];
//!     let mut request = Pagination::new(20);
//!     loop {
//!         let page = products.read_all(Some(&owner), Some(&filter), &sort, &request).await?;
//!         println!("{:?}", page.items);
//!         match request.after(&page) {
//!             Some(next) => request = next,
//!             None => break,
//!         }
//!     }
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use docpage_core::{
    backend, config, cursor, error, id, keyset, mapper, page, query, repository, selector, sort, store,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docpage_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docpage_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
