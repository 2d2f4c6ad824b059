//! In-memory document storage backend for docpage.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It evaluates the native selector dialect itself, which makes it a drop-in test double
//! for a real document database.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Native selectors** - Comparison, membership, logical and regex operators on dotted paths
//! - **Aggregation subset** - `$match`, `$sort`, `$skip`, `$limit` and `$count` stages
//! - **Readiness toggle** - Simulate a store that is not connected yet
//!
//! # Quick Start
//!
//! ```ignore
//! use docpage::{DocumentStore, RepositoryConfig, memory::InMemoryStore};
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let users = store.serde_repository::<User>(RepositoryConfig::new("users"))?;
//! let alice = users.create(&User { id: String::new(), name: "Alice".into() }, None).await?;
//! ```

pub mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
