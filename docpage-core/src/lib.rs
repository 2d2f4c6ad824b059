//! Owner-scoped repositories with keyset pagination over document databases.
//!
//! This crate is the core of the docpage project and provides:
//!
//! - **Store backend abstraction** ([`backend`]) - The native operations a backend must offer
//! - **Repositories** ([`repository`]) - Typed CRUD, counting and aggregation within an ownership scope
//! - **Selectors** ([`selector`], [`query`]) - Scoped, searchable selectors in the native dialect
//! - **Sorting and keyset pagination** ([`sort`], [`keyset`], [`cursor`], [`page`]) - Stable page walks
//! - **Mapping** ([`mapper`], [`id`]) - Conversion between stored documents and models
//! - **Configuration** ([`config`]) - Per-collection settings
//! - **Error handling** ([`error`]) - The error taxonomy shared by every backend
//!
//! # Example
//!
//! ```ignore
//! use docpage::prelude::*;
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
//! let store = DocumentStore::new(InMemoryStore::new());
//! let products = store.serde_repository::<Product>(RepositoryConfig::new("products"))?;
//! let page = products.read_all(None, None, &[Sort::asc("price")], &Pagination::new(20)).await?;
//! ```

pub mod backend;
pub mod config;
pub mod cursor;
pub mod error;
pub mod id;
pub mod keyset;
pub mod mapper;
pub mod page;
pub mod query;
pub mod repository;
pub mod selector;
pub mod sort;
pub mod store;
