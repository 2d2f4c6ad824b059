//! MongoDB backend implementation for docpage.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait.
//! Selectors, sort documents and aggregation pipelines are already in MongoDB's own
//! dialect, so they reach the server untouched; driver failures are classified into
//! the repository error taxonomy.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docpage = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use docpage::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStore::builder("mongodb://localhost:27017", "my_database")
//!         .app_name("inventory")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod store;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
