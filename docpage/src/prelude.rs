//! Convenient re-exports of commonly used types from docpage.
//!
//! ```ignore
//! use docpage::prelude::*;
//! ```

pub use bson::{Bson, Document, doc, oid::ObjectId};

pub use docpage_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    config::{RepositoryConfig, RepositoryConfigBuilder},
    error::{RepositoryError, RepositoryResult},
    mapper::{DocumentMapper, FnCodec, ModelCodec, SerdeCodec},
    page::{Page, Pagination, DEFAULT_PAGE_SIZE},
    query::{FindQuery, SelectorVisitor},
    repository::Repository,
    sort::{Sort, SortDirection},
    store::DocumentStore,
};
