//! Per-collection repository configuration.
//!
//! A [`RepositoryConfig`] can be built in code or deserialized from any serde
//! format; omitted fields take their defaults.
//!
//! ```ignore
//! use docpage::config::RepositoryConfig;
//!
//! let config = RepositoryConfig::builder("products")
//!     .searchable_fields(["name", "description"])
//!     .max_page_size(100)
//!     .build();
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    error::{RepositoryError, RepositoryResult},
    page::DEFAULT_PAGE_SIZE,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Name of the backing collection.
    pub collection: String,
    /// Name of the identifier field in application models.
    pub id_field: String,
    /// Field holding the ownership scope value.
    pub scope_field: String,
    /// Fields matched by free-text search. Empty disables search.
    pub searchable_fields: Vec<String>,
    /// Page size used when a request asks for none.
    pub default_page_size: usize,
    /// Upper bound on the page size; larger requests are clamped.
    pub max_page_size: Option<usize>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            collection: String::new(),
            id_field: "id".to_string(),
            scope_field: "userId".to_string(),
            searchable_fields: Vec::new(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: None,
        }
    }
}

impl RepositoryConfig {
    pub fn new(collection: impl Into<String>) -> Self {
        Self { collection: collection.into(), ..Self::default() }
    }

    pub fn builder(collection: impl Into<String>) -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::new(collection)
    }

    /// Resolves a requested page size against the configured defaults and cap.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidArgument`] for a zero limit.
    pub fn page_size(&self, requested: Option<usize>) -> RepositoryResult<usize> {
        let limit = requested.unwrap_or(self.default_page_size);

        if limit == 0 {
            return Err(RepositoryError::InvalidArgument("page limit must be at least 1".to_string()));
        }

        Ok(match self.max_page_size {
            Some(max) => limit.min(max),
            None => limit,
        })
    }

    /// Checks the configuration for values no repository can work with.
    pub fn validate(&self) -> RepositoryResult<()> {
        if self.collection.is_empty() {
            return Err(RepositoryError::InvalidArgument("collection name must not be empty".to_string()));
        }
        if self.id_field.is_empty() || self.scope_field.is_empty() {
            return Err(RepositoryError::InvalidArgument("id and scope field names must not be empty".to_string()));
        }
        if self.default_page_size == 0 || self.max_page_size == Some(0) {
            return Err(RepositoryError::InvalidArgument("page sizes must be at least 1".to_string()));
        }

        Ok(())
    }
}

pub struct RepositoryConfigBuilder {
    config: RepositoryConfig,
}

impl RepositoryConfigBuilder {
    pub fn new(collection: impl Into<String>) -> Self {
        Self { config: RepositoryConfig::new(collection) }
    }

    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.config.id_field = field.into();
        self
    }

    pub fn scope_field(mut self, field: impl Into<String>) -> Self {
        self.config.scope_field = field.into();
        self
    }

    pub fn searchable_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.config.searchable_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_page_size(mut self, size: usize) -> Self {
        self.config.default_page_size = size;
        self
    }

    pub fn max_page_size(mut self, size: usize) -> Self {
        self.config.max_page_size = Some(size);
        self
    }

    pub fn build(self) -> RepositoryConfig {
        self.config
    }
}
