//! Compiles ownership scope, free-text search and a raw filter into one selector.
//!
//! The raw filter is trusted native dialect and is merged verbatim, except for the
//! reserved search key [`SEARCH_KEY`]. A search term expands to a case-insensitive
//! partial match over the configured searchable fields, OR-ed together and AND-ed
//! with the rest of the filter, so searching narrows a result set and never widens
//! it.

use bson::{Bson, Document, doc};

use crate::{
    error::{RepositoryError, RepositoryResult},
    query::{OR, push_conjunct},
};

/// The pseudo-field carrying a free-text search term.
pub const SEARCH_KEY: &str = "q";

#[derive(Debug, Clone, Default)]
pub struct SelectorCompiler<'a> {
    scope_field: &'a str,
    searchable_fields: &'a [String],
}

impl<'a> SelectorCompiler<'a> {
    pub fn new(scope_field: &'a str, searchable_fields: &'a [String]) -> Self {
        Self { scope_field, searchable_fields }
    }

    /// Builds the native selector.
    ///
    /// The ownership scope is applied last and replaces any caller constraint on
    /// the scope field.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidArgument`] if the search term is not a
    /// string, if a non-empty term is given while no searchable fields are
    /// configured, or if the filter's `$and` is not an array.
    pub fn compile(&self, scope: Option<&Bson>, filter: Option<&Document>) -> RepositoryResult<Document> {
        let mut selector = filter.cloned().unwrap_or_default();

        if let Some(term) = selector.remove(SEARCH_KEY) {
            if let Some(search) = self.search_clause(&term)? {
                push_conjunct(&mut selector, search)?;
            }
        }

        if let Some(scope) = scope {
            selector.insert(self.scope_field, scope.clone());
        }

        Ok(selector)
    }

    fn search_clause(&self, term: &Bson) -> RepositoryResult<Option<Document>> {
        let term = match term {
            Bson::String(s) => s.trim(),
            Bson::Null => return Ok(None),
            other => {
                return Err(RepositoryError::InvalidArgument(format!("search term must be a string, got {other}")));
            }
        };

        if term.is_empty() {
            return Ok(None);
        }

        if self.searchable_fields.is_empty() {
            return Err(RepositoryError::InvalidArgument(
                "free-text search is not supported: no searchable fields are configured".to_string(),
            ));
        }

        let pattern = regex::escape(term);

        Ok(Some(doc! {
            OR: self
                .searchable_fields
                .iter()
                .map(|field| doc! { field: { "$regex": pattern.as_str(), "$options": "i" } })
                .collect::<Vec<_>>(),
        }))
    }
}
