//! Native find queries and a visitor over the selector dialect.
//!
//! Selectors are plain [`bson::Document`]s in the `$`-operator dialect:
//!
//! ```ignore
//! use bson::doc;
//!
//! let selector = doc! {
//!     "userId": "u1",
//!     "price": { "$gte": 10, "$lt": 50 },
//!     "$or": [{ "category": "A" }, { "category": "B" }],
//! };
//! ```
//!
//! [`FindQuery`] pairs a selector with a sort document and a limit. Backends that
//! cannot hand the selector to a native engine evaluate it themselves through
//! [`SelectorVisitor`], which splits a selector into logical and field clauses.

use bson::{Bson, Document};

use crate::error::{RepositoryError, RepositoryResult};

pub const AND: &str = "$and";
pub const OR: &str = "$or";
pub const NOR: &str = "$nor";

/// A structured find request handed to a backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    /// Selector documents must match.
    pub selector: Document,
    /// Native sort document (`field: 1 | -1`), applied in key order.
    pub sort: Option<Document>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl FindQuery {
    pub fn new(selector: Document) -> Self {
        Self { selector, sort: None, limit: None }
    }

    pub fn builder() -> FindQueryBuilder {
        FindQueryBuilder::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindQueryBuilder {
    query: FindQuery,
}

impl FindQueryBuilder {
    pub fn new() -> Self {
        Self { query: FindQuery::default() }
    }

    pub fn selector(mut self, selector: Document) -> Self {
        self.query.selector = selector;
        self
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.query.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn build(self) -> FindQuery {
        self.query
    }
}

/// Resolves a dotted path (`"address.city"`) inside a document.
pub fn lookup_path<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;

    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            Bson::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Appends `clause` to the top-level `$and` list of `selector`, creating the list
/// if needed. Clauses added this way narrow the selector without touching any of
/// the caller's keys, including a caller-supplied `$or`.
pub fn push_conjunct(selector: &mut Document, clause: Document) -> RepositoryResult<()> {
    match selector.get_mut(AND) {
        Some(Bson::Array(clauses)) => clauses.push(Bson::Document(clause)),
        Some(other) => {
            return Err(RepositoryError::InvalidArgument(format!("{AND} must be an array, got {other}")));
        }
        None => {
            selector.insert(AND, vec![Bson::Document(clause)]);
        }
    }

    Ok(())
}

/// Walks a selector in the native dialect.
///
/// [`visit_selector`](SelectorVisitor::visit_selector) treats every top-level key
/// as an implicitly AND-ed clause: `$and`, `$or` and `$nor` dispatch to their
/// logical visitors; any other key is a field path with its condition.
pub trait SelectorVisitor {
    type Output;
    type Error: Into<RepositoryError>;

    fn visit_and(&mut self, selectors: &[Document]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, selectors: &[Document]) -> Result<Self::Output, Self::Error>;
    fn visit_nor(&mut self, selectors: &[Document]) -> Result<Self::Output, Self::Error>;
    fn visit_field(&mut self, field: &str, condition: &Bson) -> Result<Self::Output, Self::Error>;

    /// Combines the outputs of the top-level clauses of one selector.
    fn combine(&mut self, outputs: Vec<Self::Output>) -> Result<Self::Output, Self::Error>;

    fn visit_selector(&mut self, selector: &Document) -> Result<Self::Output, Self::Error>
    where
        Self::Error: From<RepositoryError>,
    {
        let mut outputs = Vec::with_capacity(selector.len());

        for (key, value) in selector {
            let output = match key.as_str() {
                AND => self.visit_and(&logical_operands(key, value)?)?,
                OR => self.visit_or(&logical_operands(key, value)?)?,
                NOR => self.visit_nor(&logical_operands(key, value)?)?,
                op if op.starts_with('$') => {
                    return Err(RepositoryError::InvalidArgument(format!("unsupported top-level operator {op}")).into());
                }
                field => self.visit_field(field, value)?,
            };
            outputs.push(output);
        }

        self.combine(outputs)
    }
}

fn logical_operands(key: &str, value: &Bson) -> RepositoryResult<Vec<Document>> {
    match value {
        Bson::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| match item {
                Bson::Document(doc) => Ok(doc.clone()),
                other => Err(RepositoryError::InvalidArgument(format!("{key} operand must be a document, got {other}"))),
            })
            .collect(),
        _ => Err(RepositoryError::InvalidArgument(format!("{key} must be a non-empty array"))),
    }
}
