//! Sort specifications and their compilation into a total native order.
//!
//! Keyset pagination is only correct under an order that never ties, so
//! [`SortOrder::compile`] always ends the order with the primary key.

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::{
    error::{RepositoryError, RepositoryResult},
    id::NATIVE_ID_FIELD,
};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

impl SortDirection {
    /// The native encoding: `1` for ascending, `-1` for descending.
    pub fn as_native(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }

    /// Parses a native direction value (`1`/`-1`, or `"asc"`/`"desc"`).
    pub fn from_native(value: &Bson) -> RepositoryResult<Self> {
        match value {
            Bson::Int32(1) | Bson::Int64(1) => Ok(SortDirection::Asc),
            Bson::Int32(-1) | Bson::Int64(-1) => Ok(SortDirection::Desc),
            Bson::Double(d) if *d == 1.0 => Ok(SortDirection::Asc),
            Bson::Double(d) if *d == -1.0 => Ok(SortDirection::Desc),
            Bson::String(s) if s.eq_ignore_ascii_case("asc") => Ok(SortDirection::Asc),
            Bson::String(s) if s.eq_ignore_ascii_case("desc") => Ok(SortDirection::Desc),
            other => Err(RepositoryError::InvalidArgument(format!("invalid sort direction {other}"))),
        }
    }
}

/// A single (field, direction) sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Desc }
    }
}

/// A compiled, tie-free sort order in native field names.
///
/// The last key is always the primary key. Order is significant: the keyset
/// predicate walks the keys from first to last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    keys: Vec<Sort>,
}

impl SortOrder {
    /// Compiles a caller sort specification.
    ///
    /// `id_field` is the application's name for the identifier; it and the native
    /// primary-key name both refer to the primary key. A field listed twice keeps
    /// its first direction. If the primary key is absent it is appended ascending;
    /// if present, it keeps the caller's direction and is moved to the end so it
    /// breaks ties only after every other key.
    pub fn compile(spec: &[Sort], id_field: &str) -> Self {
        let mut keys: Vec<Sort> = Vec::with_capacity(spec.len() + 1);
        let mut id_key = None;

        for sort in spec {
            let field = if sort.field == id_field { NATIVE_ID_FIELD } else { sort.field.as_str() };

            if field == NATIVE_ID_FIELD {
                id_key.get_or_insert(sort.direction);
            } else if !keys.iter().any(|k| k.field == field) {
                keys.push(Sort { field: field.to_string(), direction: sort.direction });
            }
        }

        keys.push(Sort {
            field: NATIVE_ID_FIELD.to_string(),
            direction: id_key.unwrap_or(SortDirection::Asc),
        });

        Self { keys }
    }

    /// Parses a native sort document such as `{ "price": -1, "name": 1 }` and compiles it.
    pub fn from_document(spec: &Document, id_field: &str) -> RepositoryResult<Self> {
        let keys = spec
            .iter()
            .map(|(field, direction)| {
                Ok(Sort { field: field.clone(), direction: SortDirection::from_native(direction)? })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(Self::compile(&keys, id_field))
    }

    pub fn keys(&self) -> &[Sort] {
        &self.keys
    }

    /// Renders the order as a native sort document, preserving key order.
    pub fn to_document(&self) -> Document {
        self.keys
            .iter()
            .map(|k| (k.field.clone(), Bson::Int32(k.direction.as_native())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    #[test]
    fn test_appends_tie_breaker() {
        let order = SortOrder::compile(&[Sort::asc("price")], "id");
        assert_eq!(order.to_document(), doc! { "price": 1, "_id": 1 });
    }

    #[test]
    fn test_empty_spec_sorts_by_id() {
        let order = SortOrder::compile(&[], "id");
        assert_eq!(order.keys(), &[Sort::asc("_id")]);
    }

    #[test]
    fn test_caller_direction_on_id_is_kept() {
        let order = SortOrder::compile(&[Sort::desc("id"), Sort::asc("price")], "id");
        assert_eq!(order.keys(), &[Sort::asc("price"), Sort::desc("_id")]);

        let order = SortOrder::compile(&[Sort::asc("name"), Sort::desc("_id")], "id");
        assert_eq!(order.keys(), &[Sort::asc("name"), Sort::desc("_id")]);
    }

    #[test]
    fn test_compile_is_idempotent() {
        let spec = [Sort::asc("category"), Sort::desc("price")];
        let once = SortOrder::compile(&spec, "id");
        let twice = SortOrder::compile(once.keys(), "id");
        assert_eq!(once, twice);
        assert_eq!(twice.keys().iter().filter(|k| k.field == "_id").count(), 1);
    }

    #[test]
    fn test_duplicate_field_keeps_first() {
        let order = SortOrder::compile(&[Sort::asc("price"), Sort::desc("price")], "id");
        assert_eq!(order.keys(), &[Sort::asc("price"), Sort::asc("_id")]);
    }

    #[test]
    fn test_from_document() {
        let order = SortOrder::from_document(&doc! { "category": 1, "price": -1 }, "id").unwrap();
        assert_eq!(order.to_document(), doc! { "category": 1, "price": -1, "_id": 1 });

        assert!(SortOrder::from_document(&doc! { "price": 2 }, "id").is_err());
    }
}
