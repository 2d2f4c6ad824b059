//! Keyset ("seek") predicates for continuing after a reference document.
//!
//! For a compiled order `[(f1, d1), ..., (fn, dn)]` and reference values
//! `v1..vn`, a document sorts strictly after the reference iff it satisfies one of
//! `n` clauses, clause `i` being
//!
//! ```text
//! f1 == v1 AND ... AND f(i-1) == v(i-1) AND fi (> if di is ascending, else <) vi
//! ```
//!
//! The clauses are mutually exclusive, and because the order ends with the
//! primary key their union is exactly the set of documents after the reference.
//!
//! Missing and null values sort before every other value, but range operators
//! never match across types, so null needs its own clauses:
//!
//! * ascending from a null reference, every non-null value comes next (`$ne: null`);
//! * descending from a null reference, only the later keys can advance, so the
//!   strict clause is dropped;
//! * descending from a non-null reference, the nulls still follow, matched by an
//!   extra `fi == null` clause appended after the `n` regular ones.
//!
//! Values of a type other than the reference's are otherwise not reached: a
//! sort field is expected to hold one type (or null) across the collection.

use bson::{Bson, Document, doc};

use crate::{
    error::RepositoryResult,
    id::NATIVE_ID_FIELD,
    query::{OR, lookup_path, push_conjunct},
    sort::{SortDirection, SortOrder},
};

/// Builds the disjunction selecting documents strictly after `reference` under `order`.
///
/// A sort field missing from the reference compares as `null`.
pub fn after(order: &SortOrder, reference: &Document) -> Document {
    let keys = order.keys();
    let values: Vec<Bson> = keys
        .iter()
        .map(|key| lookup_path(reference, &key.field).cloned().unwrap_or(Bson::Null))
        .collect();

    let prefix = |i: usize| {
        let mut clause = Document::new();
        for (key, value) in keys[..i].iter().zip(&values) {
            clause.insert(key.field.clone(), doc! { "$eq": value.clone() });
        }
        clause
    };

    let mut clauses = Vec::with_capacity(keys.len() + 1);
    let mut null_tails = Vec::new();

    for (i, (key, value)) in keys.iter().zip(&values).enumerate() {
        let is_null = matches!(value, Bson::Null);
        let strict = match (key.direction, is_null) {
            (SortDirection::Asc, false) => Some(doc! { "$gt": value.clone() }),
            (SortDirection::Asc, true) => Some(doc! { "$ne": Bson::Null }),
            (SortDirection::Desc, false) => Some(doc! { "$lt": value.clone() }),
            (SortDirection::Desc, true) => None,
        };

        if let Some(strict) = strict {
            let mut clause = prefix(i);
            clause.insert(key.field.clone(), strict);
            clauses.push(Bson::Document(clause));
        }

        if key.direction == SortDirection::Desc && !is_null && key.field != NATIVE_ID_FIELD {
            let mut clause = prefix(i);
            clause.insert(key.field.clone(), doc! { "$eq": Bson::Null });
            null_tails.push(Bson::Document(clause));
        }
    }

    clauses.extend(null_tails);

    doc! { OR: clauses }
}

/// Narrows `selector` to documents after `reference`.
///
/// The predicate is added as its own `$and` member, so a caller `$or` in the
/// selector is preserved rather than overwritten.
pub fn continue_after(selector: &mut Document, order: &SortOrder, reference: &Document) -> RepositoryResult<()> {
    push_conjunct(selector, after(order, reference))
}
