//! Selector evaluation and value ordering for in-memory documents.
//!
//! [`DocumentEvaluator`] walks a selector through the core
//! [`SelectorVisitor`] and decides whether one document matches it.
//! [`Comparable`] gives stored values the ordering sorts and range operators
//! rely on: values of different types order by type first, and range operators
//! only match values of the same type.

use std::cmp::Ordering;

use bson::{Bson, DateTime, Document, oid::ObjectId};
use regex::RegexBuilder;

use docpage_core::{
    error::{RepositoryError, RepositoryResult},
    query::{SelectorVisitor, lookup_path},
};

/// Borrowed, comparable view of a BSON value.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Comparable<'a> {
    Null,
    /// Every numeric type, widened to f64
    Number(f64),
    String(&'a str),
    Map(&'a Document),
    Array(&'a [Bson]),
    ObjectId(ObjectId),
    Bool(bool),
    DateTime(DateTime),
    Other,
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null | Bson::Undefined => Comparable::Null,
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Document(doc) => Comparable::Map(doc),
            Bson::Array(items) => Comparable::Array(items),
            Bson::ObjectId(oid) => Comparable::ObjectId(*oid),
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            _ => Comparable::Other,
        }
    }
}

impl<'a> From<Option<&'a Bson>> for Comparable<'a> {
    fn from(bson: Option<&'a Bson>) -> Self {
        bson.map(Comparable::from).unwrap_or(Comparable::Null)
    }
}

impl Comparable<'_> {
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::ObjectId(_) => 5,
            Comparable::Bool(_) => 6,
            Comparable::DateTime(_) => 7,
            Comparable::Other => 8,
        }
    }

    /// Total order used for sorting: type rank first, then value.
    pub(crate) fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Comparable::String(a), Comparable::String(b)) => a.cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.bytes().cmp(&b.bytes()),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.cmp(b),
            (Comparable::Array(a), Comparable::Array(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| Comparable::from(x).total_cmp(&Comparable::from(y)))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Comparable::Map(a), Comparable::Map(b)) => a
                .iter()
                .zip(b.iter())
                .map(|((ka, va), (kb, vb))| {
                    ka.cmp(kb)
                        .then_with(|| Comparable::from(va).total_cmp(&Comparable::from(vb)))
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// Ordering used by range operators: values of different types never compare.
    fn bracketed_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Other, _) | (_, Comparable::Other) => None,
            _ if self.rank() == other.rank() => Some(self.total_cmp(other)),
            _ => None,
        }
    }

    fn equals(&self, other: &Self) -> bool {
        self.bracketed_cmp(other) == Some(Ordering::Equal)
    }
}

/// Decides whether a single document matches a selector.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, selector: &Document) -> RepositoryResult<bool> {
        self.visit_selector(selector)
    }

    /// Returns copies of the documents matching `selector`, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidArgument`] for a selector using an
    /// unknown or malformed operator.
    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        selector: &Document,
    ) -> RepositoryResult<Vec<Document>> {
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::new(document).evaluate(selector)? {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }

    fn evaluate_operator(&self, value: Option<&Bson>, op: &str, operand: &Bson, condition: &Document) -> RepositoryResult<bool> {
        Ok(match op {
            "$eq" => matches_value(value, |v| v.equals(&Comparable::from(operand))) || is_null_match(value, operand),
            "$ne" => !(matches_value(value, |v| v.equals(&Comparable::from(operand))) || is_null_match(value, operand)),
            "$gt" => matches_range(value, operand, Ordering::is_gt),
            "$gte" => matches_range(value, operand, Ordering::is_ge),
            "$lt" => matches_range(value, operand, Ordering::is_lt),
            "$lte" => matches_range(value, operand, Ordering::is_le),
            "$in" => in_list(value, operand)?,
            "$nin" => !in_list(value, operand)?,
            "$exists" => value.is_some() == truthy(operand),
            "$regex" => {
                let options = match condition.get("$options") {
                    Some(Bson::String(options)) => options.as_str(),
                    Some(other) => {
                        return Err(RepositoryError::InvalidArgument(format!("$options must be a string, got {other}")));
                    }
                    None => "",
                };
                matches_regex(value, operand, options)?
            }
            "$options" => true,
            "$not" => match operand {
                Bson::Document(inner) => !self.evaluate_condition(value, inner)?,
                Bson::RegularExpression(_) => !matches_regex(value, operand, "")?,
                other => {
                    return Err(RepositoryError::InvalidArgument(format!("$not needs an operator document, got {other}")));
                }
            },
            other => {
                return Err(RepositoryError::InvalidArgument(format!("unsupported operator {other}")));
            }
        })
    }

    fn evaluate_condition(&self, value: Option<&Bson>, condition: &Document) -> RepositoryResult<bool> {
        for (op, operand) in condition {
            if !self.evaluate_operator(value, op, operand, condition)? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

impl SelectorVisitor for DocumentEvaluator<'_> {
    type Output = bool;
    type Error = RepositoryError;

    fn visit_and(&mut self, selectors: &[Document]) -> RepositoryResult<bool> {
        for selector in selectors {
            if !self.visit_selector(selector)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, selectors: &[Document]) -> RepositoryResult<bool> {
        for selector in selectors {
            if self.visit_selector(selector)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_nor(&mut self, selectors: &[Document]) -> RepositoryResult<bool> {
        Ok(!self.visit_or(selectors)?)
    }

    fn visit_field(&mut self, field: &str, condition: &Bson) -> RepositoryResult<bool> {
        let value = lookup_path(self.document, field);

        match condition {
            Bson::Document(operators) if is_operator_document(operators) => self.evaluate_condition(value, operators),
            Bson::RegularExpression(_) => matches_regex(value, condition, ""),
            literal => Ok(
                matches_value(value, |v| v.equals(&Comparable::from(literal))) || is_null_match(value, literal)
            ),
        }
    }

    fn combine(&mut self, outputs: Vec<bool>) -> RepositoryResult<bool> {
        Ok(outputs.into_iter().all(|matched| matched))
    }
}

fn is_operator_document(condition: &Document) -> bool {
    condition.keys().next().is_some_and(|key| key.starts_with('$'))
}

/// A missing field matches an equality test against null.
fn is_null_match(value: Option<&Bson>, operand: &Bson) -> bool {
    matches!(operand, Bson::Null) && matches!(value, None | Some(Bson::Null))
}

/// Applies `predicate` to the value itself and, for arrays, to each element.
fn matches_value(value: Option<&Bson>, predicate: impl Fn(&Comparable<'_>) -> bool) -> bool {
    let Some(value) = value else {
        return false;
    };

    if predicate(&Comparable::from(value)) {
        return true;
    }

    match value {
        Bson::Array(items) => items.iter().any(|item| predicate(&Comparable::from(item))),
        _ => false,
    }
}

fn matches_range(value: Option<&Bson>, operand: &Bson, accept: fn(Ordering) -> bool) -> bool {
    let bound = Comparable::from(operand);
    matches_value(value, |v| v.bracketed_cmp(&bound).is_some_and(accept))
}

fn in_list(value: Option<&Bson>, operand: &Bson) -> RepositoryResult<bool> {
    match operand {
        Bson::Array(candidates) => Ok(candidates.iter().any(|candidate| {
            matches_value(value, |v| v.equals(&Comparable::from(candidate))) || is_null_match(value, candidate)
        })),
        other => Err(RepositoryError::InvalidArgument(format!("$in/$nin need an array, got {other}"))),
    }
}

fn matches_regex(value: Option<&Bson>, operand: &Bson, options: &str) -> RepositoryResult<bool> {
    let (pattern, options) = match operand {
        Bson::String(pattern) => (pattern.as_str(), options.to_string()),
        Bson::RegularExpression(regex) => (regex.pattern.as_str(), format!("{}{options}", regex.options.as_str())),
        other => {
            return Err(RepositoryError::InvalidArgument(format!("$regex must be a string, got {other}")));
        }
    };

    let regex = RegexBuilder::new(pattern)
        .case_insensitive(options.contains('i'))
        .multi_line(options.contains('m'))
        .dot_matches_new_line(options.contains('s'))
        .ignore_whitespace(options.contains('x'))
        .build()
        .map_err(|e| RepositoryError::InvalidArgument(format!("invalid regular expression: {e}")))?;

    Ok(matches_value(value, |v| match v {
        Comparable::String(text) => regex.is_match(text),
        _ => false,
    }))
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(flag) => *flag,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    fn matches(document: &Document, selector: Document) -> bool {
        DocumentEvaluator::new(document).evaluate(&selector).unwrap()
    }

    #[test]
    fn test_implicit_equality_and_ranges() {
        let product = doc! { "name": "pro", "price": 20, "owner": { "id": "u1" }, "tags": ["a", "b"] };

        assert!(matches(&product, doc! { "name": "pro", "price": 20.0 }));
        assert!(matches(&product, doc! { "owner.id": "u1", "tags": "b" }));
        assert!(matches(&product, doc! { "price": { "$gt": 10, "$lte": 20 } }));
        assert!(!matches(&product, doc! { "price": { "$gt": "10" } }));
        assert!(!matches(&product, doc! { "price": { "$lt": 20 } }));
    }

    #[test]
    fn test_logical_operators() {
        let product = doc! { "category": "A", "price": 5 };

        assert!(matches(&product, doc! { "$or": [{ "category": "B" }, { "price": 5 }] }));
        assert!(!matches(&product, doc! { "$and": [{ "category": "A" }, { "price": 6 }] }));
        assert!(matches(&product, doc! { "$nor": [{ "category": "B" }] }));
        assert!(matches(&product, doc! { "price": { "$not": { "$gt": 10 } } }));
    }

    #[test]
    fn test_membership_and_existence() {
        let product = doc! { "category": "A" };

        assert!(matches(&product, doc! { "category": { "$in": ["A", "B"] } }));
        assert!(matches(&product, doc! { "category": { "$nin": ["C"] } }));
        assert!(matches(&product, doc! { "price": { "$exists": false } }));
        assert!(matches(&product, doc! { "price": null }));
        assert!(matches(&product, doc! { "category": { "$ne": "B" } }));
    }

    #[test]
    fn test_case_insensitive_regex() {
        let product = doc! { "name": "Pro Widget" };

        assert!(matches(&product, doc! { "name": { "$regex": "widget", "$options": "i" } }));
        assert!(!matches(&product, doc! { "name": { "$regex": "widget" } }));
    }

    #[test]
    fn test_rejects_unknown_operator() {
        let result = DocumentEvaluator::new(&doc! { "a": 1 }).evaluate(&doc! { "a": { "$near": 1 } });
        assert!(matches!(result, Err(RepositoryError::InvalidArgument(_))));
    }

    #[test]
    fn test_total_order_ranks_types() {
        let null = Bson::Null;
        let number = Bson::Int32(3);
        let text = Bson::String("a".into());
        let earlier = Bson::ObjectId(ObjectId::from_bytes([0; 12]));
        let later = Bson::ObjectId(ObjectId::from_bytes([1; 12]));

        assert!(Comparable::from(&null).total_cmp(&Comparable::from(&number)).is_lt());
        assert!(Comparable::from(&number).total_cmp(&Comparable::from(&text)).is_lt());
        assert!(Comparable::from(&earlier).total_cmp(&Comparable::from(&later)).is_lt());
    }
}
