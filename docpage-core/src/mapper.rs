//! Conversion between native documents and typed application models.
//!
//! Models are converted through a [`ModelCodec`], a decoder/encoder pair chosen
//! per model type. [`SerdeCodec`] covers any serde type; [`FnCodec`] wraps two
//! plain functions for hand-written mappings. [`DocumentMapper`] sits on top and
//! handles the primary key: stored documents carry it as an object id under
//! `_id`, models carry it as a string under the configured identifier field.
//!
//! # Example
//!
//! ```ignore
//! use docpage::mapper::{DocumentMapper, SerdeCodec};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Item {
//!     #[serde(default)]
//!     pub id: String,
//!     pub name: String,
//! }
//!
//! let mapper = DocumentMapper::new("id", SerdeCodec::<Item>::new());
//! let item = mapper.to_model(&stored)?;
//! ```

use bson::{Bson, Document, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Serialize, de::DeserializeOwned};
use std::{fmt, marker::PhantomData};

use crate::{
    error::{RepositoryError, RepositoryResult},
    id::{self, NATIVE_ID_FIELD},
};

/// Decoder/encoder pair between native documents and a model type.
pub trait ModelCodec<T>: Send + Sync {
    /// Builds a model from a document whose identifier is already a string
    /// under the application identifier field.
    fn decode(&self, document: Document) -> RepositoryResult<T>;

    /// Renders a model as a document. The identifier field, if present, is
    /// stripped by the mapper afterwards.
    fn encode(&self, model: &T) -> RepositoryResult<Document>;
}

/// Codec for any type that implements serde's traits, going through BSON.
pub struct SerdeCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeCodec<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for SerdeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SerdeCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeCodec").finish()
    }
}

impl<T> ModelCodec<T> for SerdeCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn decode(&self, document: Document) -> RepositoryResult<T> {
        Ok(deserialize_from_bson(Bson::Document(document))?)
    }

    fn encode(&self, model: &T) -> RepositoryResult<Document> {
        match serialize_to_bson(model)? {
            Bson::Document(document) => Ok(document),
            other => Err(RepositoryError::Serialization(format!(
                "model must serialize to a document, got {:?}",
                other.element_type()
            ))),
        }
    }
}

/// Codec made of two plain functions.
pub struct FnCodec<D, E> {
    decode: D,
    encode: E,
}

impl<D, E> FnCodec<D, E> {
    pub fn new(decode: D, encode: E) -> Self {
        Self { decode, encode }
    }
}

impl<T, D, E> ModelCodec<T> for FnCodec<D, E>
where
    D: Fn(Document) -> RepositoryResult<T> + Send + Sync,
    E: Fn(&T) -> RepositoryResult<Document> + Send + Sync,
{
    fn decode(&self, document: Document) -> RepositoryResult<T> {
        (self.decode)(document)
    }

    fn encode(&self, model: &T) -> RepositoryResult<Document> {
        (self.encode)(model)
    }
}

/// Maps stored documents to models and back, renaming the primary key.
#[derive(Debug, Clone)]
pub struct DocumentMapper<T, C> {
    id_field: String,
    codec: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C: ModelCodec<T>> DocumentMapper<T, C> {
    pub fn new(id_field: impl Into<String>, codec: C) -> Self {
        Self { id_field: id_field.into(), codec, _marker: PhantomData }
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Converts a stored document into a model.
    ///
    /// Works on a copy: `document` is left untouched, so it can still serve as a
    /// cursor reference afterwards.
    pub fn to_model(&self, document: &Document) -> RepositoryResult<T> {
        let mut copy = document.clone();

        if let Some(native) = copy.remove(NATIVE_ID_FIELD) {
            let id = match native {
                Bson::ObjectId(oid) => id::from_native(&oid),
                other => {
                    return Err(RepositoryError::Serialization(format!(
                        "stored primary key is not an object id: {other}"
                    )));
                }
            };
            copy.insert(self.id_field.clone(), id);
        }

        self.codec.decode(copy)
    }

    /// Converts a model into a document body without its identifier.
    pub fn to_document(&self, model: &T) -> RepositoryResult<Document> {
        let mut document = self.codec.encode(model)?;
        document.remove(&self.id_field);
        document.remove(NATIVE_ID_FIELD);

        Ok(document)
    }

    /// Converts a body that was just written under `id` into a model.
    pub fn to_model_with_id(&self, mut body: Document, id: &bson::oid::ObjectId) -> RepositoryResult<T> {
        body.insert(NATIVE_ID_FIELD, *id);
        self.to_model(&body)
    }
}
