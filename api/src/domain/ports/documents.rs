//! Document store port
//!
//! The system of record is a schemaless document database: documents are
//! JSON objects grouped in named collections and addressed by string id.
//! Implementations are provided by adapters (PostgreSQL JSONB, in-memory).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::filter::Filter;
use crate::error::DomainError;

/// A stored document with its bookkeeping timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filtering and pagination for collection listings.
/// Results are ordered newest first.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filter: Option<Filter>,
    pub limit: u64,
    pub offset: u64,
}

impl ListQuery {
    pub fn new(filter: Option<Filter>, limit: u64, offset: u64) -> Self {
        Self {
            filter,
            limit,
            offset,
        }
    }

    /// Every matching document, for internal sweeps
    pub fn all(filter: Option<Filter>) -> Self {
        Self {
            filter,
            limit: u64::MAX,
            offset: 0,
        }
    }
}

/// One page of documents plus the total number of matches
#[derive(Debug, Clone)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    pub total: u64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DomainError>;

    /// List documents matching the query
    async fn list(&self, collection: &str, query: &ListQuery)
        -> Result<DocumentPage, DomainError>;

    /// Create a document; fails with `AlreadyExists` if the id is taken
    async fn insert(&self, collection: &str, id: &str, data: Value)
        -> Result<Document, DomainError>;

    /// Create or fully replace a document
    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<Document, DomainError>;

    /// Shallow-merge `patch` into an existing document's top-level fields
    async fn merge(&self, collection: &str, id: &str, patch: Value)
        -> Result<Document, DomainError>;

    /// Delete a document; fails with `NotFound` if absent
    async fn delete(&self, collection: &str, id: &str) -> Result<(), DomainError>;
}

/// Shallow object merge shared by the adapters: top-level keys of `patch`
/// overwrite those of `target`.
pub fn merge_objects(target: &mut Value, patch: Value) -> Result<(), DomainError> {
    let (Some(target), Value::Object(patch)) = (target.as_object_mut(), patch) else {
        return Err(DomainError::Validation(
            "document patches must be JSON objects".to_string(),
        ));
    };
    for (key, value) in patch {
        target.insert(key, value);
    }
    Ok(())
}
