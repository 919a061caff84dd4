//! In-memory implementation of DocumentStore

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::ports::{merge_objects, Document, DocumentPage, DocumentStore, ListQuery};
use crate::error::DomainError;

type Collection = HashMap<String, Document>;

/// Document store backed by a map of collections.
/// Contents are lost when the process exits.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn require_object(data: &Value) -> Result<(), DomainError> {
    if data.is_object() {
        Ok(())
    } else {
        Err(DomainError::Validation(
            "documents must be JSON objects".to_string(),
        ))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DomainError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn list(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> Result<DocumentPage, DomainError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(DocumentPage {
                documents: Vec::new(),
                total: 0,
            });
        };

        let mut matching: Vec<&Document> = docs
            .values()
            .filter(|doc| query.filter.as_ref().map_or(true, |f| f.matches(&doc.data)))
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = matching.len() as u64;
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        let documents = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(DocumentPage { documents, total })
    }

    async fn insert(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Document, DomainError> {
        require_object(&data)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(DomainError::AlreadyExists(format!(
                "{}/{} already exists",
                collection, id
            )));
        }

        let now = Utc::now();
        let document = Document {
            id: id.to_string(),
            data,
            created_at: now,
            updated_at: now,
        };
        docs.insert(id.to_string(), document.clone());
        Ok(document)
    }

    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<Document, DomainError> {
        require_object(&data)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        let now = Utc::now();
        let created_at = docs.get(id).map_or(now, |existing| existing.created_at);
        let document = Document {
            id: id.to_string(),
            data,
            created_at,
            updated_at: now,
        };
        docs.insert(id.to_string(), document.clone());
        Ok(document)
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
    ) -> Result<Document, DomainError> {
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| DomainError::NotFound(format!("{}/{} not found", collection, id)))?;

        merge_objects(&mut document.data, patch)?;
        document.updated_at = Utc::now();
        Ok(document.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), DomainError> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(format!("{}/{} not found", collection, id)))
    }
}
