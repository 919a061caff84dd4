//! Generic CRUD over a typed collection
//!
//! Every collection shares the same lifecycle: documents are decoded into
//! their entity type, normalized and validated before they are written, and
//! listed through the `?where=&page=&limit=` query parameters.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::entities::Entity;
use crate::domain::filter::{parse_filter, Filter};
use crate::domain::ports::{merge_objects, Document, DocumentStore, ListQuery};
use crate::error::{AppError, DomainError};
use crate::response::Paginated;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Fields the service owns; clients cannot set them through a patch
const MANAGED_FIELDS: [&str; 3] = ["id", "createdAt", "updatedAt"];

/// Listing query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "where")]
    pub filter: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ListParams {
    /// 1-based page, at least 1
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`
    pub fn limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Parsed `where` expression; blank means no filter
    pub fn parsed_filter(&self) -> Result<Option<Filter>, AppError> {
        match self.filter.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(expr) => Ok(Some(parse_filter(expr)?)),
        }
    }

    /// Combine the `where` expression with a fixed scope such as `productId=...`
    pub fn to_query(&self, scope: Option<Filter>) -> Result<ListQuery, AppError> {
        let filter = match (scope, self.parsed_filter()?) {
            (Some(scope), Some(user)) => Some(Filter::And(vec![scope, user])),
            (scope, user) => scope.or(user),
        };
        let limit = self.limit();
        Ok(ListQuery::new(filter, limit, (self.page() - 1) * limit))
    }
}

/// CRUD service for one entity type
pub struct ResourceService<T: Entity> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for ResourceService<T> {
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<T: Entity> ResourceService<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub async fn find(&self, id: &str) -> Result<Option<T>, AppError> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: &str) -> Result<T, AppError> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", T::NAME, id)))
    }

    /// One page of entities for the listing endpoints
    pub async fn list(
        &self,
        params: &ListParams,
        scope: Option<Filter>,
    ) -> Result<Paginated<T>, AppError> {
        let query = params.to_query(scope)?;
        let page = self.store.list(T::COLLECTION, &query).await?;
        let items = page
            .documents
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<T>, _>>()?;

        Ok(Paginated {
            items,
            total: page.total,
            page: params.page(),
            limit: params.limit(),
        })
    }

    /// Every entity matching `filter`, newest first
    pub async fn find_all(&self, filter: Option<Filter>) -> Result<Vec<T>, AppError> {
        let page = self
            .store
            .list(T::COLLECTION, &ListQuery::all(filter))
            .await?;
        page.documents.into_iter().map(decode).collect()
    }

    /// First entity whose `field` equals `value`
    pub async fn find_by(&self, field: &str, value: &str) -> Result<Option<T>, AppError> {
        let query = ListQuery::new(Some(Filter::eq(field, value)), 1, 0);
        let page = self.store.list(T::COLLECTION, &query).await?;
        match page.documents.into_iter().next() {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }

    /// Create from a client-supplied JSON object.
    ///
    /// A non-empty string `id` in the body is honored; otherwise a UUID is
    /// assigned. Timestamps are always set by the service.
    pub async fn create(&self, body: Value) -> Result<T, AppError> {
        let Value::Object(mut fields) = body else {
            return Err(AppError::BadRequest(format!(
                "{} body must be a JSON object",
                T::NAME
            )));
        };

        let id = match fields.get("id").and_then(Value::as_str).map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };
        let now = Value::String(Utc::now().to_rfc3339());
        fields.insert("id".to_string(), Value::String(id));
        fields.insert("createdAt".to_string(), now.clone());
        fields.insert("updatedAt".to_string(), now);

        let entity = from_fields::<T>(fields)?;
        self.insert(entity).await
    }

    /// Normalize, validate and insert a typed entity
    pub async fn insert(&self, mut entity: T) -> Result<T, AppError> {
        entity.normalize();
        entity.validate()?;
        self.check_unique(&entity).await?;

        self.store
            .insert(T::COLLECTION, entity.id(), encode(&entity)?)
            .await?;
        tracing::debug!(collection = T::COLLECTION, id = %entity.id(), "Created document");
        Ok(entity)
    }

    /// Apply a partial update: top-level fields of `patch` replace the stored ones
    pub async fn update(&self, id: &str, patch: Value) -> Result<T, AppError> {
        let Value::Object(mut patch) = patch else {
            return Err(AppError::BadRequest(format!(
                "{} update must be a JSON object",
                T::NAME
            )));
        };
        for field in MANAGED_FIELDS {
            patch.remove(field);
        }

        let existing = self.get(id).await?;
        let mut data = encode(&existing)?;
        merge_objects(&mut data, Value::Object(patch))?;

        let Value::Object(fields) = data else {
            return Err(AppError::Internal(format!("{} {} is not an object", T::NAME, id)));
        };
        let mut entity = from_fields::<T>(fields)?;
        entity.normalize();
        entity.validate()?;
        self.check_unique(&entity).await?;

        self.write(entity).await
    }

    /// Replace a stored entity, bumping `updatedAt`
    pub async fn save(&self, entity: T) -> Result<T, AppError> {
        entity.validate()?;
        self.write(entity).await
    }

    /// Shallow-merge raw fields without a full decode, bumping `updatedAt`
    pub async fn patch_fields(&self, id: &str, mut fields: Map<String, Value>) -> Result<T, AppError> {
        fields.insert(
            "updatedAt".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        let doc = self
            .store
            .merge(T::COLLECTION, id, Value::Object(fields))
            .await
            .map_err(|e| match e {
                DomainError::NotFound(_) => {
                    AppError::NotFound(format!("{} {} not found", T::NAME, id))
                }
                e => e.into(),
            })?;
        decode(doc)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.store
            .delete(T::COLLECTION, id)
            .await
            .map_err(|e| match e {
                DomainError::NotFound(_) => {
                    AppError::NotFound(format!("{} {} not found", T::NAME, id))
                }
                e => e.into(),
            })?;
        tracing::debug!(collection = T::COLLECTION, id = %id, "Deleted document");
        Ok(())
    }

    async fn write(&self, entity: T) -> Result<T, AppError> {
        let mut data = encode(&entity)?;
        if let Some(fields) = data.as_object_mut() {
            fields.insert(
                "updatedAt".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
        let doc = self.store.put(T::COLLECTION, entity.id(), data).await?;
        decode(doc)
    }

    async fn check_unique(&self, entity: &T) -> Result<(), AppError> {
        for (field, value) in entity.unique_fields() {
            let query = ListQuery::new(Some(Filter::eq(field, value.as_str())), 2, 0);
            let page = self.store.list(T::COLLECTION, &query).await?;
            if page.documents.iter().any(|doc| doc.id != entity.id()) {
                return Err(DomainError::Conflict(format!(
                    "{} with {} '{}' already exists",
                    T::NAME,
                    field,
                    value
                ))
                .into());
            }
        }
        Ok(())
    }
}

fn from_fields<T: Entity>(fields: Map<String, Value>) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::BadRequest(format!("Invalid {}: {}", T::NAME, e)))
}

/// Decode a stored document; the row id is authoritative
pub fn decode<T: Entity>(doc: Document) -> Result<T, AppError> {
    let mut data = doc.data;
    if let Some(fields) = data.as_object_mut() {
        fields.insert("id".to_string(), Value::String(doc.id.clone()));
        fields
            .entry("createdAt")
            .or_insert_with(|| Value::String(doc.created_at.to_rfc3339()));
        fields
            .entry("updatedAt")
            .or_insert_with(|| Value::String(doc.updated_at.to_rfc3339()));
    }
    serde_json::from_value(data).map_err(|e| {
        AppError::Domain(DomainError::Internal(format!(
            "corrupt {} document {}: {}",
            T::NAME,
            doc.id,
            e
        )))
    })
}

pub fn encode<T: Entity>(entity: &T) -> Result<Value, AppError> {
    serde_json::to_value(entity).map_err(|e| AppError::Internal(e.to_string()))
}
