//! PostgreSQL adapter for DocumentStore
//!
//! Documents are rows of a single `documents` table keyed by
//! `(collection, id)` with the body in a JSONB column. Filters compile to
//! `data #>> path = value` predicates.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, EntityTrait, Set, Statement,
    Value as SqlValue,
};
use serde_json::Value;

use crate::domain::filter::Filter;
use crate::domain::ports::{Document, DocumentPage, DocumentStore, ListQuery};
use crate::entity::documents;
use crate::error::DomainError;

const SCHEMA: [&str; 2] = [
    r#"CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        data JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (collection, id)
    )"#,
    "CREATE INDEX IF NOT EXISTS documents_collection_created_at_idx \
     ON documents (collection, created_at DESC)",
];

/// PostgreSQL implementation of DocumentStore
pub struct PostgresDocumentStore {
    db: DatabaseConnection,
}

impl PostgresDocumentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create the documents table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        for sql in SCHEMA {
            self.db
                .execute_unprepared(sql)
                .await
                .map_err(|e| DomainError::Database(e.to_string()))?;
        }
        Ok(())
    }

    async fn find(&self, collection: &str, id: &str) -> Result<Option<Document>, DomainError> {
        let result = documents::Entity::find_by_id((collection.to_string(), id.to_string()))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn find_existing(&self, collection: &str, id: &str) -> Result<Document, DomainError> {
        self.find(collection, id).await?.ok_or_else(|| {
            DomainError::NotFound(format!("{}/{} not found", collection, id))
        })
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

/// Compile a filter to a SQL predicate, appending bind values to `values`
fn filter_sql(filter: &Filter, values: &mut Vec<SqlValue>) -> String {
    match filter {
        Filter::Eq { field, value } => {
            values.push(field.clone().into());
            let path = values.len();
            values.push(value.clone().into());
            let value = values.len();
            format!(
                "(jsonb_typeof(data #> string_to_array(${path}, '.')) IN ('string', 'number', 'boolean') \
                 AND data #>> string_to_array(${path}, '.') = ${value})"
            )
        }
        Filter::And(filters) => join_sql(filters, " AND ", "TRUE", values),
        Filter::Or(filters) => join_sql(filters, " OR ", "FALSE", values),
    }
}

fn join_sql(filters: &[Filter], separator: &str, empty: &str, values: &mut Vec<SqlValue>) -> String {
    if filters.is_empty() {
        return empty.to_string();
    }
    let parts: Vec<String> = filters.iter().map(|f| filter_sql(f, values)).collect();
    format!("({})", parts.join(separator))
}

/// `WHERE` clause for a listing plus its bind values
fn where_clause(collection: &str, filter: Option<&Filter>) -> (String, Vec<SqlValue>) {
    let mut values: Vec<SqlValue> = vec![collection.to_string().into()];
    let mut sql = "WHERE collection = $1".to_string();
    if let Some(filter) = filter {
        let predicate = filter_sql(filter, &mut values);
        sql.push_str(" AND ");
        sql.push_str(&predicate);
    }
    (sql, values)
}

fn clamp_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DomainError> {
        self.find(collection, id).await
    }

    async fn list(
        &self,
        collection: &str,
        query: &ListQuery,
    ) -> Result<DocumentPage, DomainError> {
        let (where_sql, values) = where_clause(collection, query.filter.as_ref());

        let count_stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            format!("SELECT COUNT(*) AS total FROM documents {}", where_sql),
            values.clone(),
        );
        let total: i64 = match self
            .db
            .query_one(count_stmt)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
        {
            Some(row) => row
                .try_get("", "total")
                .map_err(|e| DomainError::Database(e.to_string()))?,
            None => 0,
        };

        let mut values = values;
        values.push(clamp_i64(query.limit).into());
        let limit = values.len();
        values.push(clamp_i64(query.offset).into());
        let offset = values.len();
        let select_stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            format!(
                "SELECT collection, id, data, created_at, updated_at FROM documents {} \
                 ORDER BY created_at DESC, id ASC LIMIT ${} OFFSET ${}",
                where_sql, limit, offset
            ),
            values,
        );
        let rows = documents::Entity::find()
            .from_raw_sql(select_stmt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(DocumentPage {
            documents: rows.into_iter().map(|m| m.into()).collect(),
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn insert(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> Result<Document, DomainError> {
        require_object(&data)?;
        let now = Utc::now().fixed_offset();

        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "INSERT INTO documents (collection, id, data, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) ON CONFLICT (collection, id) DO NOTHING",
            [
                collection.to_string().into(),
                id.to_string().into(),
                data.clone().into(),
                now.into(),
            ],
        );
        let result = self
            .db
            .execute(stmt)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AlreadyExists(format!(
                "{}/{} already exists",
                collection, id
            )));
        }

        Ok(Document {
            id: id.to_string(),
            data,
            created_at: now.with_timezone(&Utc),
            updated_at: now.with_timezone(&Utc),
        })
    }

    async fn put(&self, collection: &str, id: &str, data: Value) -> Result<Document, DomainError> {
        require_object(&data)?;
        let now = Utc::now().fixed_offset();

        let model = documents::ActiveModel {
            collection: Set(collection.to_string()),
            id: Set(id.to_string()),
            data: Set(data),
            created_at: Set(now),
            updated_at: Set(now),
        };
        documents::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([documents::Column::Collection, documents::Column::Id])
                    .update_columns([documents::Column::Data, documents::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        self.find_existing(collection, id).await
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
    ) -> Result<Document, DomainError> {
        if !patch.is_object() {
            return Err(DomainError::Validation(
                "document patches must be JSON objects".to_string(),
            ));
        }

        // jsonb `||` replaces top-level keys, matching merge_objects
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "UPDATE documents SET data = data || $1, updated_at = $2 \
             WHERE collection = $3 AND id = $4",
            [
                patch.into(),
                Utc::now().fixed_offset().into(),
                collection.to_string().into(),
                id.to_string().into(),
            ],
        );
        let result = self
            .db
            .execute(stmt)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!(
                "{}/{} not found",
                collection, id
            )));
        }

        self.find_existing(collection, id).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), DomainError> {
        let result =
            documents::Entity::delete_by_id((collection.to_string(), id.to_string()))
                .exec(&self.db)
                .await
                .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!(
                "{}/{} not found",
                collection, id
            )));
        }
        Ok(())
    }
}

/// Convert SeaORM model to a domain document
impl From<documents::Model> for Document {
    fn from(model: documents::Model) -> Self {
        Document {
            id: model.id,
            data: model.data,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::parse_filter;

    #[test]
    fn where_clause_without_filter_only_scopes_collection() {
        let (sql, values) = where_clause("products", None);
        assert_eq!(sql, "WHERE collection = $1");
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn where_clause_numbers_placeholders_in_order() {
        let filter = parse_filter("(category=shoes&status=active)||featured=true").unwrap();
        let (sql, values) = where_clause("products", Some(&filter));

        assert_eq!(values.len(), 7);
        assert!(sql.starts_with("WHERE collection = $1 AND (("));
        assert!(sql.contains("string_to_array($2, '.')) IN"));
        assert!(sql.contains("= $3)"));
        assert!(sql.contains("string_to_array($6, '.') = $7"));
        assert!(sql.contains(" OR "));
        assert!(sql.contains(" AND "));
        assert_eq!(values[1], SqlValue::from("category".to_string()));
        assert_eq!(values[2], SqlValue::from("shoes".to_string()));
    }

    #[test]
    fn empty_groups_compile_to_constants() {
        let mut values = Vec::new();
        assert_eq!(filter_sql(&Filter::And(vec![]), &mut values), "TRUE");
        assert_eq!(filter_sql(&Filter::Or(vec![]), &mut values), "FALSE");
        assert!(values.is_empty());
    }
}
