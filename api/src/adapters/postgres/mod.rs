//! PostgreSQL adapters
//!
//! Implementation of the document store using SeaORM and a JSONB table.

pub mod document_store;


pub use document_store::PostgresDocumentStore;
