//! In-memory adapters
//!
//! Used for local development without a database and by tests.

pub mod document_store;

pub use document_store::InMemoryDocumentStore;
