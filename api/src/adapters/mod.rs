//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod memory;
pub mod postgres;
pub mod steadfast;
pub mod storage;

pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use steadfast::SteadfastClient;
pub use storage::LocalObjectStorage;
