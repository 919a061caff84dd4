//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod courier;
pub mod documents;
pub mod storage;

pub use courier::{BulkParcelResult, Consignment, CourierClient, ParcelRequest};
pub use documents::{merge_objects, Document, DocumentPage, DocumentStore, ListQuery};
pub use storage::{validate_object_path, ObjectStorage, StoredObject};
