//! Domain layer
//!
//! Contains pure business logic with no external dependencies.
//! - `entities`: Typed documents representing core business concepts
//! - `filter`: The `where=` query-string filter grammar
//! - `ports`: Trait definitions for external dependencies

pub mod entities;
pub mod filter;
pub mod ports;
