//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//! Documents go through the real in-memory document store; only the courier
//! and object storage are doubled here.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
