//! SeaORM entity definitions

pub mod documents;
