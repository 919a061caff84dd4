//! Steadfast courier adapter

pub mod client;

pub use client::SteadfastClient;
