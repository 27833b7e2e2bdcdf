//! # lozsync-confluence
//!
//! Async client for the Confluence Cloud REST API: page fetch by id
//! (storage format), concurrent multi-page fetch, and CQL title search
//! with pagination and archived-page filtering.

pub mod client;
pub mod error;
pub mod types;

pub use client::ConfluenceClient;
pub use error::ConfluenceError;
