//! Lozsync core library — domain types, configuration, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes and domain structs shared by the pipeline
//! - [`error`] — [`ConfigError`]
//! - [`config`] — environment + settings-file loading

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ConfluenceConfig, SheetsConfig};
pub use error::ConfigError;
pub use types::{Lozenge, LozengeCount, PageContent, PageId, PageLozengeResult, TabName};
