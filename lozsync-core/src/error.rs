//! Error types for lozsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while assembling the run configuration.
///
/// Every variant is fatal: configuration is validated in full before the
/// pipeline issues a single external call.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },

    /// A required settings-file field is absent or empty.
    #[error("missing required field \"{name}\" in {path}")]
    MissingField { name: &'static str, path: PathBuf },

    /// The settings file did not exist at the expected path.
    #[error("settings file not found at {path}")]
    NotFound { path: PathBuf },

    /// Settings JSON parse error on load — includes file path context.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Underlying I/O failure, with annotated path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
