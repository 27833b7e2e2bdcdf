//! Error types for lozsync-sheets.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from destination-spreadsheet operations.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// No OAuth credential is loaded. Every reconciler operation checks
    /// this before issuing a call.
    #[error("not authenticated with Google Sheets — run `lozsync auth` first")]
    NotAuthenticated,

    /// Non-OK HTTP status from the Sheets API, annotated with the
    /// operation and target.
    #[error("{operation} failed with HTTP {status}: {body}")]
    Http {
        operation: String,
        status: reqwest::StatusCode,
        body: String,
    },

    /// Transport-level failure, or a response body that did not match
    /// the expected shape.
    #[error("Sheets request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// OAuth token endpoint rejected an exchange or refresh.
    #[error("token exchange failed: {reason}")]
    Token { reason: String },

    /// Token store I/O, with annotated path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Token store JSON error.
    #[error("token store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SheetsError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SheetsError {
    SheetsError::Io {
        path: path.into(),
        source,
    }
}
