//! Error types for lozsync-confluence.

use thiserror::Error;

/// All errors that can arise from Confluence API calls.
///
/// There is no retry anywhere in the pipeline: a failed call aborts the
/// run and the operator re-runs.
#[derive(Debug, Error)]
pub enum ConfluenceError {
    /// Transport-level failure, or a response body that did not match
    /// the expected shape.
    #[error("Confluence request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-OK HTTP status, annotated with the operation and target.
    #[error("{operation} failed with HTTP {status}: {body}")]
    Http {
        operation: String,
        status: reqwest::StatusCode,
        body: String,
    },
}
