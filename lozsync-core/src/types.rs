//! Domain types for the lozsync pipeline.
//!
//! Page identifiers and tab names are newtypes; never bare `String`s in
//! signatures. All types are serializable/deserializable via serde.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed Confluence page identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub String);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed spreadsheet tab name (already sanitized for the
/// destination's naming restrictions).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabName(pub String);

impl fmt::Display for TabName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TabName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TabName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One status-badge occurrence found on a page.
///
/// `text` is case-normalized by the parser; `color` is lower-cased and
/// trimmed, `"default"` when the macro carried no colour parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lozenge {
    pub text: String,
    pub color: String,
}

/// Aggregated count of lozenges grouped by `(text, color)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LozengeCount {
    pub text: String,
    pub color: String,
    pub count: u32,
}

/// Parse results for a single page.
///
/// `total_count` is the number of raw lozenge occurrences, not the
/// number of aggregated rows. Immutable once produced; consumed by the
/// reconciler and discarded at end of run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLozengeResult {
    pub page_id: PageId,
    pub page_title: String,
    pub lozenges: Vec<LozengeCount>,
    pub total_count: u32,
}

/// A fetched page: identifier, title, and raw storage-format body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub page_id: PageId,
    pub title: String,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
